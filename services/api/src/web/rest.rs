//! services/api/src/web/rest.rs
//!
//! The health endpoint and the master definition for the OpenAPI
//! specification.

use axum::{response::Json, http::StatusCode};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::web::bot::{
    AccessTokenResponse, AddPersonaRequest, RefreshAccessTokenRequest, RefreshTokenResponse,
};
use crate::web::domains::AddDomainRequest;
use crate::web::user::UpdateProfileRequest;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::auth::register_handler,
        crate::web::auth::login_handler,
        crate::web::bot::add_persona_handler,
        crate::web::bot::refresh_access_token_handler,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            AddPersonaRequest,
            RefreshAccessTokenRequest,
            AccessTokenResponse,
            RefreshTokenResponse,
            AddDomainRequest,
            UpdateProfileRequest,
        )
    ),
    tags(
        (name = "AskBot API", description = "Bot persona platform: profiles, embed credentials, subscriptions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
