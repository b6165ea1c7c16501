//! services/api/src/web/domains.rs
//!
//! Registered embed domains. These origins feed the dynamic CORS allow-list.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use askbot_core::credentials::UserClaims;
use askbot_core::domain::AllowedDomain;

use crate::web::error::HttpError;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddDomainRequest {
    pub origin: String,
    pub description: Option<String>,
}

/// POST /profile/domains - Register an origin for embedding
pub async fn add_domain_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
    Json(req): Json<AddDomainRequest>,
) -> Result<(StatusCode, Json<AllowedDomain>), HttpError> {
    let domain = state
        .db
        .add_allowed_domain(user.user_id, &req.origin, req.description.as_deref())
        .await?;

    // The CORS predicate reads the same set, so new origins take effect
    // without a restart.
    match state.allowed_origins.write() {
        Ok(mut origins) => {
            origins.insert(domain.origin.clone());
        }
        Err(err) => tracing::error!("allowed-origin set lock poisoned: {err}"),
    }

    Ok((StatusCode::CREATED, Json(domain)))
}

/// GET /profile/domains - List the caller's registered origins
pub async fn my_domains_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
) -> Result<Json<Vec<AllowedDomain>>, HttpError> {
    Ok(Json(state.db.list_user_domains(user.user_id).await?))
}
