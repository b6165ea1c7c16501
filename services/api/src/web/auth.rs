//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration and login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use askbot_core::credentials::UserClaims;
use askbot_core::domain::AccountStatus;

use crate::web::error::HttpError;
use crate::web::state::AppState;

/// Lifetime of a dashboard user session token.
const USER_TOKEN_TTL_DAYS: i64 = 10;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[schema(value_type = String)]
    pub account_status: AccountStatus,
    pub access_token: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HttpError> {
    // Check first so a duplicate gets a clean 409 rather than a raw
    // constraint violation.
    let existing = state.db.get_user_by_email(&req.email).await?;
    if existing.is_some() {
        return Err(HttpError::conflict("User with this email already exists"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            HttpError::internal("Failed to hash password")
        })?
        .to_string();

    let user = state
        .db
        .create_user(&req.name, &req.email, &password_hash)
        .await?;

    let access_token = sign_session_token(&state, user.id, &user.name, &user.email, user.account_status)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            account_status: user.account_status,
            access_token,
        }),
    ))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account rejected or suspended")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let user = state
        .db
        .get_user_by_email(&req.email)
        .await?
        .ok_or_else(|| HttpError::unauthorized_with("Invalid email or password"))?;

    match user.account_status {
        AccountStatus::Rejected => {
            return Err(HttpError::forbidden("The account has been Rejected"));
        }
        AccountStatus::Suspended => {
            return Err(HttpError::forbidden("The account has been Suspended"));
        }
        AccountStatus::Reviewing | AccountStatus::Approved => {}
    }

    let parsed_hash = PasswordHash::new(&user.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal("Authentication error")
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(HttpError::unauthorized_with("Invalid email or password"));
    }

    let access_token =
        sign_session_token(&state, user.id, &user.name, &user.email, user.account_status)?;

    Ok(Json(AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        account_status: user.account_status,
        access_token,
    }))
}

fn sign_session_token(
    state: &AppState,
    user_id: Uuid,
    name: &str,
    email: &str,
    account_status: AccountStatus,
) -> Result<String, HttpError> {
    let now = Utc::now();
    let claims = UserClaims {
        user_id,
        name: name.to_string(),
        email: email.to_string(),
        account_status,
        iat: now.timestamp(),
        exp: (now + Duration::days(USER_TOKEN_TTL_DAYS)).timestamp(),
    };
    state.credentials.sign(&claims).map_err(|e| {
        error!("Failed to sign session token: {:?}", e);
        HttpError::internal("Failed to create session")
    })
}
