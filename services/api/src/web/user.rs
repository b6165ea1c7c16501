//! services/api/src/web/user.rs
//!
//! Account endpoints for the dashboard: fetch and update the caller's own
//! user record. Both operate on the identity from the session token, so
//! there is no cross-account access to check.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use askbot_core::credentials::UserClaims;
use askbot_core::domain::{User, UserProfileChanges};
use askbot_core::ports::PortError;

use crate::web::error::HttpError;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub bio: Option<String>,
    #[serde(default)]
    pub social_links: Vec<String>,
}

/// GET /user/user-details - Fetch the caller's account
pub async fn user_details_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
) -> Result<Json<User>, HttpError> {
    let user = state
        .db
        .get_user_by_id(user.user_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HttpError::not_found("User Not Found"),
            other => other.into(),
        })?;
    Ok(Json(user))
}

/// PUT /user/profile - Update the caller's account details
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, HttpError> {
    let updated = state
        .db
        .update_user(
            user.user_id,
            UserProfileChanges {
                name: req.name,
                bio: req.bio,
                social_links: req.social_links,
            },
        )
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HttpError::not_found("User Not Found"),
            other => other.into(),
        })?;
    Ok(Json(updated))
}
