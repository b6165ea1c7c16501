//! services/api/src/web/bot.rs
//!
//! Bot persona and profile endpoints, and the credential lifecycle:
//! profile save issues a long-lived refresh credential, and the widget
//! exchanges it here for short-lived, configuration-bearing access tokens.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use askbot_core::credentials::{BotClaims, CredentialError, RefreshClaims, UserClaims};
use askbot_core::domain::{
    BotProfile, BotProfileChanges, NewBotProfile, NewPersona, Persona, ResponseLength,
};
use askbot_core::ports::PortError;

use crate::web::error::HttpError;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddPersonaRequest {
    pub name: String,
    pub description: Option<String>,
    pub gender: Option<String>,
    pub system_prompt: Option<String>,
    pub default_tone: Option<String>,
    pub default_domain: Option<String>,
    pub default_greeting: Option<String>,
    pub default_fallback: Option<String>,
    pub avatar_url: Option<String>,
    pub language: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveProfileRequest {
    pub persona_id: Uuid,
    pub name: Option<String>,
    pub custom_greeting: Option<String>,
    pub custom_fallback: Option<String>,
    pub tone: Option<String>,
    pub primary_language: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub allowed_topics: Vec<String>,
    #[serde(default)]
    pub blocked_topics: Vec<String>,
    pub response_length: Option<ResponseLength>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditProfileRequest {
    pub profile_id: Uuid,
    pub name: Option<String>,
    pub custom_greeting: Option<String>,
    pub custom_fallback: Option<String>,
    pub tone: Option<String>,
    pub primary_language: Option<String>,
    pub avatar_url: Option<String>,
    pub allowed_topics: Option<Vec<String>>,
    pub blocked_topics: Option<Vec<String>>,
    pub response_length: Option<ResponseLength>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileResponse {
    pub bot_profile: BotProfile,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub refresh_token: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefreshAccessTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

//=========================================================================================
// Persona Catalog
//=========================================================================================

/// POST /bot/add-persona - Add a persona to the catalog
#[utoipa::path(
    post,
    path = "/bot/add-persona",
    request_body = AddPersonaRequest,
    responses(
        (status = 201, description = "Persona created"),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn add_persona_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddPersonaRequest>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(gender) = req.gender.as_deref() {
        if !matches!(gender, "male" | "female" | "neutral") {
            return Err(HttpError::bad_request(
                "gender must be one of male, female, neutral",
            ));
        }
    }

    let persona = state
        .db
        .create_persona(NewPersona {
            name: req.name,
            description: req.description,
            gender: req.gender,
            system_prompt: req.system_prompt,
            default_tone: req.default_tone,
            default_domain: req.default_domain,
            default_greeting: req.default_greeting,
            default_fallback: req.default_fallback,
            avatar_url: req.avatar_url,
            language: req.language.unwrap_or_else(|| "en".to_string()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(persona)))
}

/// GET /bot/available-personas - List the persona catalog
pub async fn available_personas_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Persona>>, HttpError> {
    Ok(Json(state.db.list_personas().await?))
}

//=========================================================================================
// Bot Profile Store
//=========================================================================================

/// POST /bot/save - Create a bot profile and issue its embed refresh credential
pub async fn save_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
    Json(req): Json<SaveProfileRequest>,
) -> Result<(StatusCode, Json<SaveProfileResponse>), HttpError> {
    // Make sure the persona exists before instantiating it.
    state
        .db
        .get_persona_by_id(req.persona_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HttpError::not_found("Persona not found"),
            other => other.into(),
        })?;

    let profile = state
        .db
        .create_bot_profile(NewBotProfile {
            user_id: user.user_id,
            persona_id: req.persona_id,
            name: req.name,
            custom_greeting: req.custom_greeting,
            custom_fallback: req.custom_fallback,
            tone: req.tone,
            primary_language: req.primary_language,
            avatar_url: req.avatar_url,
            allowed_topics: req.allowed_topics,
            blocked_topics: req.blocked_topics,
            response_length: req.response_length,
        })
        .await?;

    // The refresh credential is bound to the owner at issuance. The profile
    // was just created for this user, so no ownership re-check is needed.
    let refresh_token = state
        .credentials
        .issue_refresh(user.user_id, profile.id)
        .map_err(signing_failure)?;

    Ok((
        StatusCode::CREATED,
        Json(SaveProfileResponse {
            bot_profile: profile,
            refresh_token,
        }),
    ))
}

/// PATCH /bot/edit-assistant - Update an owned bot profile
pub async fn edit_assistant_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
    Json(req): Json<EditProfileRequest>,
) -> Result<Json<BotProfile>, HttpError> {
    let profile = state.db.get_bot_profile_by_id(req.profile_id).await?;
    if profile.user_id != user.user_id {
        return Err(HttpError::unauthorized_with(
            "This profile does not belong to the user",
        ));
    }

    let updated = state
        .db
        .update_bot_profile(
            req.profile_id,
            BotProfileChanges {
                name: req.name,
                custom_greeting: req.custom_greeting,
                custom_fallback: req.custom_fallback,
                tone: req.tone,
                primary_language: req.primary_language,
                avatar_url: req.avatar_url,
                allowed_topics: req.allowed_topics,
                blocked_topics: req.blocked_topics,
                response_length: req.response_length,
            },
        )
        .await?;

    Ok(Json(updated))
}

/// GET /bot/user-bots - List the caller's bot profiles
pub async fn user_bots_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
) -> Result<Json<Vec<BotProfile>>, HttpError> {
    Ok(Json(
        state.db.list_bot_profiles_by_owner(user.user_id).await?,
    ))
}

/// GET /bot/user-bot/{bot_id} - Fetch one bot profile by id
pub async fn user_bot_handler(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<Uuid>,
) -> Result<Json<BotProfile>, HttpError> {
    Ok(Json(state.db.get_bot_profile_by_id(bot_id).await?))
}

//=========================================================================================
// Credential Issuer
//=========================================================================================

/// GET /bot/refresh-token/{profile_id} - Regenerate the embed refresh credential
///
/// The explicit regenerate path verifies both existence and ownership before
/// signing; here opacity is not required because the caller already holds a
/// user session.
pub async fn refresh_token_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<RefreshTokenResponse>, HttpError> {
    let profile = state
        .db
        .get_bot_profile_by_id(profile_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HttpError::not_found("Bot profile not found"),
            other => other.into(),
        })?;

    if profile.user_id != user.user_id {
        return Err(HttpError::unauthorized_with(
            "This profile does not belong to the user",
        ));
    }

    let refresh_token = state
        .credentials
        .issue_refresh(user.user_id, profile.id)
        .map_err(signing_failure)?;

    Ok(Json(RefreshTokenResponse { refresh_token }))
}

//=========================================================================================
// Session Minter
//=========================================================================================

/// POST /bot/refresh-access-token - Exchange a refresh credential for an
/// access credential carrying the configuration snapshot.
///
/// Every failure below is an opaque 401: a missing profile must look the same
/// as a bad signature so the endpoint leaks nothing about what exists.
#[utoipa::path(
    post,
    path = "/bot/refresh-access-token",
    request_body = RefreshAccessTokenRequest,
    responses(
        (status = 200, description = "Access token minted", body = AccessTokenResponse),
        (status = 401, description = "Refresh credential rejected")
    )
)]
pub async fn refresh_access_token_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshAccessTokenRequest>,
) -> Result<Json<AccessTokenResponse>, HttpError> {
    let claims: RefreshClaims =
        state
            .credentials
            .verify(&req.refresh_token)
            .map_err(|e| match e {
                CredentialError::ExpiredToken => {
                    HttpError::unauthorized_with("Refresh token expired")
                }
                CredentialError::InvalidToken => {
                    HttpError::unauthorized_with("Invalid refresh token")
                }
                CredentialError::MalformedPayload => {
                    HttpError::unauthorized_with("Invalid refresh token payload")
                }
            })?;

    let (profile_id, user_id) = match (claims.profile_id, claims.user_id) {
        (Some(profile_id), Some(user_id)) => (profile_id, user_id),
        _ => {
            return Err(HttpError::unauthorized_with(
                "Invalid refresh token payload",
            ))
        }
    };

    let profile = state
        .db
        .get_bot_profile_by_id(profile_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HttpError::unauthorized_with("Bot configuration not found"),
            other => other.into(),
        })?;

    // The binding is checked against the current owner at mint time.
    if profile.user_id != user_id {
        return Err(HttpError::unauthorized_with(
            "Bot configuration does not belong to user",
        ));
    }

    let (access_token, expires_in) = state
        .credentials
        .mint_access(&profile)
        .map_err(signing_failure)?;

    Ok(Json(AccessTokenResponse {
        access_token,
        expires_in,
    }))
}

//=========================================================================================
// Bot Session
//=========================================================================================

/// GET /bot/auth - Validate a bot access credential
///
/// Guarded by the bot session guard; returns the decoded payload so the
/// widget can bootstrap its configuration.
pub async fn bot_auth_handler(
    Extension(bot): Extension<BotClaims>,
) -> Result<Json<BotClaims>, HttpError> {
    Ok(Json(bot))
}

fn signing_failure(err: CredentialError) -> HttpError {
    tracing::error!("failed to sign credential: {err}");
    HttpError::internal("Failed to sign credential")
}
