//! services/api/src/web/guards.rs
//!
//! Authentication middleware for protecting routes.
//!
//! Two independent guards flow through one verification primitive: the user
//! session guard reads a bearer token from `Authorization`, the bot session
//! guard reads the `X-Bot-Profile` header. Each attaches its decoded claims
//! to the request extensions for handlers to pick up; no request is expected
//! to carry both.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use askbot_core::credentials::{BotClaims, CredentialError, UserClaims};

use crate::web::error::HttpError;
use crate::web::routes::is_public_route;
use crate::web::state::AppState;

/// Header carrying the bot access credential.
pub const BOT_PROFILE_HEADER: &str = "x-bot-profile";

/// Middleware guarding every route against requests without a user session.
///
/// Public routes are matched by exact string equality against the allow-list;
/// the OAuth callback is the single prefix exception because the provider
/// appends query-bearing sub-paths.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let path = req.uri().path();
    if is_public_route(path) || path.starts_with("/auth/google/callback") {
        return Ok(next.run(req).await);
    }

    let token = bearer_token(req.headers())?.to_string();
    let claims: UserClaims = state
        .credentials
        .verify(&token)
        .map_err(verification_error)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware guarding widget-facing routes: validates the `X-Bot-Profile`
/// access credential and attaches the decoded bot payload.
pub async fn require_bot(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let token = bot_profile_token(req.headers())?.to_string();
    let claims: BotClaims = state
        .credentials
        .verify(&token)
        .map_err(verification_error)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, HttpError> {
    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HttpError::bad_request("Authorization header missing"))?;

    authorization
        .strip_prefix("Bearer ")
        .ok_or_else(|| HttpError::bad_request("Incorrect format of the auth token"))
}

/// Extracts the bot access credential from the `X-Bot-Profile` header.
/// A repeated header is rejected rather than silently picking one value.
pub fn bot_profile_token(headers: &HeaderMap) -> Result<&str, HttpError> {
    let mut values = headers.get_all(BOT_PROFILE_HEADER).iter();
    let token = values
        .next()
        .ok_or_else(|| HttpError::bad_request("X-Bot-Profile header missing"))?;
    if values.next().is_some() {
        return Err(HttpError::bad_request(
            "Multiple X-Bot-Profile headers provided",
        ));
    }
    token
        .to_str()
        .map_err(|_| HttpError::bad_request("X-Bot-Profile header is not valid text"))
}

/// Expired tokens get the distinguished marker so clients may silently
/// refresh; every other verification failure is a hard 401.
fn verification_error(err: CredentialError) -> HttpError {
    match err {
        CredentialError::ExpiredToken => HttpError::token_expired(),
        CredentialError::InvalidToken | CredentialError::MalformedPayload => {
            HttpError::unauthorized()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn bearer_token_requires_header_and_scheme() {
        let headers = HeaderMap::new();
        let err = bearer_token(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        let err = bearer_token(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-123"));
        assert_eq!(bearer_token(&headers).unwrap(), "tok-123");
    }

    #[test]
    fn bot_profile_token_rejects_missing_and_repeated_headers() {
        let headers = HeaderMap::new();
        let err = bot_profile_token(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut headers = HeaderMap::new();
        headers.append(BOT_PROFILE_HEADER, HeaderValue::from_static("one"));
        headers.append(BOT_PROFILE_HEADER, HeaderValue::from_static("two"));
        let err = bot_profile_token(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut headers = HeaderMap::new();
        headers.insert(BOT_PROFILE_HEADER, HeaderValue::from_static("tok"));
        assert_eq!(bot_profile_token(&headers).unwrap(), "tok");
    }

    #[test]
    fn expiry_maps_to_the_marker_message() {
        let err = verification_error(CredentialError::ExpiredToken);
        assert_eq!(err.message, "token-expired");

        let err = verification_error(CredentialError::InvalidToken);
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_ne!(err.message, "token-expired");
    }
}
