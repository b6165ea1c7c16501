//! services/api/src/web/error.rs
//!
//! The HTTP error type and the response envelope middleware.
//!
//! Every error response leaving the service has the same JSON body:
//! `{status, timestamp, path, message}`. Handlers return `HttpError`; the
//! envelope middleware at the router root fills in the path and timestamp.

use askbot_core::ports::PortError;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;

/// An HTTP-level error: a status code plus a user-visible message.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn unauthorized_with(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// The distinguished expiry condition: still 401, but with a marker
    /// message so the caller can attempt a silent refresh instead of forcing
    /// re-authentication.
    pub fn token_expired() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "token-expired")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => Self::not_found(msg),
            PortError::Conflict(msg) => Self::conflict(msg),
            PortError::Unauthorized => Self::unauthorized(),
            PortError::Unexpected(msg) => {
                tracing::error!("port error: {msg}");
                Self::internal("An unexpected internal error occurred")
            }
        }
    }
}

/// Response extension carrying the error message to the envelope middleware.
#[derive(Debug, Clone)]
struct ErrorMessage(String);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(ErrorMessage(self.message));
        response
    }
}

/// The serialized error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub timestamp: String,
    pub path: String,
    pub message: String,
}

/// Rewrites every error response into the `{status, timestamp, path, message}`
/// envelope. Also catches plain-text rejections from extractors so they leave
/// the service in the same shape.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let message = match parts.extensions.remove::<ErrorMessage>() {
        Some(ErrorMessage(message)) => message,
        None => match axum::body::to_bytes(body, 64 * 1024).await {
            Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).into_owned(),
            _ => status.canonical_reason().unwrap_or("Error").to_string(),
        },
    };

    let body = ErrorBody {
        status: status.as_u16(),
        timestamp: Utc::now().to_rfc3339(),
        path,
        message,
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_statuses() {
        let err: HttpError = PortError::NotFound("Persona not found".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: HttpError = PortError::Conflict("duplicate".to_string()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: HttpError = PortError::Unauthorized.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        // Internal details never leak into the message.
        let err: HttpError = PortError::Unexpected("pool timed out".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("pool"));
    }

    #[test]
    fn token_expired_is_distinguishable() {
        let err = HttpError::token_expired();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "token-expired");
        assert_ne!(err.message, HttpError::unauthorized().message);
    }
}
