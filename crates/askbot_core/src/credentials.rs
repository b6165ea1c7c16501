//! crates/askbot_core/src/credentials.rs
//!
//! The credential signing and verification core for the bot embed lifecycle.
//!
//! Two token kinds flow through one HMAC-SHA256 primitive: a long-lived
//! refresh credential binding `{profileId, userId}`, and a short-lived access
//! credential carrying the resolved bot configuration so the widget never
//! needs a second round trip for config. Tokens are JWT-shaped
//! (`header.payload.signature`, base64url without padding) and stateless:
//! nothing is persisted at issue or mint time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::{AccountStatus, BotProfile, ResponseLength};

type HmacSha256 = Hmac<Sha256>;

/// Fixed lifetime of a bot access credential, in seconds.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 1800;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Verification failure taxonomy. `ExpiredToken` is surfaced distinctly so a
/// caller can attempt a refresh exchange instead of forcing re-authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("malformed token payload")]
    MalformedPayload,
}

/// Claims of the refresh credential.
///
/// Both ids are optional at the type level: a token that decodes but lacks
/// either id is rejected by the minter as `MalformedPayload`, not by serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Claims of the bot access credential: the point-in-time configuration
/// snapshot plus identity. Fields absent on the profile stay absent here;
/// persona defaults are not substituted at mint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotClaims {
    pub user_id: Uuid,
    pub persona_id: Uuid,
    pub profile_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_length: Option<ResponseLength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_language: Option<String>,
    #[serde(default)]
    pub allowed_topics: Vec<String>,
    #[serde(default)]
    pub blocked_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_sources: Option<serde_json::Value>,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of the dashboard user session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub account_status: AccountStatus,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies all credentials from a single shared secret.
///
/// Constructed once at startup and injected through `AppState`; there is no
/// global accessor. The refresh TTL is a policy decision: `None` issues
/// non-expiring refresh credentials (the default for embed tokens that live
/// on customer sites).
#[derive(Clone)]
pub struct CredentialService {
    secret: String,
    refresh_ttl: Option<Duration>,
}

impl CredentialService {
    pub fn new(secret: impl Into<String>, refresh_ttl: Option<Duration>) -> Self {
        Self {
            secret: secret.into(),
            refresh_ttl,
        }
    }

    /// Issues a refresh credential bound to `{profile_id, user_id}`.
    ///
    /// Stateless: the binding is fixed at issuance and is not re-validated if
    /// the profile is later reassigned. Ownership checks belong to the caller.
    pub fn issue_refresh(
        &self,
        user_id: Uuid,
        profile_id: Uuid,
    ) -> Result<String, CredentialError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            profile_id: Some(profile_id),
            user_id: Some(user_id),
            iat: now.timestamp(),
            exp: self.refresh_ttl.map(|ttl| (now + ttl).timestamp()),
        };
        self.sign(&claims)
    }

    /// Mints an access credential embedding the profile's configuration
    /// snapshot. Returns the token and its lifetime in seconds.
    pub fn mint_access(&self, profile: &BotProfile) -> Result<(String, i64), CredentialError> {
        let now = Utc::now().timestamp();
        let claims = BotClaims {
            user_id: profile.user_id,
            persona_id: profile.persona_id,
            profile_id: profile.id,
            name: profile.name.clone(),
            avatar_url: profile.avatar_url.clone(),
            custom_greeting: profile.custom_greeting.clone(),
            custom_fallback: profile.custom_fallback.clone(),
            tone: profile.tone.clone(),
            response_length: profile.response_length,
            primary_language: profile.primary_language.clone(),
            allowed_topics: profile.allowed_topics.clone(),
            blocked_topics: profile.blocked_topics.clone(),
            knowledge_sources: None,
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECONDS,
        };
        Ok((self.sign(&claims)?, ACCESS_TOKEN_TTL_SECONDS))
    }

    /// Signs arbitrary claims. Also used for the dashboard user session token.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, CredentialError> {
        let header_segment = URL_SAFE_NO_PAD.encode(JWT_HEADER.as_bytes());
        let payload_bytes =
            serde_json::to_vec(claims).map_err(|_| CredentialError::MalformedPayload)?;
        let payload_segment = URL_SAFE_NO_PAD.encode(payload_bytes);
        let signing_input = format!("{header_segment}.{payload_segment}");

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| CredentialError::InvalidToken)?;
        mac.update(signing_input.as_bytes());
        let signature_segment = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_segment}"))
    }

    /// The shared verification primitive: signature first, then expiry, then
    /// the typed payload shape.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, CredentialError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at<T: DeserializeOwned>(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<T, CredentialError> {
        let mut parts = token.split('.');
        let (header, payload, signature) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(CredentialError::InvalidToken),
            };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CredentialError::InvalidToken)?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| CredentialError::InvalidToken)?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CredentialError::InvalidToken)?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CredentialError::InvalidToken)?;
        let value: serde_json::Value =
            serde_json::from_slice(&payload_bytes).map_err(|_| CredentialError::InvalidToken)?;

        // An expiry claim is optional; when present it is enforced.
        if let Some(exp) = value.get("exp").and_then(|v| v.as_i64()) {
            if exp <= now.timestamp() {
                return Err(CredentialError::ExpiredToken);
            }
        }

        serde_json::from_value(value).map_err(|_| CredentialError::MalformedPayload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CredentialService {
        CredentialService::new("test-secret", None)
    }

    fn profile(tone: Option<&str>) -> BotProfile {
        let now = Utc::now();
        BotProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            persona_id: Uuid::new_v4(),
            name: None,
            custom_greeting: None,
            custom_fallback: None,
            tone: tone.map(str::to_string),
            primary_language: None,
            avatar_url: None,
            allowed_topics: vec![],
            blocked_topics: vec![],
            response_length: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn refresh_round_trips_and_has_no_expiry_by_default() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let profile_id = Uuid::new_v4();

        let token = svc.issue_refresh(user_id, profile_id).unwrap();
        let claims: RefreshClaims = svc.verify(&token).unwrap();

        assert_eq!(claims.user_id, Some(user_id));
        assert_eq!(claims.profile_id, Some(profile_id));
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn refresh_ttl_policy_sets_expiry() {
        let svc = CredentialService::new("test-secret", Some(Duration::days(7)));
        let token = svc.issue_refresh(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let claims: RefreshClaims = svc.verify(&token).unwrap();
        assert!(claims.exp.is_some());
    }

    #[test]
    fn minted_access_carries_profile_fields_without_persona_fallback() {
        let svc = service();
        let profile = profile(Some("casual"));

        let (token, expires_in) = svc.mint_access(&profile).unwrap();
        assert_eq!(expires_in, ACCESS_TOKEN_TTL_SECONDS);

        let claims: BotClaims = svc.verify(&token).unwrap();
        assert_eq!(claims.user_id, profile.user_id);
        assert_eq!(claims.persona_id, profile.persona_id);
        assert_eq!(claims.profile_id, profile.id);
        assert_eq!(claims.tone.as_deref(), Some("casual"));
        // Fields the profile never set stay absent in the snapshot.
        assert_eq!(claims.name, None);
        assert_eq!(claims.custom_greeting, None);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECONDS);
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let svc = service();
        let token = svc.issue_refresh(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        let last = token.chars().last().unwrap();
        let flipped = if last == 'A' { 'B' } else { 'A' };
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(flipped);

        let result = svc.verify::<RefreshClaims>(&tampered);
        assert_eq!(result.unwrap_err(), CredentialError::InvalidToken);
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let svc = service();
        let token = svc.issue_refresh(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"userId":"forged"}"#);
        parts[1] = &forged;
        let tampered = parts.join(".");

        let result = svc.verify::<RefreshClaims>(&tampered);
        assert_eq!(result.unwrap_err(), CredentialError::InvalidToken);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let svc = service();
        let token = svc.issue_refresh(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        let other = CredentialService::new("other-secret", None);
        let result = other.verify::<RefreshClaims>(&token);
        assert_eq!(result.unwrap_err(), CredentialError::InvalidToken);
    }

    #[test]
    fn garbage_token_is_invalid() {
        let svc = service();
        assert_eq!(
            svc.verify::<RefreshClaims>("not-a-token").unwrap_err(),
            CredentialError::InvalidToken
        );
        assert_eq!(
            svc.verify::<RefreshClaims>("a.b.c.d").unwrap_err(),
            CredentialError::InvalidToken
        );
    }

    #[test]
    fn access_expiry_boundary() {
        let svc = service();
        let profile = profile(None);
        let (token, _) = svc.mint_access(&profile).unwrap();
        let minted_at = Utc::now();

        let just_before = minted_at + Duration::seconds(ACCESS_TOKEN_TTL_SECONDS - 2);
        assert!(svc.verify_at::<BotClaims>(&token, just_before).is_ok());

        let just_after = minted_at + Duration::seconds(ACCESS_TOKEN_TTL_SECONDS + 1);
        assert_eq!(
            svc.verify_at::<BotClaims>(&token, just_after).unwrap_err(),
            CredentialError::ExpiredToken
        );
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        // A refresh credential decodes, but lacks the access claims.
        let svc = service();
        let token = svc.issue_refresh(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let result = svc.verify::<BotClaims>(&token);
        assert_eq!(result.unwrap_err(), CredentialError::MalformedPayload);
    }
}
