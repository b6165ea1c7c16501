//! services/api/src/web/routes.rs
//!
//! The public-route allow-list consulted by the user session guard.

/// Routes reachable without a user session token.
///
/// Matching is exact string equality, not prefix matching: `/webhook/paypal`
/// is NOT covered by the `/webhook` entry. The only prefix exception lives in
/// the guard itself, for the OAuth callback.
pub const PUBLIC_ROUTES: &[&str] = &[
    "/health",
    "/auth/login",
    "/auth/google",
    "/auth/google/callback",
    "/bot/auth",
    "/bot/chat",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/reset-password",
    "/webhook",
    "/bot/refresh-access-token",
    // calendar
    "/calendar/event",
    "/calendar/events",
];

pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_routes_are_public() {
        assert!(is_public_route("/health"));
        assert!(is_public_route("/bot/refresh-access-token"));
        assert!(is_public_route("/webhook"));
    }

    #[test]
    fn matching_is_exact_not_prefix() {
        // Sub-paths of a listed route are treated like any other route.
        assert!(!is_public_route("/webhook/paypal"));
        assert!(!is_public_route("/bot/refresh-access-token/"));
        assert!(!is_public_route("/healthz"));
        assert!(!is_public_route("/bot"));
    }
}
