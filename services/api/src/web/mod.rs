pub mod auth;
pub mod bot;
pub mod domains;
pub mod error;
pub mod guards;
pub mod rest;
pub mod routes;
pub mod state;
pub mod subscription;
pub mod user;

// Re-export the middleware entry points so the binary can wire the router
// without reaching into submodules.
pub use error::error_envelope;
pub use guards::{require_bot, require_user};
pub use routes::{is_public_route, PUBLIC_ROUTES};
