//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use askbot_core::credentials::CredentialService;
use askbot_core::ports::DatabaseService;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// The shared application state, created once at startup and passed to all handlers.
///
/// The credential service is an explicitly constructed instance injected here;
/// there is no module-level singleton to reach for.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub credentials: CredentialService,
    /// Origins allowed to embed the widget. Seeded from the database at
    /// startup and extended as domains are registered; the CORS predicate
    /// reads through this same lock.
    pub allowed_origins: Arc<RwLock<HashSet<String>>>,
}
