//! crates/askbot_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AllowedDomain, BotProfile, BotProfileChanges, NewBotProfile, NewPersona, Persona, Plan,
    PromptQuota, Subscription, User, UserCredentials, UserProfileChanges,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Persona Catalog ---
    async fn create_persona(&self, persona: NewPersona) -> PortResult<Persona>;

    async fn list_personas(&self) -> PortResult<Vec<Persona>>;

    async fn get_persona_by_id(&self, persona_id: Uuid) -> PortResult<Persona>;

    async fn count_personas(&self) -> PortResult<i64>;

    // --- User Management ---
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UserProfileChanges,
    ) -> PortResult<User>;

    // --- Bot Profile Store ---
    async fn create_bot_profile(&self, profile: NewBotProfile) -> PortResult<BotProfile>;

    async fn update_bot_profile(
        &self,
        profile_id: Uuid,
        changes: BotProfileChanges,
    ) -> PortResult<BotProfile>;

    async fn get_bot_profile_by_id(&self, profile_id: Uuid) -> PortResult<BotProfile>;

    async fn list_bot_profiles_by_owner(&self, user_id: Uuid) -> PortResult<Vec<BotProfile>>;

    // --- Registered Domains (CORS allow-list) ---
    async fn add_allowed_domain(
        &self,
        user_id: Uuid,
        origin: &str,
        description: Option<&str>,
    ) -> PortResult<AllowedDomain>;

    async fn list_user_domains(&self, user_id: Uuid) -> PortResult<Vec<AllowedDomain>>;

    async fn list_all_origins(&self) -> PortResult<Vec<String>>;

    // --- Subscriptions & Quota ---
    async fn get_subscription(&self, user_id: Uuid) -> PortResult<Option<Subscription>>;

    async fn get_prompt_quota(&self, user_id: Uuid) -> PortResult<Option<PromptQuota>>;

    /// Upserts the subscription and the prompt quota together. Implementations
    /// must make this all-or-nothing; it is the only multi-row invariant in
    /// the system.
    async fn update_plan_subscription(
        &self,
        user_id: Uuid,
        plan: Plan,
        period_end: DateTime<Utc>,
    ) -> PortResult<(Subscription, PromptQuota)>;

    async fn reset_prompt_quota(
        &self,
        user_id: Uuid,
        monthly_quota: i64,
        reset_date: DateTime<Utc>,
    ) -> PortResult<PromptQuota>;
}
