//! crates/askbot_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database, but carry serde attributes
//! because their camelCase wire shape is part of the embed-widget contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An administrator-defined bot template. Personas are seeded once and are
/// read-only from the widget's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub gender: Option<String>,
    pub system_prompt: Option<String>,
    pub default_tone: Option<String>,
    pub default_domain: Option<String>,
    pub default_greeting: Option<String>,
    pub default_fallback: Option<String>,
    pub avatar_url: Option<String>,
    pub language: String,
}

/// Input for seeding or creating a persona.
#[derive(Debug, Clone)]
pub struct NewPersona {
    pub name: String,
    pub description: Option<String>,
    pub gender: Option<String>,
    pub system_prompt: Option<String>,
    pub default_tone: Option<String>,
    pub default_domain: Option<String>,
    pub default_greeting: Option<String>,
    pub default_fallback: Option<String>,
    pub avatar_url: Option<String>,
    pub language: String,
}

/// How verbose the bot's answers should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseLength {
    Short,
    Medium,
    Detailed,
}

impl ResponseLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseLength::Short => "SHORT",
            ResponseLength::Medium => "MEDIUM",
            ResponseLength::Detailed => "DETAILED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SHORT" => Some(ResponseLength::Short),
            "MEDIUM" => Some(ResponseLength::Medium),
            "DETAILED" => Some(ResponseLength::Detailed),
            _ => None,
        }
    }
}

/// A user's customized instance of a Persona, embeddable on their site.
///
/// Optional fields are overrides; an absent field means the profile never
/// set it. Persona defaults are NOT substituted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub persona_id: Uuid,
    pub name: Option<String>,
    pub custom_greeting: Option<String>,
    pub custom_fallback: Option<String>,
    pub tone: Option<String>,
    pub primary_language: Option<String>,
    pub avatar_url: Option<String>,
    pub allowed_topics: Vec<String>,
    pub blocked_topics: Vec<String>,
    pub response_length: Option<ResponseLength>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a bot profile.
#[derive(Debug, Clone)]
pub struct NewBotProfile {
    pub user_id: Uuid,
    pub persona_id: Uuid,
    pub name: Option<String>,
    pub custom_greeting: Option<String>,
    pub custom_fallback: Option<String>,
    pub tone: Option<String>,
    pub primary_language: Option<String>,
    pub avatar_url: Option<String>,
    pub allowed_topics: Vec<String>,
    pub blocked_topics: Vec<String>,
    pub response_length: Option<ResponseLength>,
}

/// Partial update applied in the edit-assistant flow. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct BotProfileChanges {
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

/// Lifecycle state of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Reviewing,
    Approved,
    Rejected,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Reviewing => "REVIEWING",
            AccountStatus::Approved => "APPROVED",
            AccountStatus::Rejected => "REJECTED",
            AccountStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "REVIEWING" => Some(AccountStatus::Reviewing),
            "APPROVED" => Some(AccountStatus::Approved),
            "REJECTED" => Some(AccountStatus::Rejected),
            "SUSPENDED" => Some(AccountStatus::Suspended),
            _ => None,
        }
    }
}

/// Represents a user - used throughout the app. Never carries the password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub account_status: AccountStatus,
    pub bio: Option<String>,
    pub social_links: Vec<String>,
}

/// Profile update from the dashboard. Name and social links are replaced
/// wholesale; a `None` bio keeps the stored value.
#[derive(Debug, Clone)]
pub struct UserProfileChanges {
    pub name: String,
    pub bio: Option<String>,
    pub social_links: Vec<String>,
}

/// Only used internally for login/registration - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub account_status: AccountStatus,
    pub hashed_password: String,
}

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    Free,
    Starter,
    Growth,
    Premium,
    Enterprise,
}

impl Plan {
    /// Monthly prompt quota for the plan. Enterprise is unlimited.
    pub fn monthly_quota(&self) -> i64 {
        match self {
            Plan::Free => 1_000,
            Plan::Starter => 5_000,
            Plan::Growth => 15_000,
            Plan::Premium => 25_000,
            Plan::Enterprise => i64::MAX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Starter => "STARTER",
            Plan::Growth => "GROWTH",
            Plan::Premium => "PREMIUM",
            Plan::Enterprise => "ENTERPRISE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FREE" => Some(Plan::Free),
            "STARTER" => Some(Plan::Starter),
            "GROWTH" => Some(Plan::Growth),
            "PREMIUM" => Some(Plan::Premium),
            "ENTERPRISE" => Some(Plan::Enterprise),
            _ => None,
        }
    }
}

/// A user's plan subscription. One row per user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: Uuid,
    pub plan: Plan,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

/// Monthly prompt usage counter, reset at `reset_date`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptQuota {
    pub user_id: Uuid,
    pub monthly_quota: i64,
    pub used_quota: i64,
    pub reset_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// An origin registered by a user for embedding; feeds the CORS allow-list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedDomain {
    pub id: Uuid,
    pub user_id: Uuid,
    pub origin: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_length_round_trips_through_str() {
        for value in [
            ResponseLength::Short,
            ResponseLength::Medium,
            ResponseLength::Detailed,
        ] {
            assert_eq!(ResponseLength::parse(value.as_str()), Some(value));
        }
        assert_eq!(ResponseLength::parse("LONG"), None);
    }

    #[test]
    fn plan_quotas_match_pricing_table() {
        assert_eq!(Plan::Free.monthly_quota(), 1_000);
        assert_eq!(Plan::Starter.monthly_quota(), 5_000);
        assert_eq!(Plan::Growth.monthly_quota(), 15_000);
        assert_eq!(Plan::Premium.monthly_quota(), 25_000);
        assert_eq!(Plan::Enterprise.monthly_quota(), i64::MAX);
    }

    #[test]
    fn enums_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ResponseLength::Detailed).unwrap(),
            "\"DETAILED\""
        );
        assert_eq!(serde_json::to_string(&Plan::Free).unwrap(), "\"FREE\"");
        assert_eq!(
            serde_json::to_string(&AccountStatus::Reviewing).unwrap(),
            "\"REVIEWING\""
        );
    }
}
