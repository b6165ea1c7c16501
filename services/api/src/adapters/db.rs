//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use askbot_core::domain::{
    AccountStatus, AllowedDomain, BotProfile, BotProfileChanges, NewBotProfile, NewPersona,
    Persona, Plan, PromptQuota, ResponseLength, Subscription, User, UserCredentials,
    UserProfileChanges,
};
use askbot_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PersonaRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    gender: Option<String>,
    system_prompt: Option<String>,
    default_tone: Option<String>,
    default_domain: Option<String>,
    default_greeting: Option<String>,
    default_fallback: Option<String>,
    avatar_url: Option<String>,
    language: String,
}
impl PersonaRecord {
    fn to_domain(self) -> Persona {
        Persona {
            id: self.id,
            name: self.name,
            description: self.description,
            gender: self.gender,
            system_prompt: self.system_prompt,
            default_tone: self.default_tone,
            default_domain: self.default_domain,
            default_greeting: self.default_greeting,
            default_fallback: self.default_fallback,
            avatar_url: self.avatar_url,
            language: self.language,
        }
    }
}

const PERSONA_COLUMNS: &str = "id, name, description, gender, system_prompt, default_tone, \
     default_domain, default_greeting, default_fallback, avatar_url, language";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    account_status: String,
    bio: Option<String>,
    social_links: Vec<String>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let account_status = parse_account_status(&self.account_status)?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            account_status,
            bio: self.bio,
            social_links: self.social_links,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, account_status, bio, social_links";

#[derive(FromRow)]
struct UserCredentialsRecord {
    id: Uuid,
    name: String,
    email: String,
    account_status: String,
    password: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        let account_status = parse_account_status(&self.account_status)?;
        Ok(UserCredentials {
            id: self.id,
            name: self.name,
            email: self.email,
            account_status,
            hashed_password: self.password,
        })
    }
}

#[derive(FromRow)]
struct BotProfileRecord {
    id: Uuid,
    user_id: Uuid,
    persona_id: Uuid,
    name: Option<String>,
    custom_greeting: Option<String>,
    custom_fallback: Option<String>,
    tone: Option<String>,
    primary_language: Option<String>,
    avatar_url: Option<String>,
    allowed_topics: Vec<String>,
    blocked_topics: Vec<String>,
    response_length: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl BotProfileRecord {
    fn to_domain(self) -> PortResult<BotProfile> {
        let response_length = match self.response_length {
            Some(raw) => Some(ResponseLength::parse(&raw).ok_or_else(|| {
                PortError::Unexpected(format!("invalid response length '{}'", raw))
            })?),
            None => None,
        };
        Ok(BotProfile {
            id: self.id,
            user_id: self.user_id,
            persona_id: self.persona_id,
            name: self.name,
            custom_greeting: self.custom_greeting,
            custom_fallback: self.custom_fallback,
            tone: self.tone,
            primary_language: self.primary_language,
            avatar_url: self.avatar_url,
            allowed_topics: self.allowed_topics,
            blocked_topics: self.blocked_topics,
            response_length,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BOT_PROFILE_COLUMNS: &str = "id, user_id, persona_id, name, custom_greeting, \
     custom_fallback, tone, primary_language, avatar_url, allowed_topics, blocked_topics, \
     response_length, created_at, updated_at";

#[derive(FromRow)]
struct AllowedDomainRecord {
    id: Uuid,
    user_id: Uuid,
    origin: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}
impl AllowedDomainRecord {
    fn to_domain(self) -> AllowedDomain {
        AllowedDomain {
            id: self.id,
            user_id: self.user_id,
            origin: self.origin,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SubscriptionRecord {
    user_id: Uuid,
    plan: String,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    canceled_at: Option<DateTime<Utc>>,
}
impl SubscriptionRecord {
    fn to_domain(self) -> PortResult<Subscription> {
        let plan = Plan::parse(&self.plan)
            .ok_or_else(|| PortError::Unexpected(format!("invalid plan '{}'", self.plan)))?;
        Ok(Subscription {
            user_id: self.user_id,
            plan,
            status: self.status,
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            canceled_at: self.canceled_at,
        })
    }
}

#[derive(FromRow)]
struct PromptQuotaRecord {
    user_id: Uuid,
    monthly_quota: i64,
    used_quota: i64,
    reset_date: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}
impl PromptQuotaRecord {
    fn to_domain(self) -> PromptQuota {
        PromptQuota {
            user_id: self.user_id,
            monthly_quota: self.monthly_quota,
            used_quota: self.used_quota,
            reset_date: self.reset_date,
            last_updated: self.last_updated,
        }
    }
}

fn parse_account_status(raw: &str) -> PortResult<AccountStatus> {
    AccountStatus::parse(raw)
        .ok_or_else(|| PortError::Unexpected(format!("invalid account status '{}'", raw)))
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_persona(&self, persona: NewPersona) -> PortResult<Persona> {
        let sql = format!(
            "INSERT INTO bot_personas (name, description, gender, system_prompt, default_tone, \
             default_domain, default_greeting, default_fallback, avatar_url, language) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {PERSONA_COLUMNS}"
        );
        let record = sqlx::query_as::<_, PersonaRecord>(&sql)
            .bind(&persona.name)
            .bind(&persona.description)
            .bind(&persona.gender)
            .bind(&persona.system_prompt)
            .bind(&persona.default_tone)
            .bind(&persona.default_domain)
            .bind(&persona.default_greeting)
            .bind(&persona.default_fallback)
            .bind(&persona.avatar_url)
            .bind(&persona.language)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_personas(&self) -> PortResult<Vec<Persona>> {
        let sql = format!("SELECT {PERSONA_COLUMNS} FROM bot_personas ORDER BY created_at ASC");
        let records = sqlx::query_as::<_, PersonaRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_persona_by_id(&self, persona_id: Uuid) -> PortResult<Persona> {
        let sql = format!("SELECT {PERSONA_COLUMNS} FROM bot_personas WHERE id = $1");
        let record = sqlx::query_as::<_, PersonaRecord>(&sql)
            .bind(persona_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Persona {} not found", persona_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn count_personas(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bot_personas")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(name)
            .bind(email)
            .bind(hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    PortError::Conflict("User with this email already exists".to_string())
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("User {} not found", user_id))
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UserProfileChanges,
    ) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET name = $2, bio = COALESCE($3, bio), social_links = $4 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .bind(&changes.name)
            .bind(&changes.bio)
            .bind(&changes.social_links)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("User {} not found", user_id))
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT id, name, email, account_status, password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn create_bot_profile(&self, profile: NewBotProfile) -> PortResult<BotProfile> {
        let sql = format!(
            "INSERT INTO bot_profiles (user_id, persona_id, name, custom_greeting, \
             custom_fallback, tone, primary_language, avatar_url, allowed_topics, \
             blocked_topics, response_length) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {BOT_PROFILE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, BotProfileRecord>(&sql)
            .bind(profile.user_id)
            .bind(profile.persona_id)
            .bind(&profile.name)
            .bind(&profile.custom_greeting)
            .bind(&profile.custom_fallback)
            .bind(&profile.tone)
            .bind(&profile.primary_language)
            .bind(&profile.avatar_url)
            .bind(&profile.allowed_topics)
            .bind(&profile.blocked_topics)
            .bind(profile.response_length.map(|r| r.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.to_domain()
    }

    async fn update_bot_profile(
        &self,
        profile_id: Uuid,
        changes: BotProfileChanges,
    ) -> PortResult<BotProfile> {
        let sql = format!(
            "UPDATE bot_profiles SET \
             name = COALESCE($2, name), \
             custom_greeting = COALESCE($3, custom_greeting), \
             custom_fallback = COALESCE($4, custom_fallback), \
             tone = COALESCE($5, tone), \
             primary_language = COALESCE($6, primary_language), \
             avatar_url = COALESCE($7, avatar_url), \
             allowed_topics = COALESCE($8, allowed_topics), \
             blocked_topics = COALESCE($9, blocked_topics), \
             response_length = COALESCE($10, response_length), \
             updated_at = now() \
             WHERE id = $1 RETURNING {BOT_PROFILE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, BotProfileRecord>(&sql)
            .bind(profile_id)
            .bind(&changes.name)
            .bind(&changes.custom_greeting)
            .bind(&changes.custom_fallback)
            .bind(&changes.tone)
            .bind(&changes.primary_language)
            .bind(&changes.avatar_url)
            .bind(&changes.allowed_topics)
            .bind(&changes.blocked_topics)
            .bind(changes.response_length.map(|r| r.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Bot profile {} not found", profile_id))
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn get_bot_profile_by_id(&self, profile_id: Uuid) -> PortResult<BotProfile> {
        let sql = format!("SELECT {BOT_PROFILE_COLUMNS} FROM bot_profiles WHERE id = $1");
        let record = sqlx::query_as::<_, BotProfileRecord>(&sql)
            .bind(profile_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Bot profile {} not found", profile_id))
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn list_bot_profiles_by_owner(&self, user_id: Uuid) -> PortResult<Vec<BotProfile>> {
        let sql = format!(
            "SELECT {BOT_PROFILE_COLUMNS} FROM bot_profiles WHERE user_id = $1 \
             ORDER BY created_at ASC"
        );
        let records = sqlx::query_as::<_, BotProfileRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn add_allowed_domain(
        &self,
        user_id: Uuid,
        origin: &str,
        description: Option<&str>,
    ) -> PortResult<AllowedDomain> {
        let record = sqlx::query_as::<_, AllowedDomainRecord>(
            "INSERT INTO allowed_domains (user_id, origin, description) VALUES ($1, $2, $3) \
             RETURNING id, user_id, origin, description, created_at",
        )
        .bind(user_id)
        .bind(origin)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Origin {} is already registered", origin))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_user_domains(&self, user_id: Uuid) -> PortResult<Vec<AllowedDomain>> {
        let records = sqlx::query_as::<_, AllowedDomainRecord>(
            "SELECT id, user_id, origin, description, created_at FROM allowed_domains \
             WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_all_origins(&self) -> PortResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT origin FROM allowed_domains")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn get_subscription(&self, user_id: Uuid) -> PortResult<Option<Subscription>> {
        let record = sqlx::query_as::<_, SubscriptionRecord>(
            "SELECT user_id, plan, status, current_period_start, current_period_end, \
             canceled_at FROM subscriptions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn get_prompt_quota(&self, user_id: Uuid) -> PortResult<Option<PromptQuota>> {
        let record = sqlx::query_as::<_, PromptQuotaRecord>(
            "SELECT user_id, monthly_quota, used_quota, reset_date, last_updated \
             FROM prompt_quotas WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn update_plan_subscription(
        &self,
        user_id: Uuid,
        plan: Plan,
        period_end: DateTime<Utc>,
    ) -> PortResult<(Subscription, PromptQuota)> {
        // Subscription and quota must move together.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let subscription = sqlx::query_as::<_, SubscriptionRecord>(
            "INSERT INTO subscriptions (user_id, plan, status, current_period_start, \
             current_period_end, canceled_at) VALUES ($1, $2, 'active', now(), $3, NULL) \
             ON CONFLICT (user_id) DO UPDATE SET plan = EXCLUDED.plan, status = 'active', \
             current_period_start = now(), current_period_end = EXCLUDED.current_period_end, \
             canceled_at = NULL \
             RETURNING user_id, plan, status, current_period_start, current_period_end, \
             canceled_at",
        )
        .bind(user_id)
        .bind(plan.as_str())
        .bind(period_end)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        let quota = sqlx::query_as::<_, PromptQuotaRecord>(
            "INSERT INTO prompt_quotas (user_id, monthly_quota, reset_date) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET monthly_quota = EXCLUDED.monthly_quota, \
             reset_date = EXCLUDED.reset_date, last_updated = now() \
             RETURNING user_id, monthly_quota, used_quota, reset_date, last_updated",
        )
        .bind(user_id)
        .bind(plan.monthly_quota())
        .bind(period_end)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;

        Ok((subscription.to_domain()?, quota.to_domain()))
    }

    async fn reset_prompt_quota(
        &self,
        user_id: Uuid,
        monthly_quota: i64,
        reset_date: DateTime<Utc>,
    ) -> PortResult<PromptQuota> {
        let record = sqlx::query_as::<_, PromptQuotaRecord>(
            "INSERT INTO prompt_quotas (user_id, monthly_quota, used_quota, reset_date) \
             VALUES ($1, $2, 0, $3) \
             ON CONFLICT (user_id) DO UPDATE SET monthly_quota = EXCLUDED.monthly_quota, \
             used_quota = 0, reset_date = EXCLUDED.reset_date, last_updated = now() \
             RETURNING user_id, monthly_quota, used_quota, reset_date, last_updated",
        )
        .bind(user_id)
        .bind(monthly_quota)
        .bind(reset_date)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }
}
