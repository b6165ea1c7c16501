//! Shared in-memory database and fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use askbot_core::credentials::{CredentialService, UserClaims};
use askbot_core::domain::{
    AccountStatus, AllowedDomain, BotProfile, BotProfileChanges, NewBotProfile, NewPersona,
    Persona, Plan, PromptQuota, Subscription, User, UserCredentials, UserProfileChanges,
};
use askbot_core::ports::{DatabaseService, PortError, PortResult};

use api_lib::web::state::AppState;

#[derive(Default)]
pub struct InMemoryDb {
    pub personas: Mutex<HashMap<Uuid, Persona>>,
    pub profiles: Mutex<HashMap<Uuid, BotProfile>>,
    pub users: Mutex<HashMap<Uuid, User>>,
    pub domains: Mutex<Vec<AllowedDomain>>,
}

impl InMemoryDb {
    pub fn with_persona(persona_id: Uuid) -> Self {
        let db = Self::default();
        db.personas.lock().unwrap().insert(
            persona_id,
            Persona {
                id: persona_id,
                name: "Zoie".to_string(),
                description: None,
                gender: None,
                system_prompt: None,
                default_tone: Some("friendly".to_string()),
                default_domain: None,
                default_greeting: Some("Hi there!".to_string()),
                default_fallback: None,
                avatar_url: None,
                language: "en".to_string(),
            },
        );
        db
    }

    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_persona(&self, _persona: NewPersona) -> PortResult<Persona> {
        Err(PortError::Unexpected("not wired in tests".to_string()))
    }

    async fn list_personas(&self) -> PortResult<Vec<Persona>> {
        Ok(self.personas.lock().unwrap().values().cloned().collect())
    }

    async fn get_persona_by_id(&self, persona_id: Uuid) -> PortResult<Persona> {
        self.personas
            .lock()
            .unwrap()
            .get(&persona_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Persona {} not found", persona_id)))
    }

    async fn count_personas(&self) -> PortResult<i64> {
        Ok(self.personas.lock().unwrap().len() as i64)
    }

    async fn create_user(
        &self,
        _name: &str,
        _email: &str,
        _hashed_password: &str,
    ) -> PortResult<User> {
        Err(PortError::Unexpected("not wired in tests".to_string()))
    }

    async fn get_user_by_email(&self, _email: &str) -> PortResult<Option<UserCredentials>> {
        Ok(None)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UserProfileChanges,
    ) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        user.name = changes.name;
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        user.social_links = changes.social_links;
        Ok(user.clone())
    }

    async fn create_bot_profile(&self, profile: NewBotProfile) -> PortResult<BotProfile> {
        let now = Utc::now();
        let created = BotProfile {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            persona_id: profile.persona_id,
            name: profile.name,
            custom_greeting: profile.custom_greeting,
            custom_fallback: profile.custom_fallback,
            tone: profile.tone,
            primary_language: profile.primary_language,
            avatar_url: profile.avatar_url,
            allowed_topics: profile.allowed_topics,
            blocked_topics: profile.blocked_topics,
            response_length: profile.response_length,
            created_at: now,
            updated_at: now,
        };
        self.profiles
            .lock()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_bot_profile(
        &self,
        profile_id: Uuid,
        _changes: BotProfileChanges,
    ) -> PortResult<BotProfile> {
        Err(PortError::NotFound(format!(
            "Bot profile {} not found",
            profile_id
        )))
    }

    async fn get_bot_profile_by_id(&self, profile_id: Uuid) -> PortResult<BotProfile> {
        self.profiles
            .lock()
            .unwrap()
            .get(&profile_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Bot profile {} not found", profile_id)))
    }

    async fn list_bot_profiles_by_owner(&self, user_id: Uuid) -> PortResult<Vec<BotProfile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_allowed_domain(
        &self,
        user_id: Uuid,
        origin: &str,
        description: Option<&str>,
    ) -> PortResult<AllowedDomain> {
        let mut domains = self.domains.lock().unwrap();
        if domains.iter().any(|d| d.origin == origin) {
            return Err(PortError::Conflict(format!(
                "Origin {} is already registered",
                origin
            )));
        }
        let domain = AllowedDomain {
            id: Uuid::new_v4(),
            user_id,
            origin: origin.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        domains.push(domain.clone());
        Ok(domain)
    }

    async fn list_user_domains(&self, user_id: Uuid) -> PortResult<Vec<AllowedDomain>> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_origins(&self) -> PortResult<Vec<String>> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.origin.clone())
            .collect())
    }

    async fn get_subscription(&self, _user_id: Uuid) -> PortResult<Option<Subscription>> {
        Ok(None)
    }

    async fn get_prompt_quota(&self, _user_id: Uuid) -> PortResult<Option<PromptQuota>> {
        Ok(None)
    }

    async fn update_plan_subscription(
        &self,
        _user_id: Uuid,
        _plan: Plan,
        _period_end: DateTime<Utc>,
    ) -> PortResult<(Subscription, PromptQuota)> {
        Err(PortError::Unexpected("not wired in tests".to_string()))
    }

    async fn reset_prompt_quota(
        &self,
        _user_id: Uuid,
        _monthly_quota: i64,
        _reset_date: DateTime<Utc>,
    ) -> PortResult<PromptQuota> {
        Err(PortError::Unexpected("not wired in tests".to_string()))
    }
}

pub fn test_state(db: InMemoryDb) -> Arc<AppState> {
    Arc::new(AppState {
        db: Arc::new(db),
        credentials: CredentialService::new("test-secret", None),
        allowed_origins: Arc::new(RwLock::new(HashSet::new())),
    })
}

pub fn user_claims(user_id: Uuid) -> UserClaims {
    let now = Utc::now();
    UserClaims {
        user_id,
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        account_status: AccountStatus::Approved,
        iat: now.timestamp(),
        exp: (now + Duration::days(1)).timestamp(),
    }
}
