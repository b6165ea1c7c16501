pub mod credentials;
pub mod domain;
pub mod ports;

// Re-export the types the api service uses most, so call sites can stay
// short without reaching into submodules.
pub use credentials::{
    BotClaims, CredentialError, CredentialService, RefreshClaims, UserClaims,
    ACCESS_TOKEN_TTL_SECONDS,
};
pub use domain::{
    AccountStatus, AllowedDomain, BotProfile, BotProfileChanges, NewBotProfile, NewPersona,
    Persona, Plan, PromptQuota, ResponseLength, Subscription, User, UserCredentials,
    UserProfileChanges,
};
pub use ports::{DatabaseService, PortError, PortResult};
