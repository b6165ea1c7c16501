//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::DbAdapter,
    config::Config,
    error::ApiError,
    setup::seed_default_personas,
    web::{
        auth::{login_handler, register_handler},
        bot::{
            add_persona_handler, available_personas_handler, bot_auth_handler,
            edit_assistant_handler, refresh_access_token_handler, refresh_token_handler,
            save_profile_handler, user_bot_handler, user_bots_handler,
        },
        domains::{add_domain_handler, my_domains_handler},
        error::error_envelope,
        guards::{require_bot, require_user},
        rest::{health_handler, ApiDoc},
        state::AppState,
        subscription::{
            claim_free_prompts_handler, current_subscription_handler, subscribe_handler,
        },
        user::{update_profile_handler, user_details_handler},
    },
};
use askbot_core::credentials::CredentialService;
use askbot_core::ports::DatabaseService;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    // The credential service is the single signing authority, constructed
    // here and injected; nothing else reads the secret.
    let credentials = CredentialService::new(config.jwt_secret.clone(), config.refresh_token_ttl);

    // The origin set is shared with the domain-registration handler, so
    // origins registered after startup are honored without a restart.
    let mut origins: HashSet<String> =
        db_adapter.list_all_origins().await?.into_iter().collect();
    origins.insert(config.frontend_origin.clone());
    info!("CORS allow-list loaded ({} origins)", origins.len());
    let allowed_origins = Arc::new(RwLock::new(origins));

    let app_state = Arc::new(AppState {
        db: db_adapter,
        credentials,
        allowed_origins: Arc::clone(&allowed_origins),
    });

    // --- 4. One-time Setup ---
    seed_default_personas(app_state.db.as_ref()).await?;

    // --- 5. CORS: registered embed origins plus the static frontend origin ---
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .ok()
                .map(|o| {
                    allowed_origins
                        .read()
                        .map(|set| set.contains(o))
                        .unwrap_or(false)
                })
                .unwrap_or(false)
        }))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-bot-profile"),
        ]);

    // --- 6. Create the Web Router ---
    // The user guard is global; it bypasses itself on the public-route
    // allow-list. Bot-session routes additionally carry the bot guard.
    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/user/user-details", get(user_details_handler))
        .route("/user/profile", put(update_profile_handler))
        .route("/bot/add-persona", post(add_persona_handler))
        .route("/bot/available-personas", get(available_personas_handler))
        .route("/bot/save", post(save_profile_handler))
        .route("/bot/edit-assistant", patch(edit_assistant_handler))
        .route("/bot/user-bots", get(user_bots_handler))
        .route("/bot/user-bot/{bot_id}", get(user_bot_handler))
        .route("/bot/refresh-token/{profile_id}", get(refresh_token_handler))
        .route(
            "/bot/refresh-access-token",
            post(refresh_access_token_handler),
        )
        .route(
            "/bot/auth",
            get(bot_auth_handler).layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                require_bot,
            )),
        )
        .route(
            "/profile/domains",
            post(add_domain_handler).get(my_domains_handler),
        )
        .route("/subscription/subscribe", post(subscribe_handler))
        .route("/subscription/current", get(current_subscription_handler))
        .route(
            "/subscription/claim-free-prompts",
            post(claim_free_prompts_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_user,
        ))
        .layer(axum_middleware::from_fn(error_envelope))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
