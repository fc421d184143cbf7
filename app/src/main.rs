use axum::{
    routing::{get, post},
    Router,
    middleware,
};
use cards::catalog::CardCatalog;
use cards::gateway::select_gateway;
use clap::Parser;
use common::{AppState, Config, auth::{DEFAULT_ADMIN_PASSWORD, auth_middleware}};
use database::Database;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use rust_embed::RustEmbed;
use axum_embed::ServeEmbed;
use tower_sessions::{MemoryStore, SessionManagerLayer};

mod handlers;

#[derive(RustEmbed, Clone)]
#[folder = "public/"]
struct Assets;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from .env, environment and CLI args
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // 3. Local storage, then pick the backend once
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let gateway = select_gateway(db, config.remote());
    let catalog = Arc::new(CardCatalog::load(gateway).await);

    let state = Arc::new(AppState {
        catalog,
        config: config.clone(),
    });

    // 4. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    if config.admin_password == DEFAULT_ADMIN_PASSWORD {
        tracing::warn!("ADMIN_PASSWORD is not set, the built-in default password is in use.");
    }
    axum::serve(listener, app_router(state)).await?;

    Ok(())
}

/// Full application: public pages, login, and the gated admin panel.
pub fn app_router(state: Arc<AppState>) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false); // Set to true in production with HTTPS

    let serve_assets = ServeEmbed::<Assets>::new();

    let admin_routes = cards::handler::admin_router(state.catalog.clone())
        .layer(middleware::from_fn(auth_middleware));

    Router::<Arc<AppState>>::new()
        .route("/login", get(handlers::auth::login_get).post(handlers::auth::login_post))
        .route("/logout", post(handlers::auth::logout))
        .nest_service("/public", serve_assets)
        .merge(cards::handler::public_router(state.catalog.clone()))
        .nest("/admin", admin_routes)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
