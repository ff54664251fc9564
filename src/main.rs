//! Farm Visit Management Backend
//!
//! REST backend for farm-visit reports with SQLite persistence, local photo storage, admin
//! sessions, and printable report export.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod export;
mod filter;
mod models;
mod report;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::SessionRegistry;
use config::{Config, LogFormat};
use db::Repository;
use storage::ObjectStorage;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub storage: Arc<ObjectStorage>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Farm Visit Management Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Upload directory: {:?}", config.upload_dir);
    tracing::info!("Bind address: {}", config.bind_addr);
    if let Some(dir) = &config.export_dir {
        tracing::info!("Archiving exports to {:?}", dir);
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if repo
        .ensure_admin(&config.admin_username, &config.admin_password)
        .await?
    {
        tracing::warn!(
            "Created bootstrap admin account '{}'. Change FARM_ADMIN_PASSWORD for production use!",
            config.admin_username
        );
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let storage = Arc::new(ObjectStorage::new(&config.upload_dir, &config.public_url));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionRegistry::new()),
        storage,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let sessions = state.sessions.clone();

    // Form and login routes (no session required)
    let public_routes = Router::new()
        .route("/visits", post(api::create_visit))
        .route("/crop-stages", get(api::list_crop_stages))
        .route("/crop-stages/lookup", get(api::lookup_crop_stages))
        .route(
            "/uploads",
            post(api::upload_photo).layer(DefaultBodyLimit::max(api::MAX_UPLOAD_BYTES)),
        )
        .route("/session", post(api::login));

    // Dashboard routes
    let admin_routes = Router::new()
        .route("/visits", get(api::list_visits))
        .route("/visits/{id}", get(api::get_visit))
        .route("/visits/{id}", delete(api::delete_visit))
        .route("/visits/{id}/report", get(api::get_visit_report))
        .route("/visits/{id}/expanded", get(api::get_visit_expanded))
        .route("/visits/{id}/export", get(api::export_visit))
        .route("/session", delete(api::logout))
        .route("/revision", get(api::get_revision))
        // Apply session auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::session_auth_layer(sessions.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    let uploads = ServeDir::new(state.storage.root());

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .nest_service("/uploads", uploads)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
