//! FR Generator Backend
//!
//! Local REST backend for the FR wizard: stores settings and templates, fills the
//! change-request forms and keeps the generation history.

mod api;
mod auth;
mod categories;
mod config;
mod db;
mod downloads;
mod drafts;
mod errors;
mod generation;
mod history;
mod models;
mod settings;
mod store;
mod templates;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use categories::CategoryRegistry;
use config::Config;
use db::SqliteObjectStore;
use downloads::DownloadShelf;
use drafts::DraftStore;
use generation::{FsOutput, GenerationOrchestrator};
use history::HistoryLedger;
use settings::SettingsRepository;
use store::StoreHandle;
use templates::TemplateRepository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: SettingsRepository,
    pub templates: TemplateRepository,
    pub history: HistoryLedger,
    pub categories: CategoryRegistry,
    pub drafts: DraftStore,
    pub downloads: DownloadShelf,
    pub generator: GenerationOrchestrator,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every repository to the same object store.
    pub fn new(store: StoreHandle, config: Config) -> Self {
        Self {
            settings: SettingsRepository::new(store.clone()),
            templates: TemplateRepository::new(store.clone()),
            history: HistoryLedger::new(store.clone()),
            categories: CategoryRegistry::new(store.clone()),
            drafts: DraftStore::new(store.clone()),
            downloads: DownloadShelf::new(store.clone()),
            generator: GenerationOrchestrator::new(
                store,
                config.sheet_layout.clone(),
                Arc::new(FsOutput),
            ),
            config: Arc::new(config),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FR Generator Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Default output root: {:?}", config.resolve_default_output_root());
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (FRGEN_API_PSK). Authentication is disabled!");
    }

    // Open the object store
    let pool = db::init_database(&config.db_path).await?;
    let sqlite = Arc::new(SqliteObjectStore::open(pool, &config.namespace));
    tracing::info!("Object store namespace: {}", sqlite.namespace());
    let store: StoreHandle = sqlite.clone();

    let state = AppState::new(store, config.clone());
    state.settings.load_or_create().await?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sqlite.close().await;
    tracing::info!("Object store closed");

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Settings
        .route("/settings", get(api::get_settings))
        .route("/settings", put(api::update_settings))
        .route("/settings/reset", post(api::reset_settings))
        .route("/settings/export", get(api::export_settings))
        .route("/settings/import", post(api::import_settings))
        // Templates
        .route("/templates", get(api::list_templates))
        .route("/templates/{kind}", get(api::get_template))
        .route(
            "/templates/{kind}",
            put(api::put_template).layer(DefaultBodyLimit::max(api::TEMPLATE_BODY_LIMIT)),
        )
        .route("/templates/{kind}", delete(api::delete_template))
        // History
        .route("/history", get(api::list_history))
        .route("/history", delete(api::clear_history))
        .route("/history/export", get(api::export_history))
        .route("/history/{id}", delete(api::delete_history_entry))
        // Categories
        .route("/categories", get(api::list_categories))
        .route("/categories", post(api::create_category))
        .route("/categories/ensure", post(api::ensure_category))
        .route("/categories/{id}", put(api::update_category))
        .route("/categories/{id}", delete(api::delete_category))
        // Draft
        .route("/draft", get(api::get_draft))
        .route("/draft", put(api::save_draft))
        .route("/draft", delete(api::discard_draft))
        .route("/draft/items", post(api::upsert_draft_item))
        .route("/draft/items/{list}/{id}", delete(api::remove_draft_item))
        // Generation
        .route("/generate", post(api::generate))
        .route("/downloads", get(api::list_downloads))
        .route("/downloads/{name}", get(api::get_download))
        .route("/downloads/{name}", delete(api::delete_download))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl+C. Without a signal handler the server runs until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
