//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] loads `.env`, installs tracing, resolves settings, builds
//! the router and hands the serve loop to the [`Lifecycle`], which sets the
//! database up before serving and tears it down afterwards.
//!
//! Settings are resolved while the lifecycle is still `NotStarted`: the
//! router state needs them before anything is served.

// region: --- Imports
use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use lib_core::{init_settings, ModelManager, Settings};
use lib_utils::{get_env, parse_flag};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::auth::{AuthBackend, LoggingUserEvents, UserEvents, UserManager};
use crate::handlers;
use crate::lifecycle::Lifecycle;
use crate::middleware::{log_requests, stamp_req, RequestStamp};
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub mm: ModelManager,
    pub settings: Arc<Settings>,
    pub users: UserManager,
    pub backend: AuthBackend,
}

impl AppState {
    pub fn new(mm: ModelManager, settings: Arc<Settings>, events: Arc<dyn UserEvents>) -> Self {
        let users = UserManager::new(mm.clone(), &settings, events);
        Self {
            mm,
            settings,
            users,
            backend: AuthBackend::default(),
        }
    }
}

impl FromRef<AppState> for ModelManager {
    fn from_ref(state: &AppState) -> Self {
        state.mm.clone()
    }
}

impl FromRef<AppState> for Arc<Settings> {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}

impl FromRef<AppState> for UserManager {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for AuthBackend {
    fn from_ref(state: &AppState) -> Self {
        state.backend.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `BIND_ADDRESS` and `ALLOWED_ORIGINS`
    /// (comma-separated).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind_address) = get_env("BIND_ADDRESS") {
            if !bind_address.trim().is_empty() {
                config.bind_address = bind_address.trim().to_string();
            }
        }
        if let Ok(origins) = get_env("ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }
}
// endregion: --- Server Configuration

// region: --- Tracing
/// Install the global tracing subscriber.
///
/// The level comes from `LOG_LEVEL`, defaulting to `debug` when `DEBUG` is
/// on and `info` otherwise. A subscriber installed earlier is left in place.
pub fn init_tracing() {
    let debug = parse_flag("DEBUG", get_env("DEBUG").ok(), false).unwrap_or(false);
    let log_level = get_env("LOG_LEVEL")
        .map(|l| l.to_lowercase())
        .unwrap_or_else(|_| if debug { "debug" } else { "info" }.to_string());

    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => tracing_subscriber::EnvFilter::new(&log_level),
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init();

    if installed.is_ok() {
        info!(" Log level: {}", log_level);
    }
}
// endregion: --- Tracing

// region: --- Server Setup
/// Initialize and start the HTTP server
///
/// Returns when the server has shut down (Ctrl-C / SIGTERM) and the
/// database has been torn down.
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading fails (unknown `DB_TYPE`, missing or short secret)
/// - Server binding fails
/// - Database setup or schema creation fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!(" USER AUTH BACKEND STARTING");

    info!("Loading configuration...");
    let settings = init_settings()?;
    info!("Application: {}", settings.app_name);
    info!("Database URL: {}", settings.database_url_redacted());

    let mm = ModelManager::new();
    let state = AppState::new(
        mm.clone(),
        Arc::new(settings.clone()),
        Arc::new(LoggingUserEvents),
    );
    info!(
        "Auth backend: {} (token lifetime {}s)",
        state.backend.name(),
        state.backend.strategy().lifetime_secs()
    );
    let app = create_router(state, &config.allowed_origins);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    Lifecycle::new(mm)
        .run(settings, async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("Server has shut down gracefully.");
            Ok(())
        })
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Create the main application router with all routes
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let login_path = format!("/{}", state.backend.transport().token_url());

    info!("[ROUTE SETUP] Registering HTTP routes...");
    Router::new()
        // Auth
        .route(&login_path, post(handlers::auth::login))
        .route("/auth/jwt/logout", post(handlers::auth::logout))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/auth/request-verify-token", post(handlers::auth::request_verify_token))
        .route("/auth/verify", post(handlers::auth::verify))
        // Users
        .route("/users/me", get(handlers::users::get_me).patch(handlers::users::patch_me))
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::patch_user)
                .delete(handlers::users::delete_user),
        )
        // System
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .route("/db-check", get(handlers::system::db_check))
        .route("/authenticated-route", get(handlers::system::authenticated_route))
        .with_state(state)
        // Layers run bottom-up: stamp first so the span and the log see the request ID
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .extensions()
                    .get::<RequestStamp>()
                    .map(|s| s.id.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(axum::middleware::from_fn(log_requests))
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!(" AUTH:");
    info!("   • POST /auth/jwt/login (form: username, password)");
    info!("   • POST /auth/jwt/logout");
    info!("   • POST /auth/register");
    info!("   • POST /auth/forgot-password");
    info!("   • POST /auth/reset-password");
    info!("   • POST /auth/request-verify-token");
    info!("   • POST /auth/verify");
    info!(" USERS:");
    info!("   • GET|PATCH /users/me");
    info!("   • GET|PATCH|DELETE /users/{{id}}");
    info!(" SYSTEM:");
    info!("   • GET  /");
    info!("   • GET  /health");
    info!("   • GET  /db-check");
    info!("   • GET  /authenticated-route");
}
// endregion: --- Server Setup
