use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, FormStore, PgFormStore};
use crate::handlers::form;

/// Everything a handler needs, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn FormStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn FormStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        // Service
        .route("/", get(root))
        .route("/health", get(health))
        // Forms
        .route("/form", get(form::list).post(form::create))
        .route(
            "/form/:form_id",
            get(form::get).put(form::update).delete(form::delete),
        )
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if let Some(cors) = cors_layer(&config) {
        app = app.layer(cors);
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.is_empty() {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    Some(CorsLayer::permissive().allow_origin(origins))
}

/// Connect, optionally migrate, and serve until Ctrl-C
pub async fn serve(config: AppConfig, migrate: bool) -> anyhow::Result<()> {
    info!(
        "Starting form service in {:?} mode against {}",
        config.environment,
        config.redacted_database_url()?
    );

    let database = DatabaseManager::connect(&config.database).await?;
    if migrate {
        database.migrate().await?;
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let store: Arc<dyn FormStore> = Arc::new(PgFormStore::new(database.clone()));
    let app = router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    info!("Form service listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Form Service",
        "version": version,
        "description": "CRUD service for form definitions",
        "endpoints": {
            "health": "GET /health",
            "list": "GET /form?form_id=<int...>&owner=<int...>",
            "get": "GET /form/:form_id",
            "create": "POST /form",
            "update": "PUT /form/:form_id",
            "delete": "DELETE /form/:form_id",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
