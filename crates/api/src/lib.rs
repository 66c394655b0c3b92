//! Startup Outcome Prediction API Server
//!
//! REST API serving startup acquisition predictions from trained artifacts.

use anyhow::Context;
use artifact_store::ArtifactStore;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use inference_engine::InferencePipeline;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod settings;

pub use error::ApiError;
pub use settings::{LoggingSettings, Settings};

/// Application state shared across handlers
pub struct AppState {
    /// Prediction pipeline over the loaded artifacts
    pub pipeline: InferencePipeline,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Prometheus exporter, when installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(pipeline: InferencePipeline) -> Self {
        Self {
            pipeline,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model_kind: String,
    pub feature_count: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(routes::predict::predict))
        .route("/api/v1/predict", post(routes::predict::predict))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/model", get(routes::model::get_model))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let store = state.pipeline.store();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model_kind: store.model_kind().to_string(),
        feature_count: store.schema().len(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) {
    let level = Level::from_str(&settings.level).unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true);

    // Ignore the error when a subscriber is already installed (tests, embedding)
    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Load artifacts, then serve until the listener fails
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let store = ArtifactStore::load(&settings.artifacts).with_context(|| {
        format!(
            "failed to load model artifacts from {}",
            settings.artifacts.dir.display()
        )
    })?;
    info!(
        "Loaded {} model with {} features",
        store.model_kind(),
        store.schema().len()
    );

    let pipeline = InferencePipeline::new(
        Arc::new(store),
        &settings.reconstruction,
        settings.validation.clone(),
    );

    let mut state = AppState::new(pipeline);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Metrics exporter not installed: {}", e),
    }

    let mut app = create_router(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    match rate_limit::create_governor_config(&settings.rate_limit) {
        Some(config) => app = app.layer(GovernorLayer { config }),
        None => info!("Rate limiting disabled"),
    }

    let listener = tokio::net::TcpListener::bind(&settings.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.addr))?;
    info!("Starting API server on {}", settings.server.addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
