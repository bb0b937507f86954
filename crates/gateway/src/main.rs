//! ExamForge API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Request routing to the paper lifecycle engine
//! - Caller-context extraction
//! - Observability (logging, metrics, tracing)
//!
//! All domain logic lives in `examforge-core`; handlers here are thin
//! delegation.

mod handlers;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use examforge_core::{config::AppConfig, engine::PaperEngine, metrics};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<PaperEngine>,
    pub prometheus: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting ExamForge API Gateway v{}", examforge_core::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    let prometheus = PrometheusBuilder::new().install_recorder()?;
    metrics::register_metrics();

    // Build the engine with its collaborators
    let engine = Arc::new(PaperEngine::from_config(&config));

    // Create app state
    let state = AppState {
        config: config.clone(),
        engine,
        prometheus,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    // API routes
    let api_routes = Router::new()
        // Health endpoints (no caller context)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))

        // Paper endpoints
        .route("/papers", post(handlers::papers::create_paper))
        .route("/papers", get(handlers::papers::list_papers))
        .route("/papers/{id}", get(handlers::papers::get_paper))
        .route("/papers/{id}", delete(handlers::papers::delete_paper))
        .route("/papers/{id}/metadata", patch(handlers::papers::update_metadata))
        .route("/papers/{id}/regenerate", post(handlers::papers::regenerate_paper))
        .route("/papers/{id}/approve", post(handlers::papers::approve_paper))

        // Approved-paper endpoints
        .route("/approved-papers", get(handlers::papers::search_approved))
        .route("/approved-papers/subjects", get(handlers::papers::approved_subjects))
        .route("/approved-papers/summary", get(handlers::summary::summarize))
        .route(
            "/approved-papers/{id}/copy-for-edit",
            post(handlers::papers::copy_for_edit),
        )

        // History endpoints
        .route("/history", get(handlers::history::list_history))
        .route("/history", delete(handlers::history::clear_history))
        .route("/history/{id}", delete(handlers::history::delete_history_entry));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
