//! HTTP server for spamwatchd

use crate::error::json_error_bodies;
use crate::routes;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::middleware::map_response;
use axum::Router;
use spamwatch_common::{ModelBundle, PredictionHistory, SpamError, SpamwatchConfig};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Loaded model, `None` until the first successful load
    pub model: RwLock<Option<Arc<ModelBundle>>>,
    pub history: RwLock<PredictionHistory>,
    pub config: SpamwatchConfig,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: SpamwatchConfig) -> Self {
        Self {
            model: RwLock::new(None),
            history: RwLock::new(PredictionHistory::new(config.history.capacity)),
            config,
            start_time: Instant::now(),
        }
    }

    /// Create app state with an already loaded model
    pub fn new_with_model(config: SpamwatchConfig, bundle: ModelBundle) -> Self {
        let state = Self::new(config);
        Self {
            model: RwLock::new(Some(Arc::new(bundle))),
            ..state
        }
    }

    pub async fn current_model(&self) -> Option<Arc<ModelBundle>> {
        self.model.read().await.clone()
    }

    pub async fn model_loaded(&self) -> bool {
        self.model.read().await.is_some()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Load artifacts from the configured paths and swap them in.
    ///
    /// On failure the previously loaded model keeps serving.
    pub async fn reload_model(&self) -> Result<(), SpamError> {
        let model_config = self.config.model.clone();
        let bundle = tokio::task::spawn_blocking(move || ModelBundle::load(&model_config))
            .await
            .map_err(|e| SpamError::ModelLoad(format!("loader task failed: {}", e)))??;

        *self.model.write().await = Some(Arc::new(bundle));
        Ok(())
    }
}

/// Build the router with all routes and layers
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.limits.max_upload_bytes;

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::predict_routes())
        .merge(routes::management_routes())
        .fallback(routes::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(map_response(json_error_bodies))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind.clone();
    let state = Arc::new(state);
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutting down gracefully");
}
