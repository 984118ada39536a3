//! Application startup and lifecycle management.

use crate::config::{LexliteConfig, ProviderKind};
use crate::handlers;
use crate::services::providers::mock::MockTextProvider;
use crate::services::providers::openai::{OpenAiConfig, OpenAiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::{Orchestrator, SessionStore};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: LexliteConfig,
    pub store: SessionStore,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: LexliteConfig, provider: Arc<dyn TextProvider>) -> Self {
        let orchestrator = Arc::new(Orchestrator::from_config(&config, provider));
        Self {
            config,
            store: SessionStore::new(),
            orchestrator,
        }
    }
}

/// Build the text provider selected by `LLM_PROVIDER`.
pub fn build_provider(config: &LexliteConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    let provider: Arc<dyn TextProvider> = match config.llm.provider {
        ProviderKind::OpenAi => {
            let api_key = config.llm.api_key.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("OPENAI_API_KEY is required for openai"))
            })?;
            let provider = OpenAiTextProvider::new(OpenAiConfig {
                api_key,
                base_url: config.llm.base_url.clone(),
                model: config.llm.model.clone(),
                timeout: config.llm.timeout(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
            Arc::new(provider)
        }
        ProviderKind::Mock => Arc::new(MockTextProvider::new(true)),
    };

    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        "Initialized text provider"
    );

    Ok(provider)
}

/// The full HTTP surface, wrapped in the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.documents.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/:id/document", post(handlers::upload_document))
        .route("/sessions/:id/summary", post(handlers::request_summary))
        .route("/sessions/:id/answer", post(handlers::request_answer))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: LexliteConfig) -> Result<Self, AppError> {
        let provider = build_provider(&config)?;
        Self::build_with_provider(config, provider).await
    }

    /// Build the application around an existing provider.
    pub async fn build_with_provider(
        config: LexliteConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            free_actions = config.quota.free_actions,
            max_chars = config.documents.max_chars,
            reupload_policy = %config.documents.reupload_policy,
            "LexLite service listening"
        );

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, provider),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until the process is stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sweeper = self
            .state
            .store
            .spawn_sweeper(self.state.config.sessions.idle_timeout(), SWEEP_INTERVAL);

        let router = build_router(self.state);
        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        sweeper.abort();
        if let Err(e) = &result {
            tracing::error!("HTTP server error: {}", e);
        }
        result
    }
}
