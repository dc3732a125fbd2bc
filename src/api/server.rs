//! Budget Lens API server
//!
//! Axum HTTP API that serves the current budget, the sales vector and the
//! derived views to a dashboard renderer.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::handlers;
use crate::layout::TemplateLayout;
use crate::session::Session;
use crate::store::SnapshotStore;

/// API Server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Snapshot directory
    pub store: PathBuf,
    /// Template layout YAML; the built-in layout when `None`
    pub layout: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            store: PathBuf::from(".budget-lens"),
            layout: None,
        }
    }
}

impl ApiConfig {
    pub fn open_session(&self) -> crate::error::BudgetResult<Session> {
        let layout = match &self.layout {
            Some(path) => TemplateLayout::from_yaml_file(path)?,
            None => TemplateLayout::default(),
        };
        Session::open(SnapshotStore::new(&self.store), layout)
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub session: RwLock<Session>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            session: RwLock::new(session),
        }
    }
}

/// All routes, with CORS and request tracing
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/api/v1/budget", get(handlers::budget))
        .route("/api/v1/import", post(handlers::import_budget))
        .route("/api/v1/sales", get(handlers::sales).put(handlers::update_sales))
        .route("/api/v1/consolidated", get(handlers::consolidated))
        .route("/api/v1/kpis", get(handlers::kpis))
        .route("/api/v1/rankings", get(handlers::rankings))
        .route("/api/v1/dashboard", get(handlers::dashboard))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "budget_lens=info,tower_http=info".into()),
        )
        .init();

    let session = config.open_session()?;
    info!(
        store = %config.store.display(),
        budget_loaded = session.budget().is_some(),
        "session opened"
    );
    let state = Arc::new(AppState::new(session));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("📊 Budget Lens API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/budget, /api/v1/import, /api/v1/sales, /api/v1/consolidated, /api/v1/kpis, /api/v1/rankings, /api/v1/dashboard");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Budget Lens API Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
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
                error!(error = %e, "failed to install SIGTERM handler");
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

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, PathBuf::from(".budget-lens"));
        assert!(config.layout.is_none());
    }

    #[test]
    fn test_config_address_format() {
        let config = ApiConfig {
            host: "192.168.1.100".to_string(),
            port: 9090,
            ..ApiConfig::default()
        };
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    #[test]
    fn test_config_opens_session() {
        let dir = TempDir::new().unwrap();
        let config = ApiConfig {
            store: dir.path().to_path_buf(),
            ..ApiConfig::default()
        };
        let session = config.open_session().unwrap();
        assert!(session.budget().is_none());
    }

    #[test]
    fn test_config_with_missing_layout_file_fails() {
        let dir = TempDir::new().unwrap();
        let config = ApiConfig {
            store: dir.path().to_path_buf(),
            layout: Some(dir.path().join("missing.yaml")),
            ..ApiConfig::default()
        };
        assert!(config.open_session().is_err());
    }

    #[test]
    fn test_app_state_version() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(
            ApiConfig {
                store: dir.path().to_path_buf(),
                ..ApiConfig::default()
            }
            .open_session()
            .unwrap(),
        );
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
    }
}
