use std::sync::Arc;

use mercury_ledger::{Ledger, StipendPolicy};
use mercury_store::FileEventStore;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::AdminTokenAuth;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Mercury economy server.
pub struct MercuryServer {
    config: ServerConfig,
    state: AppState,
}

impl MercuryServer {
    /// Open the event log named by `config` and replay it.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = FileEventStore::open(&config.data_path, config.log_config())?;
        let ledger = Ledger::open(Arc::new(store))?;
        Ok(Self::with_ledger(config, Arc::new(ledger)))
    }

    /// Serve an already-open ledger.
    pub fn with_ledger(config: ServerConfig, ledger: Arc<Ledger>) -> Self {
        let state = AppState::new(
            ledger,
            StipendPolicy::new(config.stipend_cooldown()),
            Arc::new(AdminTokenAuth::new(config.admin_token.clone())),
            config.recent_limit,
        );
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            data = %self.config.data_path.display(),
            admin_token = self.config.admin_token.is_some(),
            "Mercury server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
