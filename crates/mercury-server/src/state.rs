use std::sync::Arc;

use mercury_ledger::{Ledger, StipendPolicy};

use crate::auth::{Action, AuthProvider, Credentials, Identity};
use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub stipends: Arc<StipendPolicy>,
    pub auth: Arc<dyn AuthProvider>,
    /// Default page size for history endpoints.
    pub recent_limit: usize,
}

impl AppState {
    pub fn new(
        ledger: Arc<Ledger>,
        stipends: StipendPolicy,
        auth: Arc<dyn AuthProvider>,
        recent_limit: usize,
    ) -> Self {
        Self {
            ledger,
            stipends: Arc::new(stipends),
            auth,
            recent_limit,
        }
    }

    /// Authenticate `credentials` and check they may perform `action`.
    pub async fn require(&self, credentials: &Credentials, action: Action) -> ServerResult<Identity> {
        let identity = self.auth.authenticate(credentials).await?;
        if self.auth.authorize(&identity, action).await? {
            Ok(identity)
        } else {
            Err(ServerError::Unauthorized(format!(
                "{} may not perform {action}",
                identity.name
            )))
        }
    }
}
