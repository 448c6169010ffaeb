use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mercury_ledger::{LedgerError, StipendError};
use mercury_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("stipend not due until {next_eligible_ms}")]
    CoolingDown { next_eligible_ms: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<StipendError> for ServerError {
    fn from(error: StipendError) -> Self {
        match error {
            StipendError::CoolingDown { next_eligible_ms } => Self::CoolingDown { next_eligible_ms },
            StipendError::Ledger(err) => Self::Ledger(err),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(err) if err.is_client_fault() => StatusCode::BAD_REQUEST,
            Self::Ledger(LedgerError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CoolingDown { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Store(err) if err.is_corruption() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        if let Self::CoolingDown { next_eligible_ms } = self {
            body["next_eligible_ms"] = next_eligible_ms.into();
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use mercury_types::{Currency, EventKind};

    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                ServerError::from(LedgerError::InvalidAmount {
                    operation: EventKind::Mint,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::from(LedgerError::InsufficientBalance {
                    user: "alice".into(),
                    required: Currency::UNIT,
                    available: Currency::ZERO,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::from(LedgerError::StoreUnavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServerError::from(LedgerError::Poisoned),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServerError::from(LedgerError::ProjectionStale("replay failed".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServerError::from(StipendError::CoolingDown {
                    next_eligible_ms: 5,
                }),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ServerError::Unauthorized("no token".into()),
                StatusCode::UNAUTHORIZED,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn response_carries_status() {
        let response = ServerError::CoolingDown {
            next_eligible_ms: 1,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
