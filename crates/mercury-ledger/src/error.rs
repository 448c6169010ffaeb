use std::fmt;

use mercury_store::StoreError;
use mercury_types::{Currency, EventKind, User};

/// Which side of an event a party sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Party {
    Sender,
    Recipient,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Recipient => f.write_str("recipient"),
        }
    }
}

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("{operation} must have a non-zero amount")]
    InvalidAmount { operation: EventKind },

    #[error("{operation} is missing its {party}")]
    MissingParty { operation: EventKind, party: Party },

    #[error("insufficient balance for {user}: {required} required, {available} available")]
    InsufficientBalance {
        user: User,
        required: Currency,
        available: Currency,
    },

    #[error("crediting {amount} to {user} would overflow their balance")]
    BalanceOverflow { user: User, amount: Currency },

    #[error("event store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("corrupt event {record}: {reason}")]
    CorruptEvent { record: String, reason: String },

    /// An event was committed but the projection could not be brought up
    /// to date. Not safe to retry blindly: the event is already in the log.
    #[error("projection is stale: {0}")]
    ProjectionStale(String),

    #[error("ledger state lock poisoned")]
    Poisoned,
}

impl LedgerError {
    /// Returns `true` for errors caused by the request itself. These are
    /// detected before the store is touched and are safe to retry once the
    /// input is corrected.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::MissingParty { .. }
                | Self::InsufficientBalance { .. }
                | Self::BalanceOverflow { .. }
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Corrupt { offset, reason } => Self::CorruptEvent {
                record: format!("at log offset {offset}"),
                reason,
            },
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}
