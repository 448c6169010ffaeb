use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid currency amount: {0}")]
    InvalidAmount(String),

    #[error("legacy record {position} is malformed: {reason}")]
    LegacyRecord { position: usize, reason: String },
}
