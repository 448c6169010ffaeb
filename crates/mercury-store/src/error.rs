use mercury_types::RecordId;

/// Errors from event store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure while encoding an event.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored data failed its integrity check or could not be decoded.
    #[error("corrupt log frame at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// An event with this record id has already been appended.
    #[error("duplicate record id: {0}")]
    DuplicateRecord(RecordId),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// The backend cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if the error means stored data is damaged.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
