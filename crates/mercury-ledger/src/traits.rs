use mercury_store::EventFilter;
use mercury_types::{Assets, Currency, StoredEvent, User};

use crate::error::LedgerError;
use crate::request::{BurnRequest, MintRequest, TransferRequest};

/// Write boundary: every balance change goes through one of these.
pub trait LedgerWriter: Send + Sync {
    fn transfer(&self, request: TransferRequest) -> Result<StoredEvent, LedgerError>;

    fn mint(&self, request: MintRequest) -> Result<StoredEvent, LedgerError>;

    fn burn(&self, request: BurnRequest) -> Result<StoredEvent, LedgerError>;

    /// Grant the standard stipend to `to`. Does not check any cooldown.
    fn stipend(&self, to: &User) -> Result<StoredEvent, LedgerError>;
}

/// Read boundary over the current projection and the event history.
pub trait LedgerReader: Send + Sync {
    fn balance_of(&self, user: &User) -> Result<Currency, LedgerError>;

    fn inventory_of(&self, user: &User) -> Result<Assets, LedgerError>;

    /// Commit time of the last stipend to `user`, or 0 if there was none.
    fn last_stipend_of(&self, user: &User) -> Result<u64, LedgerError>;

    /// Up to `limit` most recent events matching `filter`, newest first.
    fn recent_events(
        &self,
        limit: usize,
        filter: &EventFilter,
    ) -> Result<Vec<StoredEvent>, LedgerError>;
}
