use mercury_store::EventStore;
use mercury_types::StoredEvent;
use tracing::info;

use crate::error::LedgerError;
use crate::projection::Projection;

/// Deterministic replay of the event log into a projection.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Fold `events` in `(commit_time, record_id)` order, whatever order
    /// they arrive in.
    ///
    /// An event that cannot be applied (zero amount, missing party, an
    /// overdraft or an overflow) means the history itself is broken, so
    /// replay fails with [`LedgerError::CorruptEvent`] rather than skipping
    /// it.
    pub fn replay(mut events: Vec<StoredEvent>) -> Result<Projection, LedgerError> {
        events.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        let mut projection = Projection::new();
        for event in &events {
            projection
                .apply(event)
                .map_err(|err| LedgerError::CorruptEvent {
                    record: event.record_id.to_string(),
                    reason: err.to_string(),
                })?;
        }
        Ok(projection)
    }

    /// Replay everything in `store`.
    pub fn from_store<S: EventStore + ?Sized>(store: &S) -> Result<Projection, LedgerError> {
        let events = store.select_all()?;
        let projection = Self::replay(events)?;
        info!(
            applied = projection.applied(),
            total_supply = %projection.total_supply(),
            "replayed event log"
        );
        Ok(projection)
    }

    /// Whether a fresh replay of `store` reproduces `live` exactly.
    pub fn verify_convergence<S: EventStore + ?Sized>(
        store: &S,
        live: &Projection,
    ) -> Result<bool, LedgerError> {
        Ok(Self::from_store(store)? == *live)
    }
}
