use mercury_types::StoredEvent;

use crate::error::StoreResult;
use crate::filter::EventFilter;

/// Append-only log of ledger events.
///
/// All implementations must satisfy these invariants:
/// - An event is durable (per the backend's durability contract) before
///   `append` returns `Ok`.
/// - Record ids are unique across the log.
/// - Appended events are never modified or removed.
/// - Damaged data is reported as an error, never silently dropped.
pub trait EventStore: Send + Sync {
    /// Persist one event and return it as stored.
    fn append(&self, event: &StoredEvent) -> StoreResult<StoredEvent>;

    /// Every event ever appended, in no guaranteed order.
    fn select_all(&self) -> StoreResult<Vec<StoredEvent>>;

    /// Up to `limit` most recently committed events matching `filter`,
    /// newest first.
    ///
    /// Default implementation scans [`Self::select_all`]. Backends may
    /// override when they keep an ordered index.
    fn query_recent(&self, limit: usize, filter: &EventFilter) -> StoreResult<Vec<StoredEvent>> {
        let mut events: Vec<StoredEvent> = self
            .select_all()?
            .into_iter()
            .filter(|event| filter.matches(event))
            .collect();
        events.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        events.truncate(limit);
        Ok(events)
    }

    /// Number of events in the log.
    fn len(&self) -> StoreResult<usize> {
        Ok(self.select_all()?.len())
    }

    /// Returns `true` if nothing has been appended yet.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}
