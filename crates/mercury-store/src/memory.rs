use std::collections::HashSet;
use std::sync::RwLock;

use mercury_types::{RecordId, StoredEvent};

use crate::error::{StoreError, StoreResult};
use crate::filter::EventFilter;
use crate::traits::EventStore;

/// In-memory, `Vec`-backed event store.
///
/// Intended for tests and embedding. Events are held in append order behind
/// a `RwLock` for safe concurrent access and cloned on read.
pub struct InMemoryEventStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    events: Vec<StoredEvent>,
    ids: HashSet<RecordId>,
}

impl InMemoryEventStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryState::default()),
        }
    }

    /// Create a store pre-populated with `events`, e.g. a fixture history.
    pub fn with_events(events: Vec<StoredEvent>) -> StoreResult<Self> {
        let store = Self::new();
        for event in &events {
            store.append(event)?;
        }
        Ok(store)
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, event: &StoredEvent) -> StoreResult<StoredEvent> {
        let mut state = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if !state.ids.insert(event.record_id.clone()) {
            return Err(StoreError::DuplicateRecord(event.record_id.clone()));
        }
        state.events.push(event.clone());
        Ok(event.clone())
    }

    fn select_all(&self) -> StoreResult<Vec<StoredEvent>> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.events.clone())
    }

    fn query_recent(&self, limit: usize, filter: &EventFilter) -> StoreResult<Vec<StoredEvent>> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut matched: Vec<&StoredEvent> =
            state.events.iter().filter(|e| filter.matches(e)).collect();
        matched.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    fn len(&self) -> StoreResult<usize> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.events.len())
    }
}

impl std::fmt::Debug for InMemoryEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryEventStore")
            .field("event_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use mercury_types::{Burn, Currency, EventBody, Mint};

    use super::*;

    fn mint(id: &str, to: &str, time: u64) -> StoredEvent {
        StoredEvent::new(
            RecordId::from_string(id),
            time,
            EventBody::Mint(Mint {
                to: to.into(),
                amount: Currency::units(1),
                note: String::new(),
            }),
        )
    }

    fn burn(id: &str, from: &str, time: u64) -> StoredEvent {
        StoredEvent::new(
            RecordId::from_string(id),
            time,
            EventBody::Burn(Burn {
                from: from.into(),
                amount: Currency::units(1),
                note: String::new(),
                link: String::new(),
                returns: Default::default(),
            }),
        )
    }

    #[test]
    fn append_then_select_all() {
        let store = InMemoryEventStore::new();
        assert!(store.is_empty().unwrap());

        store.append(&mint("r1", "alice", 1)).unwrap();
        store.append(&burn("r2", "alice", 2)).unwrap();

        let all = store.select_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].record_id.as_str(), "r1");
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn duplicate_record_id_is_refused() {
        let store = InMemoryEventStore::new();
        store.append(&mint("r1", "alice", 1)).unwrap();
        let err = store.append(&mint("r1", "bob", 2)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRecord(id) if id.as_str() == "r1"));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn query_recent_is_newest_first_and_bounded() {
        let store = InMemoryEventStore::new();
        store.append(&mint("a", "alice", 5)).unwrap();
        store.append(&mint("b", "bob", 7)).unwrap();
        store.append(&mint("c", "alice", 7)).unwrap();
        store.append(&burn("d", "alice", 9)).unwrap();

        let recent = store.query_recent(3, &EventFilter::all()).unwrap();
        let ids: Vec<&str> = recent.iter().map(|e| e.record_id.as_str()).collect();
        assert_eq!(ids, ["d", "c", "b"]);

        let alice = store.query_recent(10, &EventFilter::involving("alice")).unwrap();
        let ids: Vec<&str> = alice.iter().map(|e| e.record_id.as_str()).collect();
        assert_eq!(ids, ["d", "c", "a"]);
    }

    #[test]
    fn with_events_seeds_history() {
        let store =
            InMemoryEventStore::with_events(vec![mint("x", "a", 1), mint("y", "b", 2)]).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }
}
