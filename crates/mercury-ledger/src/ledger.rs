use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mercury_store::{EventFilter, EventStore};
use mercury_types::{Assets, Currency, EventBody, RecordId, StoredEvent, User, STIPEND_NOTE};
use tracing::{debug, error, info, warn};

use crate::clock::{next_commit_time, Clock, SystemClock};
use crate::error::LedgerError;
use crate::projection::Projection;
use crate::replay::ReplayEngine;
use crate::request::{BurnRequest, MintRequest, TransferRequest};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation;

/// The ledger engine: one authoritative projection over one event store.
///
/// Writers are serialized by `commit_lock`, which is held from validation
/// through append and apply. The projection's write lock is only taken for
/// the apply step, so readers keep running while an append is in flight
/// and never observe a half-applied event.
///
/// If a committed event cannot be applied and the rebuild from the store
/// fails as well, the projection is marked stale. Reads and commits then
/// fail with [`LedgerError::ProjectionStale`] until a later commit manages
/// to replay the store.
pub struct Ledger {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    projection: RwLock<Projection>,
    commit_lock: Mutex<()>,
    stale: AtomicBool,
}

impl Ledger {
    /// Replay `store` and start serving from the resulting projection.
    pub fn open(store: Arc<dyn EventStore>) -> Result<Self, LedgerError> {
        Self::open_with_clock(store, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let projection = ReplayEngine::from_store(store.as_ref())?;
        info!(
            events = projection.applied(),
            accounts = projection.balances().len(),
            "ledger ready"
        );
        Ok(Self {
            store,
            clock,
            projection: RwLock::new(projection),
            commit_lock: Mutex::new(()),
            stale: AtomicBool::new(false),
        })
    }

    /// Current time according to the ledger's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Up to `limit` most recent events, filtered by `predicate` after the
    /// fetch. May return fewer than `limit` events even when older matches
    /// exist.
    pub fn recent_events_matching<F>(
        &self,
        limit: usize,
        predicate: F,
    ) -> Result<Vec<StoredEvent>, LedgerError>
    where
        F: Fn(&StoredEvent) -> bool,
    {
        let recent = self.store.query_recent(limit, &EventFilter::all())?;
        Ok(recent.into_iter().filter(|event| predicate(event)).collect())
    }

    /// Sum of all balances in micro-units.
    pub fn total_supply(&self) -> Result<u128, LedgerError> {
        Ok(self.read_projection()?.total_supply())
    }

    /// Copy of the current projection.
    pub fn snapshot(&self) -> Result<Projection, LedgerError> {
        Ok(self.read_projection()?.clone())
    }

    /// Replay the store from scratch and compare with the live projection.
    pub fn verify(&self) -> Result<bool, LedgerError> {
        let _writer = self.commit_lock.lock().map_err(|_| LedgerError::Poisoned)?;
        let live = self.snapshot()?;
        ReplayEngine::verify_convergence(self.store.as_ref(), &live)
    }

    fn commit(&self, body: EventBody) -> Result<StoredEvent, LedgerError> {
        let _writer = self.commit_lock.lock().map_err(|_| LedgerError::Poisoned)?;
        self.rebuild_if_stale()?;

        let previous = {
            let projection = self.read_projection()?;
            if let Err(err) = validation::validate(&projection, &body) {
                debug!(kind = %body.kind(), error = %err, "rejected commit");
                return Err(err);
            }
            projection.head().map(|head| head.commit_time)
        };

        let event = StoredEvent::new(
            RecordId::generate(),
            next_commit_time(self.clock.as_ref(), previous),
            body,
        );
        let stored = self.store.append(&event).map_err(|err| {
            warn!(record = %event.record_id, error = %err, "event store refused append");
            LedgerError::StoreUnavailable(err.to_string())
        })?;

        let mut projection = self.write_projection()?;
        if let Err(err) = projection.apply(&stored) {
            error!(
                record = %stored.record_id,
                error = %err,
                "committed event did not apply; rebuilding projection from store"
            );
            match ReplayEngine::from_store(self.store.as_ref()) {
                Ok(rebuilt) => *projection = rebuilt,
                Err(rebuild) => {
                    // Set under the write guard so no reader slips in between.
                    self.stale.store(true, Ordering::SeqCst);
                    error!(
                        record = %stored.record_id,
                        error = %rebuild,
                        "projection rebuild failed; refusing requests until replay succeeds"
                    );
                    return Err(LedgerError::ProjectionStale(format!(
                        "{} was committed but not applied: {rebuild}",
                        stored.record_id
                    )));
                }
            }
        }
        debug!(
            record = %stored.record_id,
            kind = %stored.kind(),
            amount = %stored.event.amount(),
            commit_time = stored.commit_time,
            "committed event"
        );
        Ok(stored)
    }

    /// Replay the store if an earlier rebuild failed. Caller holds the
    /// commit lock.
    fn rebuild_if_stale(&self) -> Result<(), LedgerError> {
        if !self.stale.load(Ordering::SeqCst) {
            return Ok(());
        }
        let rebuilt = ReplayEngine::from_store(self.store.as_ref())
            .map_err(|err| LedgerError::ProjectionStale(err.to_string()))?;
        let mut projection = self.projection.write().map_err(|_| LedgerError::Poisoned)?;
        *projection = rebuilt;
        self.stale.store(false, Ordering::SeqCst);
        info!(events = projection.applied(), "projection rebuilt from store");
        Ok(())
    }

    fn read_projection(&self) -> Result<RwLockReadGuard<'_, Projection>, LedgerError> {
        let projection = self.projection.read().map_err(|_| LedgerError::Poisoned)?;
        if self.stale.load(Ordering::SeqCst) {
            return Err(LedgerError::ProjectionStale(
                "waiting for a successful replay".into(),
            ));
        }
        Ok(projection)
    }

    fn write_projection(&self) -> Result<RwLockWriteGuard<'_, Projection>, LedgerError> {
        self.projection.write().map_err(|_| LedgerError::Poisoned)
    }
}

impl LedgerWriter for Ledger {
    fn transfer(&self, request: TransferRequest) -> Result<StoredEvent, LedgerError> {
        self.commit(request.into())
    }

    fn mint(&self, request: MintRequest) -> Result<StoredEvent, LedgerError> {
        self.commit(request.into())
    }

    fn burn(&self, request: BurnRequest) -> Result<StoredEvent, LedgerError> {
        self.commit(request.into())
    }

    fn stipend(&self, to: &User) -> Result<StoredEvent, LedgerError> {
        self.mint(MintRequest::new(to.clone(), Currency::STIPEND, STIPEND_NOTE))
    }
}

impl LedgerReader for Ledger {
    fn balance_of(&self, user: &User) -> Result<Currency, LedgerError> {
        Ok(self.read_projection()?.balance_of(user))
    }

    fn inventory_of(&self, user: &User) -> Result<Assets, LedgerError> {
        Ok(self.read_projection()?.inventory_of(user))
    }

    fn last_stipend_of(&self, user: &User) -> Result<u64, LedgerError> {
        Ok(self.read_projection()?.last_stipend_of(user))
    }

    fn recent_events(
        &self,
        limit: usize,
        filter: &EventFilter,
    ) -> Result<Vec<StoredEvent>, LedgerError> {
        Ok(self.store.query_recent(limit, filter)?)
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let applied = self.read_projection().map(|p| p.applied()).unwrap_or_default();
        f.debug_struct("Ledger").field("applied", &applied).finish()
    }
}
