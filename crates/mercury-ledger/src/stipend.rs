use std::sync::Mutex;
use std::time::Duration;

use mercury_types::{StoredEvent, User};
use tracing::debug;

use crate::error::LedgerError;
use crate::traits::{LedgerReader, LedgerWriter};

/// Errors from a cooldown-checked stipend claim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StipendError {
    #[error("stipend already claimed; next claim allowed at {next_eligible_ms}")]
    CoolingDown { next_eligible_ms: u64 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Cooldown between stipend grants.
///
/// The ledger's `stipend` operation grants unconditionally; this policy is
/// what a caller puts in front of it. Claims made through the same policy
/// are serialized so two simultaneous claims cannot both pass the check.
#[derive(Debug)]
pub struct StipendPolicy {
    cooldown: Duration,
    claim_lock: Mutex<()>,
}

impl StipendPolicy {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            claim_lock: Mutex::new(()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Earliest time a user whose last stipend was at `last_stipend_ms` may
    /// claim again. A user who never claimed is eligible immediately.
    pub fn next_eligible(&self, last_stipend_ms: u64) -> u64 {
        if last_stipend_ms == 0 {
            return 0;
        }
        let cooldown_ms = u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX);
        last_stipend_ms.saturating_add(cooldown_ms)
    }

    pub fn is_due(&self, last_stipend_ms: u64, now_ms: u64) -> bool {
        now_ms >= self.next_eligible(last_stipend_ms)
    }

    /// Grant `user` a stipend if their cooldown has elapsed at `now_ms`.
    pub fn claim<L>(&self, ledger: &L, user: &User, now_ms: u64) -> Result<StoredEvent, StipendError>
    where
        L: LedgerReader + LedgerWriter + ?Sized,
    {
        let _claim = self
            .claim_lock
            .lock()
            .map_err(|_| StipendError::Ledger(LedgerError::Poisoned))?;

        let last = ledger.last_stipend_of(user)?;
        if !self.is_due(last, now_ms) {
            let next_eligible_ms = self.next_eligible(last);
            debug!(user = %user, next_eligible_ms, "stipend claim refused");
            return Err(StipendError::CoolingDown { next_eligible_ms });
        }
        Ok(ledger.stipend(user)?)
    }
}

impl Default for StipendPolicy {
    /// Twelve hours between stipends.
    fn default() -> Self {
        Self::new(Duration::from_secs(12 * 60 * 60))
    }
}
