use std::collections::BTreeMap;

use mercury_types::{Assets, Currency, EventBody, RecordId, StoredEvent, User};

use crate::error::LedgerError;
use crate::validation;

/// Position of the last event folded into a projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventPosition {
    pub commit_time: u64,
    pub record_id: RecordId,
}

impl From<&StoredEvent> for EventPosition {
    fn from(event: &StoredEvent) -> Self {
        Self {
            commit_time: event.commit_time,
            record_id: event.record_id.clone(),
        }
    }
}

/// Derived view of the ledger: what everybody holds right now.
///
/// A projection is only ever built by folding committed events in
/// `(commit_time, record_id)` order. All maps are ordered so that two
/// projections built from the same history compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    balances: BTreeMap<User, Currency>,
    inventories: BTreeMap<User, Assets>,
    last_stipend: BTreeMap<User, u64>,
    head: Option<EventPosition>,
    applied: u64,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `user`; zero for accounts never touched.
    pub fn balance_of(&self, user: &User) -> Currency {
        self.balances.get(user).copied().unwrap_or_default()
    }

    pub fn inventory_of(&self, user: &User) -> Assets {
        self.inventories.get(user).cloned().unwrap_or_default()
    }

    /// Commit time of the most recent stipend to `user`, or 0 if none.
    pub fn last_stipend_of(&self, user: &User) -> u64 {
        self.last_stipend.get(user).copied().unwrap_or_default()
    }

    pub fn balances(&self) -> &BTreeMap<User, Currency> {
        &self.balances
    }

    /// Sum of all balances, in micro-units.
    pub fn total_supply(&self) -> u128 {
        self.balances
            .values()
            .map(|balance| u128::from(balance.micros()))
            .sum()
    }

    pub fn head(&self) -> Option<&EventPosition> {
        self.head.as_ref()
    }

    /// Number of events folded in so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Fold one committed event into the projection.
    ///
    /// Either every balance the event touches is updated or none is: the
    /// new balances are computed and checked before anything is written.
    pub fn apply(&mut self, event: &StoredEvent) -> Result<(), LedgerError> {
        validation::check_shape(&event.event)?;
        let updates = self.plan(&event.event)?;
        for (user, balance) in updates {
            self.balances.insert(user, balance);
        }
        if let EventBody::Mint(mint) = &event.event {
            if mint.is_stipend() {
                self.last_stipend.insert(mint.to.clone(), event.commit_time);
            }
        }
        self.head = Some(EventPosition::from(event));
        self.applied += 1;
        Ok(())
    }

    /// New balances `event` would produce, or the reason it cannot apply.
    pub(crate) fn plan(&self, event: &EventBody) -> Result<Vec<(User, Currency)>, LedgerError> {
        match event {
            EventBody::Transfer(t) => {
                let debited = self.debit(&t.from, t.amount)?;
                // A self-transfer credits the already-debited balance.
                let before_credit = if t.to == t.from {
                    debited
                } else {
                    self.balance_of(&t.to)
                };
                let credited = credit(&t.to, before_credit, t.amount)?;
                Ok(vec![(t.from.clone(), debited), (t.to.clone(), credited)])
            }
            EventBody::Mint(m) => {
                let credited = credit(&m.to, self.balance_of(&m.to), m.amount)?;
                Ok(vec![(m.to.clone(), credited)])
            }
            EventBody::Burn(b) => Ok(vec![(b.from.clone(), self.debit(&b.from, b.amount)?)]),
        }
    }

    fn debit(&self, user: &User, amount: Currency) -> Result<Currency, LedgerError> {
        let available = self.balance_of(user);
        available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                user: user.clone(),
                required: amount,
                available,
            })
    }
}

fn credit(user: &User, balance: Currency, amount: Currency) -> Result<Currency, LedgerError> {
    balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::BalanceOverflow {
            user: user.clone(),
            amount,
        })
}
