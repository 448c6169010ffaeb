use std::collections::HashSet;

use mercury_types::{EventBody, RecordId, StoredEvent};

use crate::error::{LedgerError, Party};
use crate::projection::Projection;

/// Checks that need nothing but the event itself: a non-zero amount and
/// named parties.
pub fn check_shape(event: &EventBody) -> Result<(), LedgerError> {
    let operation = event.kind();
    if event.amount().is_zero() {
        return Err(LedgerError::InvalidAmount { operation });
    }
    if event.sender().is_some_and(|user| user.is_empty()) {
        return Err(LedgerError::MissingParty {
            operation,
            party: Party::Sender,
        });
    }
    if event.recipient().is_some_and(|user| user.is_empty()) {
        return Err(LedgerError::MissingParty {
            operation,
            party: Party::Recipient,
        });
    }
    Ok(())
}

/// Whether `event` could be committed on top of `projection`.
pub fn validate(projection: &Projection, event: &EventBody) -> Result<(), LedgerError> {
    check_shape(event)?;
    projection.plan(event).map(|_| ())
}

/// Result of auditing a full event history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub event_count: u64,
    pub applied_count: u64,
    pub violations: Vec<Violation>,
    /// State obtained by folding every event that passed.
    pub projection: Projection,
}

impl AuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A single event that breaks a ledger invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub record_id: RecordId,
    pub commit_time: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    DuplicateRecord,
    InvalidAmount,
    MissingParty,
    Overdraft,
    Overflow,
}

/// Whole-history checker.
///
/// Replay stops at the first bad event; the audit keeps going, skipping
/// each offender, so an operator sees every problem in one pass.
pub struct HistoryAudit;

impl HistoryAudit {
    pub fn audit(mut events: Vec<StoredEvent>) -> AuditReport {
        events.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        let mut projection = Projection::new();
        let mut seen = HashSet::new();
        let mut violations = Vec::new();

        for event in &events {
            if !seen.insert(event.record_id.clone()) {
                violations.push(Violation {
                    record_id: event.record_id.clone(),
                    commit_time: event.commit_time,
                    kind: ViolationKind::DuplicateRecord,
                    description: "record id appears more than once".into(),
                });
                continue;
            }

            if let Err(err) = projection.apply(event) {
                let kind = match err {
                    LedgerError::InvalidAmount { .. } => ViolationKind::InvalidAmount,
                    LedgerError::MissingParty { .. } => ViolationKind::MissingParty,
                    LedgerError::BalanceOverflow { .. } => ViolationKind::Overflow,
                    _ => ViolationKind::Overdraft,
                };
                violations.push(Violation {
                    record_id: event.record_id.clone(),
                    commit_time: event.commit_time,
                    kind,
                    description: err.to_string(),
                });
            }
        }

        AuditReport {
            event_count: events.len() as u64,
            applied_count: projection.applied(),
            violations,
            projection,
        }
    }
}
