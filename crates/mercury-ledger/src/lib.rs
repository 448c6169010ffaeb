//! Ledger engine for the Mercury economy.
//!
//! Balances are never stored directly. The engine replays the append-only
//! event log into an in-memory [`Projection`] at startup, then keeps it
//! current by running every mutation through one gateway:
//!
//! 1. validate the request against the projection,
//! 2. append the event to the store,
//! 3. apply the event to the projection.
//!
//! Mutations are serialized behind a single commit lock; reads take a
//! shared lock on the projection and never see a half-applied event.
//!
//! This crate provides:
//! - [`Ledger`] -- the mutation gateway and query surface
//! - [`LedgerReader`] / [`LedgerWriter`] trait boundaries
//! - [`ReplayEngine`] -- deterministic fold of the log into a projection
//! - [`HistoryAudit`] -- full-history check that reports every violation
//! - [`StipendPolicy`] -- caller-side cooldown for stipend grants

pub mod clock;
pub mod error;
pub mod ledger;
pub mod projection;
pub mod replay;
pub mod request;
pub mod stipend;
pub mod traits;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LedgerError, Party};
pub use ledger::Ledger;
pub use projection::{EventPosition, Projection};
pub use replay::ReplayEngine;
pub use request::{BurnRequest, MintRequest, TransferRequest};
pub use stipend::{StipendError, StipendPolicy};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{AuditReport, HistoryAudit, Violation, ViolationKind};
