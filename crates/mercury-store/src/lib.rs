//! Append-only event storage for the Mercury economy ledger.
//!
//! The store is the single source of truth: the ledger's balances are
//! only ever a projection of what the store holds. Every event is written
//! once and never modified.
//!
//! # Storage Backends
//!
//! All backends implement the [`EventStore`] trait:
//!
//! - [`InMemoryEventStore`] -- `Vec`-backed store for tests and embedding
//! - [`FileEventStore`] -- framed, CRC-checked log file on local disk
//!
//! # Design Rules
//!
//! 1. Events are immutable once appended.
//! 2. An append returns only after the event is accepted (and, for the
//!    file store with [`SyncMode::EveryWrite`], on stable storage).
//! 3. Record ids are unique; a duplicate append is refused.
//! 4. Corrupted data is reported, never skipped.

pub mod error;
pub mod file;
pub mod filter;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileEventStore, LogConfig, SyncMode};
pub use filter::EventFilter;
pub use memory::InMemoryEventStore;
pub use traits::EventStore;
