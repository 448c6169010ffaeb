//! Foundation types for the Mercury economy ledger.
//!
//! Every other Mercury crate depends on `mercury-types`. It defines the
//! account, currency, and asset vocabulary plus the event schema that the
//! append-only ledger log is made of.
//!
//! # Key Types
//!
//! - [`User`] — Opaque account identifier; any string is an account
//! - [`Currency`] — Amount in micro-units (1 unit = 1,000,000 micro)
//! - [`Assets`] — Per-user asset quantities (carried, never applied)
//! - [`EventBody`] — Tagged transfer / mint / burn payload
//! - [`StoredEvent`] — An event as committed: record id, commit time, body
//! - [`LegacyRecord`] — Decoder for the older implicit-discriminant records

pub mod asset;
pub mod currency;
pub mod error;
pub mod event;
pub mod identity;
pub mod legacy;

pub use asset::{Asset, Assets};
pub use currency::{Currency, BASICALLY_INFINITE};
pub use error::TypeError;
pub use event::{Burn, EventBody, EventKind, Mint, StoredEvent, Transfer, STIPEND_NOTE};
pub use identity::{RecordId, User};
pub use legacy::LegacyRecord;
