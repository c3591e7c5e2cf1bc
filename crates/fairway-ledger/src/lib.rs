//! # fairway-ledger
//!
//! **Wallet ledger with exactly-once application.**
//!
//! - [`store`]: the [`LedgerStore`] seam (unique key + atomic increment) and
//!   an in-memory implementation
//! - [`applier`]: [`LedgerApplier`], the only writer of balances
//!
//! Balances are never written by callers. They move only when a uniquely
//! keyed row is applied, so the fold of applied rows always equals the
//! stored balance.

pub mod applier;
pub mod store;

pub use applier::{ApplyOutcome, LedgerApplier, ReconcileReport};
pub use store::{LedgerStore, MemoryLedgerStore};
