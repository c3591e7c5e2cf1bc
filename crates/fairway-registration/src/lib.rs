//! # fairway-registration
//!
//! **Stateful registration plane.**
//!
//! - [`entry_book`]: drafts, atomic pick replacement, submission, payment
//! - [`slot_store`]: the [`SlotStore`] seam for head-to-head slots
//! - [`allocator`]: concurrent-safe pairing into slots, completion and
//!   cancellation with refunds
//!
//! Time-dependent decisions go through `fairway-engine` on every call with a
//! clock reading. Nothing here trusts a stored contest state.

pub mod allocator;
pub mod entry_book;
pub mod slot_store;

pub use allocator::{Allocator, FundsReleaser, SlotAssignment};
pub use entry_book::{EntryBook, EntryContext};
pub use slot_store::{MemorySlotStore, SlotStore};
