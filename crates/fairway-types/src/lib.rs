//! # fairway-types
//!
//! Shared types, errors, configuration and clock utilities for the
//! **Fairway** fantasy golf contest core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`TournamentId`], [`ContestId`], [`TemplateId`], [`SlotId`], [`EntryId`], [`PlayerId`], [`LedgerEventId`]
//! - **Tournament model**: [`Tournament`], [`Round`]
//! - **Contest model**: [`Contest`], [`ContestFormat`], [`ContestState`], [`ContestWindow`], [`ContestFlags`]
//! - **Player model**: [`Player`], [`Form`], [`Salary`]
//! - **Entry model**: [`Entry`], [`Pick`], [`Selection`], [`EntryState`], [`EntryTarget`]
//! - **Lineup results**: [`ValidationResult`], [`LineupError`], [`LineupWarning`]
//! - **Head-to-head model**: [`HeadToHeadTemplate`], [`HeadToHeadSlot`], [`SlotState`], [`Seat`]
//! - **Ledger model**: [`LedgerEvent`], [`PaymentKey`], [`EventStatus`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`], [`to_utc`]
//! - **Configuration**: [`FairwayConfig`] and its sections
//! - **Errors**: [`FairwayError`] with `FW_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod clock;
pub mod config;
pub mod constants;
pub mod contest;
pub mod entry;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod lineup;
pub mod player;
pub mod slot;
pub mod tournament;

// Re-export all primary types at crate root for ergonomic imports:
//   use fairway_types::{Contest, Entry, HeadToHeadSlot, ...};

pub use clock::*;
pub use config::*;
pub use contest::*;
pub use entry::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use lineup::*;
pub use player::*;
pub use slot::*;
pub use tournament::*;

// Constants are accessed via `fairway_types::constants::FOO`
// (not re-exported to avoid name collisions).
