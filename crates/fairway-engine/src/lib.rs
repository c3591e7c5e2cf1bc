//! # fairway-engine
//!
//! **Pure contest engines for Fairway.**
//!
//! Everything here is a function of its inputs:
//!
//! - **Zero side effects**: no stores, no clocks, no shared mutable state
//! - **Deterministic output**: `Decimal` arithmetic, same input → same output
//! - **Safe for any number of concurrent readers**: call on every read
//!   instead of caching
//!
//! Modules:
//! - [`schedule`]: the single home of registration-close derivation
//! - [`lifecycle`]: contest state from time windows
//! - [`pricing`]: ranking → salary, with cheapest-lineup rescaling
//! - [`lineup`]: lineup validation against a salary cap

pub mod lifecycle;
pub mod lineup;
pub mod pricing;
pub mod schedule;

pub use lifecycle::{CacheRefresh, refresh_cached_state, resolve_contest, resolve_state};
pub use lineup::{per_pick_limit, validate_lineup};
pub use pricing::{PricingEngine, SalaryReport, SalaryStats, apply_report};
pub use schedule::{
    ResolvedWindow, derive_window, gating_start, registration_close, verify_window,
};
