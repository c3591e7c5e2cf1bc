//! Contest model and lifecycle states.
//!
//! The `cached_state` column on [`Contest`] is a read optimization only.
//! The lifecycle resolver is the single producer of [`ContestState`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContestId, TournamentId, constants};

/// Explicit contest format discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestFormat {
    /// Salary-capped contest with N entrants.
    Standard,
    /// Two-player contest spawned from a template on demand.
    HeadToHead,
}

impl ContestFormat {
    /// Fixed seat limit for formats that have one.
    #[must_use]
    pub fn seat_limit(self) -> Option<u32> {
        match self {
            Self::Standard => None,
            Self::HeadToHead => Some(u32::from(constants::HEAD_TO_HEAD_SEATS)),
        }
    }
}

impl fmt::Display for ContestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::HeadToHead => write!(f, "head_to_head"),
        }
    }
}

/// Lifecycle state of a contest.
///
/// Ordered in the direction time moves: `Draft < Upcoming <
/// RegistrationOpen < RegistrationClosed < Live < Completed`.
/// `Cancelled` is terminal and sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestState {
    /// Not yet published by roster management.
    Draft,
    Upcoming,
    RegistrationOpen,
    RegistrationClosed,
    Live,
    Completed,
    Cancelled,
}

impl ContestState {
    /// New entries may be submitted.
    #[must_use]
    pub fn accepts_entries(self) -> bool {
        self == Self::RegistrationOpen
    }

    /// Draft entries may still be edited (the contest has not started).
    #[must_use]
    pub fn allows_edits(self) -> bool {
        matches!(
            self,
            Self::Upcoming | Self::RegistrationOpen | Self::RegistrationClosed
        )
    }
}

impl fmt::Display for ContestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::Upcoming => write!(f, "UPCOMING"),
            Self::RegistrationOpen => write!(f, "REGISTRATION_OPEN"),
            Self::RegistrationClosed => write!(f, "REGISTRATION_CLOSED"),
            Self::Live => write!(f, "LIVE"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// The four instants that drive a contest's lifecycle.
///
/// Fields are optional because they arrive from external collaborators;
/// the resolver rejects a window with any of them missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContestWindow {
    pub reg_open: Option<DateTime<Utc>>,
    pub reg_close: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Flags set by external admin actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestFlags {
    pub cancelled: bool,
    pub published: bool,
}

impl Default for ContestFlags {
    fn default() -> Self {
        Self {
            cancelled: false,
            published: true,
        }
    }
}

/// A priced, timed competition instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub id: ContestId,
    pub tournament_id: TournamentId,
    pub format: ContestFormat,
    pub window: ContestWindow,
    #[serde(default)]
    pub flags: ContestFlags,
    /// Entry fee in cents.
    pub entry_fee: i64,
    pub salary_cap: i64,
    pub max_entrants: u32,
    /// Last resolved state. Cache only; never read as authority.
    #[serde(default)]
    pub cached_state: Option<ContestState>,
}
