//! Entry (lineup) model.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────┐  submit   ┌───────────┐  charge ok  ┌──────┐
//!   │ DRAFT ├──────────▶│ SUBMITTED ├────────────▶│ PAID │
//!   └───────┘           └───────────┘             └──────┘
//! ```
//!
//! Transitions are one-way. Picks may only change while `DRAFT`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContestId, EntryId, PlayerId, Salary, SlotId, TemplateId, TournamentId, UserId};

/// Lifecycle state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Draft,
    Submitted,
    Paid,
}

impl EntryState {
    /// Can this entry transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Submitted) | (Self::Submitted, Self::Paid)
        )
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Paid => write!(f, "PAID"),
        }
    }
}

/// What an entry is competing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryTarget {
    Contest { contest: ContestId },
    HeadToHead { template: TemplateId, tournament: TournamentId },
}

/// One selected player, with the salary frozen at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub player: PlayerId,
    /// Position within the entry, unique per entry.
    pub slot: u8,
    pub salary_at_selection: Salary,
}

/// A requested pick before salaries are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub player: PlayerId,
    pub slot: u8,
}

/// A user's entry into a contest or head-to-head template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub user: UserId,
    pub target: EntryTarget,
    pub picks: Vec<Pick>,
    pub captain: Option<PlayerId>,
    pub state: EntryState,
    /// Head-to-head slot the entry was seated in, once matched.
    #[serde(default)]
    pub slot: Option<SlotId>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// A fresh draft with no picks.
    #[must_use]
    pub fn draft(user: UserId, target: EntryTarget, now: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            user,
            target,
            picks: Vec::new(),
            captain: None,
            state: EntryState::Draft,
            slot: None,
            updated_at: now,
        }
    }

    /// Sum of the frozen pick salaries.
    #[must_use]
    pub fn total_salary(&self) -> Salary {
        self.picks.iter().map(|p| p.salary_at_selection).sum()
    }

    /// Frozen salary for `player`, if already picked.
    #[must_use]
    pub fn frozen_salary(&self, player: PlayerId) -> Option<Salary> {
        self.picks
            .iter()
            .find(|p| p.player == player)
            .map(|p| p.salary_at_selection)
    }
}
