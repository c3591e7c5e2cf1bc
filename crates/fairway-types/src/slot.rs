//! Head-to-head templates and slots.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  2nd seat  ┌──────┐  match decided  ┌───────────┐
//!   │ OPEN ├───────────▶│ FULL ├────────────────▶│ COMPLETED │
//!   └──┬───┘            └──┬───┘                 └───────────┘
//!      │ admin / timeout   │
//!      ▼                   ▼
//!   ┌───────────────────────┐
//!   │       CANCELLED       │
//!   └───────────────────────┘
//! ```
//!
//! "Live" is not stored: it is the contest lifecycle state of a full slot
//! whose tournament round has started.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, SlotId, TemplateId, TournamentId, UserId, constants};

/// A head-to-head contest template. Slots are spawned from it on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadTemplate {
    pub id: TemplateId,
    pub name: String,
    /// Entry fee in cents, reserved per seat.
    pub entry_fee: i64,
    pub salary_cap: i64,
}

/// Lifecycle state of a head-to-head slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Open,
    Full,
    Completed,
    Cancelled,
}

impl SlotState {
    /// Can this slot transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Full)
                | (Self::Full, Self::Completed)
                | (Self::Open | Self::Full, Self::Cancelled)
        )
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Full => write!(f, "FULL"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// An occupied seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seat {
    pub entry: EntryId,
    pub user: UserId,
}

/// A two-player pairing for a (template, tournament).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadSlot {
    pub id: SlotId,
    pub template: TemplateId,
    pub tournament: TournamentId,
    /// Unique per (template, tournament), starting at 1.
    pub sequence: u32,
    pub seats: Vec<Seat>,
    pub state: SlotState,
    pub winner: Option<EntryId>,
    pub created_at: DateTime<Utc>,
}

impl HeadToHeadSlot {
    /// A new empty, open slot.
    #[must_use]
    pub fn open(
        template: TemplateId,
        tournament: TournamentId,
        sequence: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SlotId::new(),
            template,
            tournament,
            sequence,
            seats: Vec::with_capacity(usize::from(constants::HEAD_TO_HEAD_SEATS)),
            state: SlotState::Open,
            winner: None,
            created_at: now,
        }
    }

    /// Number of occupied seats.
    #[must_use]
    pub fn current_players(&self) -> u8 {
        u8::try_from(self.seats.len()).unwrap_or(u8::MAX)
    }

    /// Open and not yet at two players.
    #[must_use]
    pub fn has_open_seat(&self) -> bool {
        self.state == SlotState::Open && self.current_players() < constants::HEAD_TO_HEAD_SEATS
    }

    /// Whether `entry` holds a seat.
    #[must_use]
    pub fn is_seated(&self, entry: EntryId) -> bool {
        self.seats.iter().any(|s| s.entry == entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_transitions() {
        assert!(SlotState::Open.can_transition_to(SlotState::Full));
        assert!(SlotState::Full.can_transition_to(SlotState::Completed));
        assert!(SlotState::Open.can_transition_to(SlotState::Cancelled));
        assert!(SlotState::Full.can_transition_to(SlotState::Cancelled));
        assert!(!SlotState::Open.can_transition_to(SlotState::Completed));
        assert!(!SlotState::Cancelled.can_transition_to(SlotState::Cancelled));
        assert!(!SlotState::Completed.can_transition_to(SlotState::Cancelled));
        assert!(!SlotState::Full.can_transition_to(SlotState::Open));
    }

    #[test]
    fn open_slot_seats() {
        let mut slot = HeadToHeadSlot::open(TemplateId::new(), TournamentId::new(), 1, Utc::now());
        assert_eq!(slot.current_players(), 0);
        assert!(slot.has_open_seat());

        let entry = EntryId::new();
        slot.seats.push(Seat {
            entry,
            user: UserId::new(),
        });
        assert!(slot.is_seated(entry));
        assert!(slot.has_open_seat());

        slot.seats.push(Seat {
            entry: EntryId::new(),
            user: UserId::new(),
        });
        assert_eq!(slot.current_players(), 2);
        assert!(!slot.has_open_seat());
    }
}
