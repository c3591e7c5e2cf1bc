//! Head-to-head slot storage seam.
//!
//! The allocator is optimistic and relies on two store guarantees:
//!
//! 1. `insert_slot` enforces a unique `(template, tournament, sequence)`.
//! 2. `try_claim_seat` is a conditional update
//!    (`WHERE current_players < 2 AND state = 'open'`) that either seats the
//!    entry or reports zero rows affected.

use std::collections::{HashMap, HashSet};

use fairway_types::{
    EntryId, FairwayError, HeadToHeadSlot, Result, Seat, SlotId, SlotState, TemplateId,
    TournamentId, constants::HEAD_TO_HEAD_SEATS,
};
use parking_lot::RwLock;

/// Transactional slot store.
pub trait SlotStore: Send + Sync {
    /// All slots for the pair, ordered by sequence.
    fn snapshot(&self, template: TemplateId, tournament: TournamentId) -> Vec<HeadToHeadSlot>;

    /// Insert a new slot. `Ok(false)` if its sequence is already taken.
    fn insert_slot(&self, slot: HeadToHeadSlot) -> Result<bool>;

    /// Seat `seat` if the slot is open with a free seat, flipping it to
    /// `Full` when the second seat is taken.
    ///
    /// Returns the updated slot, or `Ok(None)` if nothing was changed. A seat
    /// the entry already holds counts as claimed.
    ///
    /// # Errors
    /// [`FairwayError::SlotNotFound`] for an unknown slot.
    fn try_claim_seat(&self, slot: SlotId, seat: Seat) -> Result<Option<HeadToHeadSlot>>;

    /// Conditional `expected → to`, recording `winner` if given.
    /// `Ok(false)` when the slot was not in `expected`.
    fn transition(
        &self,
        slot: SlotId,
        expected: SlotState,
        to: SlotState,
        winner: Option<EntryId>,
    ) -> Result<bool>;

    fn get(&self, slot: SlotId) -> Option<HeadToHeadSlot>;
}

#[derive(Debug, Default)]
struct Slots {
    by_id: HashMap<SlotId, HeadToHeadSlot>,
    sequences: HashSet<(TemplateId, TournamentId, u32)>,
}

/// In-memory [`SlotStore`]. Every operation is one short critical section.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    inner: RwLock<Slots>,
}

impl MemorySlotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn snapshot(&self, template: TemplateId, tournament: TournamentId) -> Vec<HeadToHeadSlot> {
        let mut slots: Vec<_> = self
            .inner
            .read()
            .by_id
            .values()
            .filter(|s| s.template == template && s.tournament == tournament)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.sequence);
        slots
    }

    fn insert_slot(&self, slot: HeadToHeadSlot) -> Result<bool> {
        let mut inner = self.inner.write();
        if !inner
            .sequences
            .insert((slot.template, slot.tournament, slot.sequence))
        {
            return Ok(false);
        }
        inner.by_id.insert(slot.id, slot);
        Ok(true)
    }

    fn try_claim_seat(&self, slot: SlotId, seat: Seat) -> Result<Option<HeadToHeadSlot>> {
        let mut inner = self.inner.write();
        let row = inner
            .by_id
            .get_mut(&slot)
            .ok_or(FairwayError::SlotNotFound(slot))?;
        if row.is_seated(seat.entry) {
            return Ok(Some(row.clone()));
        }
        if !row.has_open_seat() {
            return Ok(None);
        }
        row.seats.push(seat);
        if row.current_players() >= HEAD_TO_HEAD_SEATS {
            row.state = SlotState::Full;
        }
        Ok(Some(row.clone()))
    }

    fn transition(
        &self,
        slot: SlotId,
        expected: SlotState,
        to: SlotState,
        winner: Option<EntryId>,
    ) -> Result<bool> {
        let mut inner = self.inner.write();
        let row = inner
            .by_id
            .get_mut(&slot)
            .ok_or(FairwayError::SlotNotFound(slot))?;
        if row.state != expected {
            return Ok(false);
        }
        if !expected.can_transition_to(to) {
            return Err(FairwayError::InvalidSlotTransition {
                slot,
                from: expected,
                to,
            });
        }
        row.state = to;
        if winner.is_some() {
            row.winner = winner;
        }
        Ok(true)
    }

    fn get(&self, slot: SlotId) -> Option<HeadToHeadSlot> {
        self.inner.read().by_id.get(&slot).cloned()
    }
}
