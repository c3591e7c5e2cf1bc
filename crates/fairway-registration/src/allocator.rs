//! Head-to-head matchmaking allocator.
//!
//! Pairs submitted entries two at a time into slots of a
//! (template, tournament) and records the slot on each entry. Optimistic
//! find-or-create-and-claim:
//!
//! ```text
//! loop (bounded, jittered backoff):
//!   snapshot slots ordered by sequence
//!   for each open slot with a free seat: try_claim_seat → done
//!   insert slot sequence = max + 1     ── taken ──▶ retry
//!   try_claim_seat(new slot)           ── lost ───▶ retry
//! ```
//!
//! A new slot is only created when every slot visible in the snapshot
//! refused the seat and no other caller created one since, so `N` callers
//! always end up in exactly `⌈N/2⌉` slots and no slot ever holds a third
//! player.

use std::sync::Arc;
use std::time::Duration;

use fairway_engine::registration_close;
use fairway_ledger::{LedgerApplier, LedgerStore};
use fairway_types::{
    Clock, ContestFormat, EntryId, FairwayError, HeadToHeadSlot, HeadToHeadTemplate, PaymentKey,
    RegistrationPolicy, Result, RetryPolicy, Seat, SlotId, SlotState, SystemClock, Tournament,
    constants::H2H_REFUND_PROVIDER,
};
use rand::Rng;

use crate::entry_book::EntryBook;
use crate::slot_store::SlotStore;

/// Where an entry was seated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAssignment {
    /// The slot as it looked right after the seat was taken.
    pub slot: HeadToHeadSlot,
    /// Whether this call created the slot.
    pub created: bool,
    /// Attempts used, starting at 1.
    pub attempts: u32,
}

/// Returns reserved entry fees when a slot is cancelled.
///
/// Implementations must be idempotent per `(slot, seat)`: a cancel that is
/// repeated or resumed after a crash calls this again for every seat.
pub trait FundsReleaser: Send + Sync {
    /// Refund `amount` to the seat's user. `Ok(false)` if already refunded.
    fn release(&self, slot: SlotId, seat: Seat, amount: i64) -> Result<bool>;
}

impl<S: LedgerStore> FundsReleaser for LedgerApplier<S> {
    fn release(&self, slot: SlotId, seat: Seat, amount: i64) -> Result<bool> {
        let key = PaymentKey::new(H2H_REFUND_PROVIDER, format!("{}:{}", slot.0, seat.entry.0));
        self.apply_keyed(key, amount, seat.user, "head-to-head refund")
            .map(|outcome| outcome.applied)
    }
}

/// Seats entries into head-to-head slots.
pub struct Allocator<S> {
    store: S,
    book: Arc<EntryBook>,
    releaser: Arc<dyn FundsReleaser>,
    policy: RegistrationPolicy,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl<S: SlotStore> Allocator<S> {
    #[must_use]
    pub fn new(
        store: S,
        book: Arc<EntryBook>,
        releaser: Arc<dyn FundsReleaser>,
        policy: RegistrationPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self::with_clock(store, book, releaser, policy, retry, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        store: S,
        book: Arc<EntryBook>,
        releaser: Arc<dyn FundsReleaser>,
        policy: RegistrationPolicy,
        retry: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            book,
            releaser,
            policy,
            retry,
            clock,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn book(&self) -> &EntryBook {
        &self.book
    }

    /// Seat a submitted entry in the lowest-numbered open slot, creating one
    /// if needed, and record the slot on the entry.
    ///
    /// Calling again for an entry that already holds a seat returns that
    /// seat.
    ///
    /// # Errors
    /// - [`FairwayError::RegistrationClosed`] at or after registration close
    /// - [`FairwayError::MissingTimestamp`] if the gating round has no start
    /// - [`FairwayError::EntryNotFound`], [`FairwayError::EntryNotSubmitted`]
    /// - [`FairwayError::InvalidInput`] if the entry is for another template
    ///   or tournament
    /// - [`FairwayError::AllocationConflict`] once the retry budget is spent
    pub fn allocate(
        &self,
        template: &HeadToHeadTemplate,
        tournament: &Tournament,
        entry: EntryId,
    ) -> Result<SlotAssignment> {
        let closes = registration_close(tournament, ContestFormat::HeadToHead, &self.policy)?;
        if self.clock.now() >= closes {
            return Err(FairwayError::RegistrationClosed { closed_at: closes });
        }
        let seat = self.book.seat_for(entry, template.id, tournament.id)?;

        for attempt in 1..=self.retry.max_attempts {
            if let Some(assignment) = self.try_allocate(template, tournament, seat, attempt)? {
                self.book.assign_slot(entry, assignment.slot.id, self.clock.now())?;
                tracing::info!(
                    slot = %assignment.slot.id,
                    sequence = assignment.slot.sequence,
                    entry = %seat.entry,
                    created = assignment.created,
                    attempt,
                    "Entry seated"
                );
                return Ok(assignment);
            }
            self.backoff(attempt);
        }

        tracing::warn!(
            template = %template.id,
            tournament = %tournament.id,
            entry = %seat.entry,
            attempts = self.retry.max_attempts,
            "Allocation retries exhausted"
        );
        Err(FairwayError::AllocationConflict {
            attempts: self.retry.max_attempts,
        })
    }

    /// One pass of find-or-create-and-claim. `Ok(None)` means a race was
    /// lost and the whole pass should be retried.
    fn try_allocate(
        &self,
        template: &HeadToHeadTemplate,
        tournament: &Tournament,
        seat: Seat,
        attempt: u32,
    ) -> Result<Option<SlotAssignment>> {
        let slots = self.store.snapshot(template.id, tournament.id);

        if let Some(existing) = slots.iter().find(|s| s.is_seated(seat.entry)) {
            return Ok(Some(SlotAssignment {
                slot: existing.clone(),
                created: false,
                attempts: attempt,
            }));
        }

        for open in slots.iter().filter(|s| s.has_open_seat()) {
            if let Some(slot) = self.store.try_claim_seat(open.id, seat)? {
                return Ok(Some(SlotAssignment {
                    slot,
                    created: false,
                    attempts: attempt,
                }));
            }
        }

        let sequence = slots.last().map_or(1, |s| s.sequence + 1);
        let fresh = HeadToHeadSlot::open(template.id, tournament.id, sequence, self.clock.now());
        let fresh_id = fresh.id;
        if !self.store.insert_slot(fresh)? {
            tracing::trace!(sequence, attempt, "Slot sequence taken, retrying");
            return Ok(None);
        }

        Ok(self
            .store
            .try_claim_seat(fresh_id, seat)?
            .map(|slot| SlotAssignment {
                slot,
                created: true,
                attempts: attempt,
            }))
    }

    fn backoff(&self, attempt: u32) {
        let exp = self
            .retry
            .base_backoff_micros
            .saturating_mul(1u64 << attempt.min(16));
        let ceiling = exp.min(self.retry.max_backoff_micros);
        if ceiling == 0 {
            return;
        }
        let jitter = rand::thread_rng().gen_range(0..=ceiling);
        std::thread::sleep(Duration::from_micros(jitter));
    }

    /// Record the winner of a full slot.
    ///
    /// # Errors
    /// - [`FairwayError::SlotNotFound`]
    /// - [`FairwayError::InvalidInput`] if `winner` is not seated
    /// - [`FairwayError::InvalidSlotTransition`] unless the slot is full
    pub fn complete(&self, slot: SlotId, winner: EntryId) -> Result<HeadToHeadSlot> {
        let current = self.store.get(slot).ok_or(FairwayError::SlotNotFound(slot))?;
        if !current.is_seated(winner) {
            return Err(FairwayError::InvalidInput {
                reason: format!("{winner} is not seated in {slot}"),
            });
        }
        if !self
            .store
            .transition(slot, SlotState::Full, SlotState::Completed, Some(winner))?
        {
            return Err(FairwayError::InvalidSlotTransition {
                slot,
                from: current.state,
                to: SlotState::Completed,
            });
        }
        tracing::info!(slot = %slot, winner = %winner, "Head-to-head completed");
        self.store.get(slot).ok_or(FairwayError::SlotNotFound(slot))
    }

    /// Cancel an open or full slot and refund every seat's entry fee.
    ///
    /// Returns `Ok(false)` if the slot was already cancelled. Refunds are
    /// re-issued in that case too; the releaser drops the duplicates, so a
    /// cancel that died halfway is finished by calling it again.
    ///
    /// # Errors
    /// - [`FairwayError::SlotNotFound`]
    /// - [`FairwayError::InvalidSlotTransition`] for a completed slot
    /// - [`FairwayError::AllocationConflict`] if the state kept changing
    pub fn cancel(&self, slot: SlotId, template: &HeadToHeadTemplate) -> Result<bool> {
        let mut cancelled_now = false;
        let mut attempts = 0;
        loop {
            let current = self.store.get(slot).ok_or(FairwayError::SlotNotFound(slot))?;
            match current.state {
                SlotState::Cancelled => break,
                SlotState::Completed => {
                    return Err(FairwayError::InvalidSlotTransition {
                        slot,
                        from: SlotState::Completed,
                        to: SlotState::Cancelled,
                    });
                }
                from @ (SlotState::Open | SlotState::Full) => {
                    if self
                        .store
                        .transition(slot, from, SlotState::Cancelled, None)?
                    {
                        cancelled_now = true;
                        break;
                    }
                }
            }
            attempts += 1;
            if attempts >= self.retry.max_attempts {
                return Err(FairwayError::AllocationConflict { attempts });
            }
        }

        // Seats are frozen once cancelled.
        let final_slot = self.store.get(slot).ok_or(FairwayError::SlotNotFound(slot))?;
        let mut refunded = 0usize;
        if template.entry_fee > 0 {
            for seat in &final_slot.seats {
                if self.releaser.release(slot, *seat, template.entry_fee)? {
                    refunded += 1;
                }
            }
        }
        tracing::info!(
            slot = %slot,
            seats = final_slot.seats.len(),
            refunded,
            first_cancel = cancelled_now,
            "Head-to-head cancelled"
        );
        Ok(cancelled_now)
    }
}
