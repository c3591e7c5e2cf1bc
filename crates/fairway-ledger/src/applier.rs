//! Ledger applier: exactly-once balance changes.
//!
//! Flow for every balance change:
//!
//! ```text
//! insert_event(key)  ── duplicate ──▶ applied = false (success)
//!        │
//!        ▼
//! apply_event(key)   ── conflict ──▶ retry, then leave pending
//!        │                              └──▶ reconcile_pending()
//!        ▼
//!     applied
//! ```
//!
//! The key is the idempotency contract: replaying the same external payment
//! any number of times changes the balance by its amount exactly once.

use std::sync::Arc;

use fairway_types::{
    Clock, EventStatus, FairwayError, LedgerConfig, LedgerEvent, LedgerEventId, PaymentKey,
    Result, SystemClock, UserId, constants::INTERNAL_PROVIDER,
};
use uuid::Uuid;

use crate::store::LedgerStore;

/// Result of applying a keyed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// `false` when the key had already been recorded.
    pub applied: bool,
    pub event_id: LedgerEventId,
    /// Balance right after this change, when it was applied now.
    pub balance: Option<i64>,
}

/// What a [`LedgerApplier::reconcile_pending`] sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub applied: usize,
    pub rejected: usize,
    pub still_pending: usize,
}

/// Applies payments and internal deltas to a [`LedgerStore`].
pub struct LedgerApplier<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl<S: LedgerStore> LedgerApplier<S> {
    #[must_use]
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(store: S, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply a payment confirmed by an external provider.
    ///
    /// A replay of an already-recorded `(provider, payment_id)` returns
    /// `applied = false` without touching the balance.
    ///
    /// # Errors
    /// - [`FairwayError::InvalidInput`] for an empty provider or payment id
    /// - [`FairwayError::InvalidAmount`] for a zero amount
    /// - [`FairwayError::InsufficientBalance`] for a debit that would overdraw
    /// - [`FairwayError::StoreConflict`] if the increment kept conflicting;
    ///   the row stays pending for [`Self::reconcile_pending`]
    pub fn apply_external_payment(
        &self,
        provider: &str,
        payment_id: &str,
        amount_cents: i64,
        user: UserId,
    ) -> Result<ApplyOutcome> {
        if provider.trim().is_empty() || payment_id.trim().is_empty() {
            return Err(FairwayError::InvalidInput {
                reason: "provider and payment id must be non-empty".into(),
            });
        }
        self.apply_keyed(
            PaymentKey::new(provider, payment_id),
            amount_cents,
            user,
            "external payment",
        )
    }

    /// Apply `amount` under an explicit idempotency key.
    ///
    /// # Errors
    /// Same as [`Self::apply_external_payment`].
    pub fn apply_keyed(
        &self,
        key: PaymentKey,
        amount: i64,
        user: UserId,
        reason: &str,
    ) -> Result<ApplyOutcome> {
        if amount == 0 {
            return Err(FairwayError::InvalidAmount {
                amount,
                reason: "ledger changes must be non-zero".into(),
            });
        }

        let event = LedgerEvent::pending(key.clone(), amount, user, reason, self.clock.now());
        let event_id = event.id;
        if !self.store.insert_event(event)? {
            tracing::info!(
                key = %key,
                event = %event_id.short(),
                "Duplicate payment ignored"
            );
            return Ok(ApplyOutcome {
                applied: false,
                event_id,
                balance: None,
            });
        }

        let balance = self.apply_with_retry(&key)?;
        tracing::info!(
            key = %key,
            user = %user,
            amount,
            balance = ?balance,
            "Ledger event applied"
        );
        Ok(ApplyOutcome {
            applied: true,
            event_id,
            balance,
        })
    }

    /// Append an internal change and return the new balance.
    ///
    /// # Errors
    /// [`FairwayError::InvalidAmount`] for zero,
    /// [`FairwayError::InsufficientBalance`] if a debit would overdraw.
    pub fn apply_delta(&self, user: UserId, change_cents: i64, reason: &str) -> Result<i64> {
        let key = PaymentKey::new(INTERNAL_PROVIDER, Uuid::now_v7().to_string());
        let outcome = self.apply_keyed(key, change_cents, user, reason)?;
        Ok(outcome
            .balance
            .unwrap_or_else(|| self.store.balance(user)))
    }

    fn apply_with_retry(&self, key: &PaymentKey) -> Result<Option<i64>> {
        let mut last = None;
        for attempt in 1..=self.config.max_apply_attempts {
            match self.store.apply_event(key) {
                Ok(balance) => return Ok(balance),
                Err(err) if err.is_retryable() => {
                    tracing::warn!(key = %key, attempt, error = %err, "Ledger apply conflict");
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last.unwrap_or_else(|| FairwayError::StoreConflict {
            reason: format!("no apply attempts configured for {key}"),
        }))
    }

    /// Apply every row that was recorded but never applied.
    ///
    /// # Errors
    /// Only non-retryable store failures abort the sweep. Overdrafts count as
    /// rejected and conflicts as still pending.
    pub fn reconcile_pending(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        for event in self.store.pending_events() {
            match self.store.apply_event(&event.key) {
                Ok(Some(_)) => report.applied += 1,
                Ok(None) => {}
                Err(FairwayError::InsufficientBalance { .. }) => report.rejected += 1,
                Err(err) if err.is_retryable() => report.still_pending += 1,
                Err(err) => return Err(err),
            }
        }
        if report != ReconcileReport::default() {
            tracing::info!(
                applied = report.applied,
                rejected = report.rejected,
                still_pending = report.still_pending,
                "Ledger reconciliation pass"
            );
        }
        Ok(report)
    }

    /// Materialized balance.
    #[must_use]
    pub fn balance(&self, user: UserId) -> i64 {
        self.store.balance(user)
    }

    /// Balance recomputed by folding the user's applied events.
    #[must_use]
    pub fn fold_balance(&self, user: UserId) -> i64 {
        self.store
            .events_for(user)
            .iter()
            .filter(|e| e.status == EventStatus::Applied)
            .map(|e| e.amount)
            .sum()
    }

    /// Check the materialized balance against the fold.
    ///
    /// # Errors
    /// [`FairwayError::Internal`] if they disagree.
    pub fn verify_balance(&self, user: UserId) -> Result<i64> {
        let stored = self.balance(user);
        let folded = self.fold_balance(user);
        if stored != folded {
            tracing::error!(user = %user, stored, folded, "Ledger balance drift");
            return Err(FairwayError::Internal(format!(
                "balance drift for {user}: stored {stored}, folded {folded}"
            )));
        }
        Ok(stored)
    }
}
