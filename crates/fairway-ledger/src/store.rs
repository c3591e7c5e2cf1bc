//! Ledger storage seam.
//!
//! A production store maps this onto a table with a unique index on
//! `(provider, provider_payment_id)` and a balance column updated with
//! `SET balance = balance + $delta WHERE balance + $delta >= 0`.
//! [`MemoryLedgerStore`] gives the same guarantees in process.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use fairway_types::{EventStatus, FairwayError, LedgerEvent, PaymentKey, Result, UserId};
use parking_lot::RwLock;

/// Transactional ledger store.
pub trait LedgerStore: Send + Sync {
    /// Insert a new `pending` row. Returns `Ok(false)` when a row with the
    /// same key already exists; the existing row is left untouched.
    fn insert_event(&self, event: LedgerEvent) -> Result<bool>;

    /// In one store transaction: move the row from `pending` to `applied` and
    /// add its amount to the user's balance with an atomic increment.
    ///
    /// Returns `Ok(None)` if the row is not pending (someone else applied or
    /// rejected it).
    ///
    /// # Errors
    /// [`FairwayError::InsufficientBalance`] if the debit would overdraw; the
    /// row is marked `rejected`. [`FairwayError::StoreConflict`] on a
    /// transient conflict; the row stays `pending`.
    fn apply_event(&self, key: &PaymentKey) -> Result<Option<i64>>;

    fn event(&self, key: &PaymentKey) -> Option<LedgerEvent>;

    fn pending_events(&self) -> Vec<LedgerEvent>;

    /// Every row for `user`, in insertion order.
    fn events_for(&self, user: UserId) -> Vec<LedgerEvent>;

    /// Materialized balance in cents.
    fn balance(&self, user: UserId) -> i64;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn insert_event(&self, event: LedgerEvent) -> Result<bool> {
        (**self).insert_event(event)
    }

    fn apply_event(&self, key: &PaymentKey) -> Result<Option<i64>> {
        (**self).apply_event(key)
    }

    fn event(&self, key: &PaymentKey) -> Option<LedgerEvent> {
        (**self).event(key)
    }

    fn pending_events(&self) -> Vec<LedgerEvent> {
        (**self).pending_events()
    }

    fn events_for(&self, user: UserId) -> Vec<LedgerEvent> {
        (**self).events_for(user)
    }

    fn balance(&self, user: UserId) -> i64 {
        (**self).balance(user)
    }
}

#[derive(Debug, Default)]
struct Rows {
    rows: Vec<LedgerEvent>,
    by_key: HashMap<PaymentKey, usize>,
}

/// In-memory ledger store.
///
/// Rows live behind one `RwLock` (the unique index); balances are per-user
/// `AtomicI64` cells so increments never read-modify-write in application
/// code.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    rows: RwLock<Rows>,
    balances: RwLock<HashMap<UserId, Arc<AtomicI64>>>,
}

impl MemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, user: UserId) -> Arc<AtomicI64> {
        if let Some(cell) = self.balances.read().get(&user) {
            return Arc::clone(cell);
        }
        Arc::clone(self.balances.write().entry(user).or_default())
    }

    /// Total number of rows, any status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Atomic `balance += delta`, refusing to go below zero on a debit.
fn increment(cell: &AtomicI64, user: UserId, delta: i64) -> Result<i64> {
    let mut current = cell.load(Ordering::Acquire);
    loop {
        let next = current
            .checked_add(delta)
            .ok_or_else(|| FairwayError::InvalidAmount {
                amount: delta,
                reason: "balance overflow".into(),
            })?;
        if delta < 0 && next < 0 {
            return Err(FairwayError::InsufficientBalance {
                user,
                needed: -delta,
                available: current,
            });
        }
        match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return Ok(next),
            Err(actual) => current = actual,
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn insert_event(&self, event: LedgerEvent) -> Result<bool> {
        let mut rows = self.rows.write();
        if rows.by_key.contains_key(&event.key) {
            return Ok(false);
        }
        let idx = rows.rows.len();
        rows.by_key.insert(event.key.clone(), idx);
        rows.rows.push(event);
        Ok(true)
    }

    fn apply_event(&self, key: &PaymentKey) -> Result<Option<i64>> {
        let mut rows = self.rows.write();
        let idx = *rows.by_key.get(key).ok_or_else(|| {
            FairwayError::Internal(format!("ledger row {key} does not exist"))
        })?;
        let row = &mut rows.rows[idx];
        if row.status != EventStatus::Pending {
            return Ok(None);
        }
        match increment(&self.cell(row.user), row.user, row.amount) {
            Ok(balance) => {
                row.status = EventStatus::Applied;
                Ok(Some(balance))
            }
            Err(err @ FairwayError::InsufficientBalance { .. }) => {
                row.status = EventStatus::Rejected;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn event(&self, key: &PaymentKey) -> Option<LedgerEvent> {
        let rows = self.rows.read();
        rows.by_key.get(key).map(|&idx| rows.rows[idx].clone())
    }

    fn pending_events(&self) -> Vec<LedgerEvent> {
        self.rows
            .read()
            .rows
            .iter()
            .filter(|e| e.status == EventStatus::Pending)
            .cloned()
            .collect()
    }

    fn events_for(&self, user: UserId) -> Vec<LedgerEvent> {
        self.rows
            .read()
            .rows
            .iter()
            .filter(|e| e.user == user)
            .cloned()
            .collect()
    }

    fn balance(&self, user: UserId) -> i64 {
        self.balances
            .read()
            .get(&user)
            .map_or(0, |cell| cell.load(Ordering::Acquire))
    }
}
