//! Ledger event model.
//!
//! The ledger is append-only. A user's balance is the fold of their applied
//! events; stores keep a materialized balance for reads, updated only by
//! atomic increments.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerEventId, UserId};

/// Idempotency key: `(provider, provider_payment_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PaymentKey {
    pub provider: String,
    pub provider_payment_id: String,
}

impl PaymentKey {
    #[must_use]
    pub fn new(provider: impl Into<String>, provider_payment_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            provider_payment_id: provider_payment_id.into(),
        }
    }

    /// The ledger row id this key always maps to.
    #[must_use]
    pub fn event_id(&self) -> LedgerEventId {
        LedgerEventId::deterministic(&self.provider, &self.provider_payment_id)
    }
}

impl fmt::Display for PaymentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.provider_payment_id)
    }
}

/// Whether a ledger row's balance delta has landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Row recorded, balance increment not yet confirmed.
    Pending,
    /// Balance increment applied exactly once.
    Applied,
    /// Debit refused because it would overdraw; never counted.
    Rejected,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Applied => write!(f, "APPLIED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: LedgerEventId,
    pub key: PaymentKey,
    /// Signed change in cents.
    pub amount: i64,
    pub user: UserId,
    pub reason: String,
    pub status: EventStatus,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEvent {
    /// A new pending row for `key`.
    #[must_use]
    pub fn pending(
        key: PaymentKey,
        amount: i64,
        user: UserId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: key.event_id(),
            key,
            amount,
            user,
            reason: reason.into(),
            status: EventStatus::Pending,
            recorded_at: now,
        }
    }
}
