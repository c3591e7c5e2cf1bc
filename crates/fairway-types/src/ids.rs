//! Globally unique identifiers used throughout Fairway.
//!
//! Entity IDs use UUIDv7 for time-ordered lexicographic sorting, except
//! [`LedgerEventId`], which is derived from the external idempotency key so
//! that the same payment event always maps to the same ledger row.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an authenticated user / wallet owner.
    UserId,
    "user:"
);

uuid_id!(
    /// Tournament identifier, owned by roster management.
    TournamentId,
    "tournament:"
);

uuid_id!(
    /// A priced, timed contest instance (standard format).
    ContestId,
    "contest:"
);

uuid_id!(
    /// A head-to-head contest template from which slots are spawned.
    TemplateId,
    "template:"
);

uuid_id!(
    /// A single two-player head-to-head pairing.
    SlotId,
    "slot:"
);

uuid_id!(
    /// A user's entry (lineup) into a contest or slot.
    EntryId,
    "entry:"
);

uuid_id!(
    /// A golfer.
    PlayerId,
    "player:"
);

// ---------------------------------------------------------------------------
// LedgerEventId
// ---------------------------------------------------------------------------

/// Ledger row identifier, derived from `(provider, provider_payment_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LedgerEventId(pub Uuid);

impl LedgerEventId {
    /// Deterministic id for an idempotency key. Replays of the same external
    /// event produce the same id on every node and every delivery.
    #[must_use]
    pub fn deterministic(provider: &str, provider_payment_id: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"fairway:ledger_event:v1:");
        hasher.update((provider.len() as u64).to_le_bytes());
        hasher.update(provider.as_bytes());
        hasher.update(provider_payment_id.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// First eight hex characters, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl fmt::Display for LedgerEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ledger:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
