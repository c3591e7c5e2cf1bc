//! Error types for the Fairway contest core.
//!
//! All errors use the `FW_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by taxonomy:
//! - 1xx: Validation errors (user-fixable input)
//! - 2xx: State errors (wrong lifecycle window or entity state)
//! - 3xx: Conflict errors (concurrent races; retry transparently)
//! - 4xx: Config errors (missing or invalid data handed to the core)
//! - 5xx: Not found
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{ContestState, EntryId, EntryState, LineupError, PlayerId, SlotId, SlotState, UserId};

/// The error taxonomy callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    State,
    Conflict,
    Config,
    NotFound,
    Internal,
}

/// Central error enum for all Fairway operations.
#[derive(Debug, Error)]
pub enum FairwayError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The lineup failed validation at the submit boundary.
    #[error("FW_ERR_100: Lineup rejected with {} error(s)", errors.len())]
    LineupRejected { errors: Vec<LineupError> },

    /// A money amount was zero, negative or otherwise unusable.
    #[error("FW_ERR_101: Invalid amount: {amount} ({reason})")]
    InvalidAmount { amount: i64, reason: String },

    /// A generic malformed input.
    #[error("FW_ERR_102: Invalid input: {reason}")]
    InvalidInput { reason: String },

    // =================================================================
    // State Errors (2xx)
    // =================================================================
    /// Registration for this contest or template has closed.
    #[error("FW_ERR_200: Registration closed at {closed_at}")]
    RegistrationClosed { closed_at: DateTime<Utc> },

    /// The contest is not in a state that accepts this operation.
    #[error("FW_ERR_201: Contest is {state}, operation not allowed")]
    ContestNotOpen { state: ContestState },

    /// The entry can only be edited while it is a draft.
    #[error("FW_ERR_202: Entry {entry} is {state}, not DRAFT")]
    EntryNotDraft { entry: EntryId, state: EntryState },

    /// An illegal entry state transition was requested.
    #[error("FW_ERR_203: Entry {entry} cannot move from {from} to {to}")]
    InvalidEntryTransition {
        entry: EntryId,
        from: EntryState,
        to: EntryState,
    },

    /// The contest already holds its maximum number of entries.
    #[error("FW_ERR_204: Entry limit of {max_entrants} reached")]
    ContestFull { max_entrants: u32 },

    /// An illegal slot state transition was requested.
    #[error("FW_ERR_205: Slot {slot} cannot move from {from} to {to}")]
    InvalidSlotTransition {
        slot: SlotId,
        from: SlotState,
        to: SlotState,
    },

    /// Debit would overdraw the user's balance.
    #[error("FW_ERR_206: Insufficient balance for {user}: need {needed}, have {available}")]
    InsufficientBalance {
        user: UserId,
        needed: i64,
        available: i64,
    },

    /// Only submitted or paid entries take part in matchmaking.
    #[error("FW_ERR_207: Entry {entry} is {state}, not yet submitted")]
    EntryNotSubmitted { entry: EntryId, state: EntryState },

    // =================================================================
    // Conflict Errors (3xx)
    // =================================================================
    /// Allocation kept losing races and exhausted its retry budget.
    #[error("FW_ERR_300: Allocation conflict after {attempts} attempts")]
    AllocationConflict { attempts: u32 },

    /// A store-level uniqueness or conditional-update conflict.
    #[error("FW_ERR_301: Store conflict: {reason}")]
    StoreConflict { reason: String },

    // =================================================================
    // Config Errors (4xx)
    // =================================================================
    /// A required timestamp was absent. Never defaulted.
    #[error("FW_ERR_400: Missing timestamp: {field}")]
    MissingTimestamp { field: &'static str },

    /// Timestamps are present but out of order.
    #[error("FW_ERR_401: Invalid contest window: {reason}")]
    InvalidWindow { reason: String },

    /// A player was selected before a salary was computed for them.
    #[error("FW_ERR_402: No salary computed for {0}")]
    MissingSalary(PlayerId),

    /// Configuration error (invalid config file, nonsense values, etc.).
    #[error("FW_ERR_403: Configuration error: {0}")]
    Configuration(String),

    /// Ranking data handed over by the ranking sync is unusable.
    #[error("FW_ERR_404: Invalid ranking {ranking} for {player}")]
    InvalidRanking { player: PlayerId, ranking: u32 },

    // =================================================================
    // Not Found (5xx)
    // =================================================================
    #[error("FW_ERR_500: Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("FW_ERR_501: Slot not found: {0}")]
    SlotNotFound(SlotId),

    #[error("FW_ERR_502: Player not found: {0}")]
    PlayerNotFound(PlayerId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FW_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("FW_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (disk, network).
    #[error("FW_ERR_903: I/O error: {0}")]
    Io(String),
}

impl FairwayError {
    /// Taxonomy bucket for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LineupRejected { .. }
            | Self::InvalidAmount { .. }
            | Self::InvalidInput { .. } => ErrorKind::Validation,
            Self::RegistrationClosed { .. }
            | Self::ContestNotOpen { .. }
            | Self::EntryNotDraft { .. }
            | Self::InvalidEntryTransition { .. }
            | Self::ContestFull { .. }
            | Self::InvalidSlotTransition { .. }
            | Self::InsufficientBalance { .. }
            | Self::EntryNotSubmitted { .. } => ErrorKind::State,
            Self::AllocationConflict { .. } | Self::StoreConflict { .. } => ErrorKind::Conflict,
            Self::MissingTimestamp { .. }
            | Self::InvalidWindow { .. }
            | Self::MissingSalary(_)
            | Self::Configuration(_)
            | Self::InvalidRanking { .. } => ErrorKind::Config,
            Self::EntryNotFound(_) | Self::SlotNotFound(_) | Self::PlayerNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Internal(_) | Self::Serialization(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Whether the whole logical operation may be retried in-process.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FairwayError>;

impl From<std::io::Error> for FairwayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FairwayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
