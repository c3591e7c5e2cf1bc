//! Tournament model, as handed to the core by roster management.
//!
//! The core only reads tournaments. Timestamps are optional on the wire
//! because roster data is entered by hand; the core refuses to guess a
//! missing one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FairwayError, Result, TournamentId};

/// One of the four tournament rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    First,
    Second,
    Third,
    Fourth,
}

impl Round {
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
            Self::Fourth => 3,
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::First => "round_1_start",
            Self::Second => "round_2_start",
            Self::Third => "round_3_start",
            Self::Fourth => "round_4_start",
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index() + 1)
    }
}

/// A golf tournament: four round start instants and an end instant (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// First tee time of each round, indexed by [`Round::index`].
    pub round_starts: [Option<DateTime<Utc>>; 4],
    pub end: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Start of `round`, or a config error if roster management never set it.
    pub fn round_start(&self, round: Round) -> Result<DateTime<Utc>> {
        self.round_starts[round.index()].ok_or(FairwayError::MissingTimestamp {
            field: round.field(),
        })
    }

    /// End of the tournament, or a config error if absent.
    pub fn end(&self) -> Result<DateTime<Utc>> {
        self.end
            .ok_or(FairwayError::MissingTimestamp { field: "end" })
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Tournament {
    /// A tournament whose rounds start `first_round` + 0/1/2/3 days and end
    /// ten hours after the final round starts.
    #[must_use]
    pub fn dummy_starting(first_round: DateTime<Utc>) -> Self {
        let day = chrono::TimeDelta::days(1);
        Self {
            id: TournamentId::new(),
            name: "Test Invitational".to_string(),
            round_starts: [
                Some(first_round),
                Some(first_round + day),
                Some(first_round + day * 2),
                Some(first_round + day * 3),
            ],
            end: Some(first_round + day * 3 + chrono::TimeDelta::hours(10)),
        }
    }
}
