//! Structured lineup validation results.
//!
//! Validation problems are data, not errors: a UI renders each
//! [`LineupError`] next to the pick that caused it.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, Salary};

/// A reason a lineup cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum LineupError {
    WrongPickCount { expected: usize, actual: usize },
    OverCap { total: Salary, cap: Salary, excess: Salary },
    PickOverLimit { player: PlayerId, salary: Salary, limit: Salary },
    MissingCaptain,
    CaptainNotInLineup { captain: PlayerId },
    DuplicatePlayer { player: PlayerId },
    DuplicateSlot { slot: u8 },
}

impl LineupError {
    /// Errors a partially built draft is allowed to carry.
    #[must_use]
    pub fn is_incomplete_draft(&self) -> bool {
        matches!(self, Self::WrongPickCount { .. } | Self::MissingCaptain)
    }
}

/// Advice that does not block submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum LineupWarning {
    TightBudget { remaining: Salary },
    UnusedBudget { remaining: Salary },
}

/// Outcome of validating a lineup against a cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub total: Salary,
    /// `cap - total`; negative when over the cap.
    pub remaining: Salary,
    pub errors: Vec<LineupError>,
    pub warnings: Vec<LineupWarning>,
}

impl ValidationResult {
    /// Excess over the cap, if any.
    #[must_use]
    pub fn overage(&self) -> Option<Salary> {
        self.errors.iter().find_map(|e| match e {
            LineupError::OverCap { excess, .. } => Some(*excess),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serializes_with_code_tag() {
        let err = LineupError::OverCap {
            total: 61_000,
            cap: 60_000,
            excess: 1_000,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "over_cap");
        assert_eq!(json["excess"], 1_000);
    }

    #[test]
    fn incomplete_draft_errors() {
        assert!(LineupError::MissingCaptain.is_incomplete_draft());
        assert!(
            LineupError::WrongPickCount {
                expected: 6,
                actual: 2
            }
            .is_incomplete_draft()
        );
        assert!(!LineupError::DuplicateSlot { slot: 1 }.is_incomplete_draft());
    }

    #[test]
    fn overage_lookup() {
        let result = ValidationResult {
            valid: false,
            total: 61_000,
            remaining: -1_000,
            errors: vec![
                LineupError::MissingCaptain,
                LineupError::OverCap {
                    total: 61_000,
                    cap: 60_000,
                    excess: 1_000,
                },
            ],
            warnings: vec![],
        };
        assert_eq!(result.overage(), Some(1_000));
    }
}
