//! Lineup validator.
//!
//! Pure check of a candidate lineup against [`LineupRules`]. Every problem is
//! collected, not just the first, so the caller can show them all at once.

use std::collections::HashSet;

use fairway_types::{
    LineupError, LineupRules, LineupWarning, Pick, PlayerId, Salary, ValidationResult,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Most a single pick may cost: `floor(cap × max_player_fraction)`.
#[must_use]
pub fn per_pick_limit(rules: &LineupRules) -> Salary {
    (Decimal::from(rules.salary_cap) * rules.max_player_fraction)
        .floor()
        .to_i64()
        .unwrap_or(rules.salary_cap)
}

/// Validate `picks` (with their frozen salaries) and `captain`.
#[must_use]
pub fn validate_lineup(
    picks: &[Pick],
    captain: Option<PlayerId>,
    rules: &LineupRules,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if picks.len() != rules.roster_size {
        errors.push(LineupError::WrongPickCount {
            expected: rules.roster_size,
            actual: picks.len(),
        });
    }

    let mut players = HashSet::with_capacity(picks.len());
    let mut slots = HashSet::with_capacity(picks.len());
    for pick in picks {
        if !players.insert(pick.player) {
            errors.push(LineupError::DuplicatePlayer {
                player: pick.player,
            });
        }
        if !slots.insert(pick.slot) {
            errors.push(LineupError::DuplicateSlot { slot: pick.slot });
        }
    }

    match captain {
        None => errors.push(LineupError::MissingCaptain),
        Some(c) if !players.contains(&c) => {
            errors.push(LineupError::CaptainNotInLineup { captain: c });
        }
        Some(_) => {}
    }

    let total: Salary = picks.iter().map(|p| p.salary_at_selection).sum();
    let remaining = rules.salary_cap - total;
    if total > rules.salary_cap {
        errors.push(LineupError::OverCap {
            total,
            cap: rules.salary_cap,
            excess: total - rules.salary_cap,
        });
    }

    let limit = per_pick_limit(rules);
    for pick in picks.iter().filter(|p| p.salary_at_selection > limit) {
        errors.push(LineupError::PickOverLimit {
            player: pick.player,
            salary: pick.salary_at_selection,
            limit,
        });
    }

    if picks.len() == rules.roster_size && remaining >= 0 {
        if remaining < rules.tight_budget_threshold {
            warnings.push(LineupWarning::TightBudget { remaining });
        } else if remaining > rules.unused_budget_threshold {
            warnings.push(LineupWarning::UnusedBudget { remaining });
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        total,
        remaining,
        errors,
        warnings,
    }
}
