//! Registration schedule derivation.
//!
//! The one place registration close is computed:
//!
//! ```text
//! reg_close = round_start(gating_round(format)) - buffer
//! ```
//!
//! The matchmaking allocator, the entry book and contest creation all call
//! into here instead of doing their own date arithmetic.

use chrono::{DateTime, Utc};
use fairway_types::{
    Contest, ContestFormat, ContestWindow, FairwayError, RegistrationPolicy, Result, Tournament,
    buffer_minutes,
};

/// A window with every instant present and in order:
/// `reg_open ≤ reg_close ≤ start ≤ end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub reg_open: DateTime<Utc>,
    pub reg_close: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResolvedWindow {
    /// Check presence and ordering. Missing or inverted instants are config
    /// errors; nothing is defaulted or clamped.
    pub fn from_window(window: &ContestWindow) -> Result<Self> {
        let reg_open = window
            .reg_open
            .ok_or(FairwayError::MissingTimestamp { field: "reg_open" })?;
        let reg_close = window
            .reg_close
            .ok_or(FairwayError::MissingTimestamp { field: "reg_close" })?;
        let start = window
            .start
            .ok_or(FairwayError::MissingTimestamp { field: "start" })?;
        let end = window
            .end
            .ok_or(FairwayError::MissingTimestamp { field: "end" })?;

        if reg_open > reg_close {
            return Err(FairwayError::InvalidWindow {
                reason: format!("reg_open {reg_open} is after reg_close {reg_close}"),
            });
        }
        if reg_close > start {
            return Err(FairwayError::InvalidWindow {
                reason: format!("reg_close {reg_close} is after start {start}"),
            });
        }
        if start > end {
            return Err(FairwayError::InvalidWindow {
                reason: format!("start {start} is after end {end}"),
            });
        }

        Ok(Self {
            reg_open,
            reg_close,
            start,
            end,
        })
    }
}

impl From<ResolvedWindow> for ContestWindow {
    fn from(w: ResolvedWindow) -> Self {
        Self {
            reg_open: Some(w.reg_open),
            reg_close: Some(w.reg_close),
            start: Some(w.start),
            end: Some(w.end),
        }
    }
}

/// Start of the round that gates `format`.
pub fn gating_start(
    tournament: &Tournament,
    format: ContestFormat,
    policy: &RegistrationPolicy,
) -> Result<DateTime<Utc>> {
    tournament.round_start(policy.gating_round(format))
}

/// Registration close for `format` in `tournament`.
pub fn registration_close(
    tournament: &Tournament,
    format: ContestFormat,
    policy: &RegistrationPolicy,
) -> Result<DateTime<Utc>> {
    let start = gating_start(tournament, format, policy)?;
    Ok(start - buffer_minutes(policy.buffer_minutes))
}

/// Full contest window for `format`, opening registration at `reg_open`.
///
/// `start` is the gating round start and `end` the tournament end.
pub fn derive_window(
    tournament: &Tournament,
    format: ContestFormat,
    reg_open: DateTime<Utc>,
    policy: &RegistrationPolicy,
) -> Result<ContestWindow> {
    let start = gating_start(tournament, format, policy)?;
    let window = ContestWindow {
        reg_open: Some(reg_open),
        reg_close: Some(start - buffer_minutes(policy.buffer_minutes)),
        start: Some(start),
        end: Some(tournament.end()?),
    };
    ResolvedWindow::from_window(&window).map(Into::into)
}

/// Re-derive a stored contest window from its tournament.
///
/// Only `reg_open` is taken from the stored window. Close, start and end
/// must match what the tournament implies, so a hand-edited or stale cutoff
/// is a config error instead of a silently wrong registration window.
///
/// # Errors
/// - [`FairwayError::InvalidInput`] if `tournament` is not the contest's
/// - [`FairwayError::MissingTimestamp`] for an absent instant
/// - [`FairwayError::InvalidWindow`] when a stored instant disagrees
pub fn verify_window(
    contest: &Contest,
    tournament: &Tournament,
    policy: &RegistrationPolicy,
) -> Result<ContestWindow> {
    if contest.tournament_id != tournament.id {
        return Err(FairwayError::InvalidInput {
            reason: format!(
                "{} belongs to {}, not {}",
                contest.id, contest.tournament_id, tournament.id
            ),
        });
    }
    let reg_open = contest
        .window
        .reg_open
        .ok_or(FairwayError::MissingTimestamp { field: "reg_open" })?;
    let derived = derive_window(tournament, contest.format, reg_open, policy)?;

    let stored = &contest.window;
    for (field, have, want) in [
        ("reg_close", stored.reg_close, derived.reg_close),
        ("start", stored.start, derived.start),
        ("end", stored.end, derived.end),
    ] {
        if have != want {
            return Err(FairwayError::InvalidWindow {
                reason: format!(
                    "{} {field} {} does not match {} derived from {}",
                    contest.id,
                    have.map_or_else(|| "unset".to_string(), |t| t.to_string()),
                    want.map_or_else(|| "unset".to_string(), |t| t.to_string()),
                    tournament.id
                ),
            });
        }
    }
    Ok(derived)
}
