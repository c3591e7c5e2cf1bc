//! Lifecycle resolver: `(now, window, flags) → ContestState`.
//!
//! Rules, first match wins:
//!
//! ```text
//! cancelled                   → Cancelled
//! !published                  → Draft
//! any instant missing         → ConfigError
//! now <  reg_open             → Upcoming
//! now <  reg_close            → RegistrationOpen
//! now <  start                → RegistrationClosed
//! now <  end                  → Live
//! otherwise                   → Completed
//! ```
//!
//! This is the only legal producer of contest state. Persisted state is a
//! cache refreshed through [`refresh_cached_state`] and never read back as
//! authority.

use chrono::{DateTime, Utc};
use fairway_types::{
    Contest, ContestFlags, ContestState, ContestWindow, RegistrationPolicy, Result, Tournament,
};

use crate::schedule::{ResolvedWindow, verify_window};

/// Resolve the state of a contest window at `now`.
pub fn resolve_state(
    now: DateTime<Utc>,
    window: &ContestWindow,
    flags: ContestFlags,
) -> Result<ContestState> {
    if flags.cancelled {
        return Ok(ContestState::Cancelled);
    }
    if !flags.published {
        return Ok(ContestState::Draft);
    }

    let w = ResolvedWindow::from_window(window)?;
    let state = if now < w.reg_open {
        ContestState::Upcoming
    } else if now < w.reg_close {
        ContestState::RegistrationOpen
    } else if now < w.start {
        ContestState::RegistrationClosed
    } else if now < w.end {
        ContestState::Live
    } else {
        ContestState::Completed
    };
    Ok(state)
}

/// Resolve a persisted contest, ignoring its cached state.
///
/// The stored window is re-derived from `tournament` first, so a cutoff
/// that drifted from the gating round is an error rather than a state.
pub fn resolve_contest(
    contest: &Contest,
    tournament: &Tournament,
    policy: &RegistrationPolicy,
    now: DateTime<Utc>,
) -> Result<ContestState> {
    if contest.flags.cancelled || !contest.flags.published {
        return resolve_state(now, &contest.window, contest.flags);
    }
    let window = verify_window(contest, tournament, policy)?;
    resolve_state(now, &window, contest.flags)
}

/// Result of refreshing a contest's cached state column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheRefresh {
    pub state: ContestState,
    pub previous: Option<ContestState>,
}

impl CacheRefresh {
    /// Whether the cached value disagreed with the resolved one.
    #[must_use]
    pub fn was_stale(&self) -> bool {
        self.previous != Some(self.state)
    }
}

/// Recompute and overwrite `contest.cached_state`.
///
/// Scheduled refreshes call this; if they stop running nothing breaks,
/// because every authoritative read goes through [`resolve_contest`].
pub fn refresh_cached_state(
    contest: &mut Contest,
    tournament: &Tournament,
    policy: &RegistrationPolicy,
    now: DateTime<Utc>,
) -> Result<CacheRefresh> {
    let state = resolve_contest(contest, tournament, policy, now)?;
    let refresh = CacheRefresh {
        state,
        previous: contest.cached_state.replace(state),
    };
    if let (true, Some(previous)) = (refresh.was_stale(), refresh.previous) {
        tracing::warn!(
            contest = %contest.id,
            cached = %previous,
            resolved = %state,
            "Stale contest state refreshed"
        );
    }
    Ok(refresh)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use fairway_types::{ContestFormat, ContestId, FairwayError};

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 17, 6, 35, 0).unwrap()
    }

    fn window() -> ContestWindow {
        ContestWindow {
            reg_open: Some(start() - TimeDelta::days(5)),
            reg_close: Some(start() - TimeDelta::minutes(15)),
            start: Some(start()),
            end: Some(start() + TimeDelta::days(4)),
        }
    }

    fn tournament() -> Tournament {
        let mut t = Tournament::dummy_starting(start());
        t.end = Some(start() + TimeDelta::days(4));
        t
    }

    fn contest(t: &Tournament) -> Contest {
        Contest {
            id: ContestId::new(),
            tournament_id: t.id,
            format: ContestFormat::Standard,
            window: window(),
            flags: ContestFlags::default(),
            entry_fee: 500,
            salary_cap: 60_000,
            max_entrants: 100,
            cached_state: None,
        }
    }

    fn at(now: DateTime<Utc>) -> ContestState {
        resolve_state(now, &window(), ContestFlags::default()).unwrap()
    }

    #[test]
    fn each_boundary() {
        let w = window();
        let (open, close, s, e) = (
            w.reg_open.unwrap(),
            w.reg_close.unwrap(),
            w.start.unwrap(),
            w.end.unwrap(),
        );
        let eps = TimeDelta::seconds(1);

        assert_eq!(at(open - eps), ContestState::Upcoming);
        assert_eq!(at(open), ContestState::RegistrationOpen);
        assert_eq!(at(close - eps), ContestState::RegistrationOpen);
        assert_eq!(at(close), ContestState::RegistrationClosed);
        assert_eq!(at(s - eps), ContestState::RegistrationClosed);
        assert_eq!(at(s), ContestState::Live);
        assert_eq!(at(e - eps), ContestState::Live);
        assert_eq!(at(e), ContestState::Completed);
        assert_eq!(at(e + TimeDelta::days(30)), ContestState::Completed);
    }

    #[test]
    fn cancelled_overrides_everything() {
        let flags = ContestFlags {
            cancelled: true,
            published: true,
        };
        assert_eq!(
            resolve_state(start(), &window(), flags).unwrap(),
            ContestState::Cancelled
        );
        // Even a broken window resolves to cancelled.
        assert_eq!(
            resolve_state(start(), &ContestWindow::default(), flags).unwrap(),
            ContestState::Cancelled
        );
    }

    #[test]
    fn unpublished_is_draft() {
        let flags = ContestFlags {
            cancelled: false,
            published: false,
        };
        assert_eq!(
            resolve_state(start(), &ContestWindow::default(), flags).unwrap(),
            ContestState::Draft
        );
    }

    #[test]
    fn missing_timestamp_is_config_error() {
        let mut w = window();
        w.reg_close = None;
        let err = resolve_state(start(), &w, ContestFlags::default()).unwrap_err();
        assert!(matches!(
            err,
            FairwayError::MissingTimestamp { field: "reg_close" }
        ));
    }

    #[test]
    fn inverted_window_is_config_error() {
        let mut w = window();
        w.reg_close = Some(start() + TimeDelta::hours(1));
        let err = resolve_state(start(), &w, ContestFlags::default()).unwrap_err();
        assert!(matches!(err, FairwayError::InvalidWindow { .. }));
    }

    #[test]
    fn never_moves_backwards_as_time_advances() {
        let mut now = start() - TimeDelta::days(7);
        let mut last = at(now);
        while now < start() + TimeDelta::days(6) {
            now += TimeDelta::minutes(7);
            let next = at(now);
            assert!(next >= last, "{last} -> {next} at {now}");
            assert_eq!(next, at(now), "resolver must be pure");
            last = next;
        }
        assert_eq!(last, ContestState::Completed);
    }

    #[test]
    fn refresh_replaces_stale_cache() {
        let t = tournament();
        let policy = RegistrationPolicy::default();
        let later = start() + TimeDelta::days(10);
        let mut c = contest(&t);
        c.cached_state = Some(ContestState::Live);
        let refresh = refresh_cached_state(&mut c, &t, &policy, later).unwrap();
        assert!(refresh.was_stale());
        assert_eq!(refresh.previous, Some(ContestState::Live));
        assert_eq!(c.cached_state, Some(ContestState::Completed));

        let again = refresh_cached_state(&mut c, &t, &policy, later).unwrap();
        assert!(!again.was_stale());
    }

    #[test]
    fn resolve_contest_ignores_cache() {
        let t = tournament();
        let mut c = contest(&t);
        c.cached_state = Some(ContestState::Upcoming);
        assert_eq!(
            resolve_contest(&c, &t, &RegistrationPolicy::default(), start() + TimeDelta::hours(1))
                .unwrap(),
            ContestState::Live
        );
    }

    #[test]
    fn resolve_contest_rejects_drifted_close() {
        let t = tournament();
        let policy = RegistrationPolicy::default();
        let mut c = contest(&t);
        c.window.reg_close = Some(start() - TimeDelta::minutes(1));
        // Ten minutes before the start the derived close has passed.
        let now = start() - TimeDelta::minutes(10);
        assert!(matches!(
            resolve_contest(&c, &t, &policy, now).unwrap_err(),
            FairwayError::InvalidWindow { .. }
        ));
        // Admin flags still win over a broken window.
        c.flags.cancelled = true;
        assert_eq!(
            resolve_contest(&c, &t, &policy, now).unwrap(),
            ContestState::Cancelled
        );
    }
}
