//! Entry book: drafts, pick replacement, submission.
//!
//! Edits are gated on the state the lifecycle resolver computes at edit
//! time, never on a stored flag. Pick replacement swaps the whole pick list
//! under one write lock, so readers see either the old lineup or the new
//! one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fairway_engine::{ResolvedWindow, derive_window, resolve_state, validate_lineup, verify_window};
use fairway_types::{
    Contest, ContestFlags, ContestFormat, ContestState, ContestWindow, Entry, EntryId, EntryState,
    EntryTarget, FairwayError, HeadToHeadTemplate, LineupRules, Pick, Player, PlayerId,
    RegistrationPolicy, Result, Seat, Selection, SlotId, TemplateId, Tournament, TournamentId,
    UserId,
};
use parking_lot::RwLock;

/// Everything an entry operation needs to know about what it is entering.
#[derive(Debug, Clone)]
pub struct EntryContext {
    pub target: EntryTarget,
    pub window: ContestWindow,
    pub flags: ContestFlags,
    /// Lineup rules with the target's own salary cap applied.
    pub rules: LineupRules,
    /// Most submitted or paid entries the target takes. `None` for
    /// head-to-head templates, where every slot caps itself at two.
    pub max_entrants: Option<u32>,
}

impl EntryContext {
    /// Context for a standard contest. The stored window is checked against
    /// the one `tournament` implies.
    ///
    /// # Errors
    /// Whatever [`verify_window`] refuses.
    pub fn for_contest(
        contest: &Contest,
        tournament: &Tournament,
        policy: &RegistrationPolicy,
        rules: &LineupRules,
    ) -> Result<Self> {
        let max_entrants = contest
            .format
            .seat_limit()
            .map_or(contest.max_entrants, |seats| seats.min(contest.max_entrants));
        Ok(Self {
            target: EntryTarget::Contest {
                contest: contest.id,
            },
            window: verify_window(contest, tournament, policy)?,
            flags: contest.flags,
            rules: rules.with_cap(contest.salary_cap),
            max_entrants: Some(max_entrants),
        })
    }

    /// Context for a head-to-head template, which is open from creation
    /// until its gating round's registration close.
    ///
    /// # Errors
    /// Config errors from window derivation.
    pub fn for_head_to_head(
        template: &HeadToHeadTemplate,
        tournament: &Tournament,
        policy: &RegistrationPolicy,
        rules: &LineupRules,
    ) -> Result<Self> {
        Ok(Self {
            target: EntryTarget::HeadToHead {
                template: template.id,
                tournament: tournament.id,
            },
            window: derive_window(
                tournament,
                ContestFormat::HeadToHead,
                DateTime::<Utc>::MIN_UTC,
                policy,
            )?,
            flags: ContestFlags::default(),
            rules: rules.with_cap(template.salary_cap),
            max_entrants: None,
        })
    }

    fn state(&self, now: DateTime<Utc>) -> Result<ContestState> {
        resolve_state(now, &self.window, self.flags)
    }

    fn ensure_editable(&self, now: DateTime<Utc>) -> Result<()> {
        let state = self.state(now)?;
        if state.allows_edits() {
            Ok(())
        } else {
            Err(FairwayError::ContestNotOpen { state })
        }
    }

    fn ensure_accepting(&self, now: DateTime<Utc>) -> Result<()> {
        match self.state(now)? {
            state if state.accepts_entries() => Ok(()),
            ContestState::RegistrationClosed | ContestState::Live | ContestState::Completed => {
                Err(FairwayError::RegistrationClosed {
                    closed_at: ResolvedWindow::from_window(&self.window)?.reg_close,
                })
            }
            state => Err(FairwayError::ContestNotOpen { state }),
        }
    }
}

/// In-memory entry book.
#[derive(Debug, Default)]
pub struct EntryBook {
    entries: RwLock<HashMap<EntryId, Entry>>,
}

impl EntryBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty draft.
    ///
    /// # Errors
    /// [`FairwayError::ContestNotOpen`] once the contest has started.
    pub fn create_draft(
        &self,
        user: UserId,
        ctx: &EntryContext,
        now: DateTime<Utc>,
    ) -> Result<Entry> {
        ctx.ensure_editable(now)?;
        let entry = Entry::draft(user, ctx.target, now);
        self.entries.write().insert(entry.id, entry.clone());
        tracing::debug!(entry = %entry.id, user = %user, "Draft created");
        Ok(entry)
    }

    /// Consistent copy of an entry.
    #[must_use]
    pub fn get(&self, entry: EntryId) -> Option<Entry> {
        self.entries.read().get(&entry).cloned()
    }

    /// Replace the draft's picks and captain in one step.
    ///
    /// Players kept from the previous lineup keep their frozen salary; new
    /// players are priced at their current salary. The draft may be
    /// incomplete, but never over the cap or the per-pick limit.
    ///
    /// # Errors
    /// - [`FairwayError::EntryNotFound`], [`FairwayError::EntryNotDraft`]
    /// - [`FairwayError::ContestNotOpen`] once the contest has started
    /// - [`FairwayError::PlayerNotFound`], [`FairwayError::MissingSalary`]
    /// - [`FairwayError::LineupRejected`] for cap, limit, duplicate or
    ///   captain problems
    pub fn replace_picks(
        &self,
        entry: EntryId,
        selections: &[Selection],
        captain: Option<PlayerId>,
        ctx: &EntryContext,
        players: &[Player],
        now: DateTime<Utc>,
    ) -> Result<Entry> {
        let by_id: HashMap<PlayerId, &Player> = players.iter().map(|p| (p.id, p)).collect();

        let mut entries = self.entries.write();
        let current = entries
            .get_mut(&entry)
            .ok_or(FairwayError::EntryNotFound(entry))?;
        check_target(current, ctx)?;
        if current.state != EntryState::Draft {
            return Err(FairwayError::EntryNotDraft {
                entry,
                state: current.state,
            });
        }
        ctx.ensure_editable(now)?;

        let picks = selections
            .iter()
            .map(|sel| {
                let salary = match current.frozen_salary(sel.player) {
                    Some(frozen) => frozen,
                    None => by_id
                        .get(&sel.player)
                        .ok_or(FairwayError::PlayerNotFound(sel.player))?
                        .salary
                        .ok_or(FairwayError::MissingSalary(sel.player))?,
                };
                Ok(Pick {
                    player: sel.player,
                    slot: sel.slot,
                    salary_at_selection: salary,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let blocking: Vec<_> = validate_lineup(&picks, captain, &ctx.rules)
            .errors
            .into_iter()
            .filter(|e| !e.is_incomplete_draft())
            .collect();
        if !blocking.is_empty() {
            return Err(FairwayError::LineupRejected { errors: blocking });
        }

        current.picks = picks;
        current.captain = captain;
        current.updated_at = now;
        Ok(current.clone())
    }

    /// Submit a draft. The lineup must be complete and valid, registration
    /// must be open and the target must have room.
    ///
    /// The entry count is taken under the same write lock as the state
    /// change, so concurrent submits never overfill a contest.
    ///
    /// # Errors
    /// - [`FairwayError::EntryNotFound`]
    /// - [`FairwayError::InvalidEntryTransition`] unless the entry is a draft
    /// - [`FairwayError::RegistrationClosed`] / [`FairwayError::ContestNotOpen`]
    /// - [`FairwayError::LineupRejected`] with every validation error
    /// - [`FairwayError::ContestFull`] once `max_entrants` entries are in
    pub fn submit(&self, entry: EntryId, ctx: &EntryContext, now: DateTime<Utc>) -> Result<Entry> {
        let mut entries = self.entries.write();
        let current = entries
            .get(&entry)
            .ok_or(FairwayError::EntryNotFound(entry))?;
        check_target(current, ctx)?;
        transition(current, EntryState::Submitted)?;
        ctx.ensure_accepting(now)?;

        let result = validate_lineup(&current.picks, current.captain, &ctx.rules);
        if !result.valid {
            return Err(FairwayError::LineupRejected {
                errors: result.errors,
            });
        }

        if let Some(max_entrants) = ctx.max_entrants {
            let taken = entries
                .values()
                .filter(|e| e.target == ctx.target && e.state != EntryState::Draft)
                .count();
            if u32::try_from(taken).unwrap_or(u32::MAX) >= max_entrants {
                return Err(FairwayError::ContestFull { max_entrants });
            }
        }

        let current = entries
            .get_mut(&entry)
            .ok_or(FairwayError::EntryNotFound(entry))?;
        current.state = EntryState::Submitted;
        current.updated_at = now;
        tracing::info!(
            entry = %entry,
            user = %current.user,
            total = result.total,
            "Entry submitted"
        );
        Ok(current.clone())
    }

    /// Record a successful charge: submitted → paid.
    ///
    /// # Errors
    /// [`FairwayError::EntryNotFound`], [`FairwayError::InvalidEntryTransition`].
    pub fn mark_paid(&self, entry: EntryId, now: DateTime<Utc>) -> Result<Entry> {
        let mut entries = self.entries.write();
        let current = entries
            .get_mut(&entry)
            .ok_or(FairwayError::EntryNotFound(entry))?;
        transition(current, EntryState::Paid)?;
        current.state = EntryState::Paid;
        current.updated_at = now;
        Ok(current.clone())
    }

    /// The seat a submitted head-to-head entry takes in matchmaking.
    ///
    /// # Errors
    /// - [`FairwayError::EntryNotFound`]
    /// - [`FairwayError::InvalidInput`] if the entry targets anything other
    ///   than this (template, tournament)
    /// - [`FairwayError::EntryNotSubmitted`] for drafts
    pub fn seat_for(
        &self,
        entry: EntryId,
        template: TemplateId,
        tournament: TournamentId,
    ) -> Result<Seat> {
        let entries = self.entries.read();
        let current = entries
            .get(&entry)
            .ok_or(FairwayError::EntryNotFound(entry))?;
        if current.target != (EntryTarget::HeadToHead { template, tournament }) {
            return Err(FairwayError::InvalidInput {
                reason: format!("{entry} is not entered in {template} for {tournament}"),
            });
        }
        if current.state == EntryState::Draft {
            return Err(FairwayError::EntryNotSubmitted {
                entry,
                state: current.state,
            });
        }
        Ok(Seat {
            entry,
            user: current.user,
        })
    }

    /// Record the slot an entry was seated in. Repeating with the same slot
    /// is a no-op.
    ///
    /// # Errors
    /// - [`FairwayError::EntryNotFound`]
    /// - [`FairwayError::InvalidInput`] if already seated elsewhere
    pub fn assign_slot(&self, entry: EntryId, slot: SlotId, now: DateTime<Utc>) -> Result<Entry> {
        let mut entries = self.entries.write();
        let current = entries
            .get_mut(&entry)
            .ok_or(FairwayError::EntryNotFound(entry))?;
        match current.slot {
            Some(existing) if existing == slot => {}
            Some(existing) => {
                return Err(FairwayError::InvalidInput {
                    reason: format!("{entry} is already seated in {existing}"),
                });
            }
            None => {
                current.slot = Some(slot);
                current.updated_at = now;
            }
        }
        Ok(current.clone())
    }
}

fn check_target(entry: &Entry, ctx: &EntryContext) -> Result<()> {
    if entry.target == ctx.target {
        Ok(())
    } else {
        Err(FairwayError::InvalidInput {
            reason: format!("{} does not belong to the given contest", entry.id),
        })
    }
}

fn transition(entry: &Entry, to: EntryState) -> Result<()> {
    if entry.state.can_transition_to(to) {
        Ok(())
    } else {
        Err(FairwayError::InvalidEntryTransition {
            entry: entry.id,
            from: entry.state,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::{TimeDelta, TimeZone};
    use fairway_types::{ContestId, LineupError};

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 7, 11, 0, 0).unwrap()
    }

    fn tournament() -> Tournament {
        Tournament::dummy_starting(start())
    }

    fn contest(t: &Tournament, max_entrants: u32) -> Contest {
        Contest {
            id: ContestId::new(),
            tournament_id: t.id,
            format: ContestFormat::Standard,
            window: derive_window(
                t,
                ContestFormat::Standard,
                start() - TimeDelta::days(3),
                &RegistrationPolicy::default(),
            )
            .unwrap(),
            flags: ContestFlags::default(),
            entry_fee: 1_000,
            salary_cap: 60_000,
            max_entrants,
            cached_state: None,
        }
    }

    fn context(c: &Contest, t: &Tournament) -> EntryContext {
        EntryContext::for_contest(c, t, &RegistrationPolicy::default(), &LineupRules::default())
            .unwrap()
    }

    fn open_time() -> DateTime<Utc> {
        start() - TimeDelta::days(1)
    }

    fn field(salaries: &[i64]) -> Vec<Player> {
        salaries.iter().map(|s| Player::dummy_priced(*s)).collect()
    }

    fn select(players: &[Player]) -> Vec<Selection> {
        players
            .iter()
            .enumerate()
            .map(|(i, p)| Selection {
                player: p.id,
                slot: u8::try_from(i).unwrap(),
            })
            .collect()
    }

    fn setup() -> (EntryBook, EntryContext, Entry) {
        let t = tournament();
        let book = EntryBook::new();
        let ctx = context(&contest(&t, 50), &t);
        let entry = book.create_draft(UserId::new(), &ctx, open_time()).unwrap();
        (book, ctx, entry)
    }

    /// Draft, fill and submit one entry.
    fn enter(book: &EntryBook, ctx: &EntryContext, players: &[Player]) -> Result<Entry> {
        let entry = book.create_draft(UserId::new(), ctx, open_time())?;
        let captain = Some(players[0].id);
        book.replace_picks(entry.id, &select(players), captain, ctx, players, open_time())?;
        book.submit(entry.id, ctx, open_time())
    }

    #[test]
    fn frozen_salaries_survive_repricing() {
        let (book, ctx, entry) = setup();
        let mut players = field(&[10_000, 9_500, 9_000, 8_500, 8_000, 7_500, 7_000]);
        let first = &players[..6];
        let captain = Some(first[0].id);
        book.replace_picks(entry.id, &select(first), captain, &ctx, &players, open_time())
            .unwrap();

        // Reprice everyone, then swap the last pick for the seventh player.
        for p in &mut players {
            p.salary = p.salary.map(|s| s + 200);
        }
        let mut sel = select(&players[..6]);
        sel[5] = Selection {
            player: players[6].id,
            slot: 5,
        };
        let updated = book
            .replace_picks(entry.id, &sel, Some(players[0].id), &ctx, &players, open_time())
            .unwrap();

        assert_eq!(updated.frozen_salary(players[0].id), Some(10_000));
        assert_eq!(updated.frozen_salary(players[6].id), Some(7_200));
        assert_eq!(updated.frozen_salary(players[5].id), None);
    }

    #[test]
    fn incomplete_draft_allowed_but_not_over_cap() {
        let (book, ctx, entry) = setup();
        let players = field(&[12_000, 12_000, 12_000]);
        let draft = book
            .replace_picks(entry.id, &select(&players), None, &ctx, &players, open_time())
            .unwrap();
        assert_eq!(draft.picks.len(), 3);

        let pricey = field(&[18_500]);
        let err = book
            .replace_picks(entry.id, &select(&pricey), None, &ctx, &pricey, open_time())
            .unwrap_err();
        match err {
            FairwayError::LineupRejected { errors } => {
                assert!(matches!(errors[..], [LineupError::PickOverLimit { limit: 18_000, .. }]));
            }
            other => panic!("unexpected {other}"),
        }
        // Rejected edits leave the previous picks in place.
        assert_eq!(book.get(entry.id).unwrap().picks.len(), 3);
    }

    #[test]
    fn unknown_or_unpriced_player() {
        let (book, ctx, entry) = setup();
        let mut players = field(&[9_000]);
        let ghost = Selection {
            player: PlayerId::new(),
            slot: 0,
        };
        assert!(matches!(
            book.replace_picks(entry.id, &[ghost], None, &ctx, &players, open_time())
                .unwrap_err(),
            FairwayError::PlayerNotFound(_)
        ));
        players[0].salary = None;
        assert!(matches!(
            book.replace_picks(entry.id, &select(&players), None, &ctx, &players, open_time())
                .unwrap_err(),
            FairwayError::MissingSalary(_)
        ));
    }

    #[test]
    fn edits_stop_at_start() {
        let (book, ctx, entry) = setup();
        let players = field(&[9_000; 6]);
        let captain = Some(players[0].id);
        let err = book
            .replace_picks(entry.id, &select(&players), captain, &ctx, &players, start())
            .unwrap_err();
        assert!(matches!(
            err,
            FairwayError::ContestNotOpen {
                state: ContestState::Live
            }
        ));
        // Between close and start: editable, not submittable.
        let late = start() - TimeDelta::minutes(5);
        book.replace_picks(entry.id, &select(&players), captain, &ctx, &players, late)
            .unwrap();
        assert!(matches!(
            book.submit(entry.id, &ctx, late).unwrap_err(),
            FairwayError::RegistrationClosed { .. }
        ));
    }

    #[test]
    fn hand_edited_close_is_refused() {
        let t = tournament();
        let mut c = contest(&t, 50);
        // Pushed to a minute before the start; the tournament says 10:45.
        c.window.reg_close = Some(start() - TimeDelta::minutes(1));
        let err = EntryContext::for_contest(
            &c,
            &t,
            &RegistrationPolicy::default(),
            &LineupRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FairwayError::InvalidWindow { .. }));

        // With the derived window, 10:55 is past registration close.
        let ctx = context(&contest(&t, 50), &t);
        let book = EntryBook::new();
        let players = field(&[9_000; 6]);
        let entry = book.create_draft(UserId::new(), &ctx, open_time()).unwrap();
        let captain = Some(players[0].id);
        book.replace_picks(entry.id, &select(&players), captain, &ctx, &players, open_time())
            .unwrap();
        let err = book
            .submit(entry.id, &ctx, start() - TimeDelta::minutes(5))
            .unwrap_err();
        assert!(matches!(err, FairwayError::RegistrationClosed { closed_at }
            if closed_at == start() - TimeDelta::minutes(15)));
    }

    #[test]
    fn submit_requires_full_lineup_and_captain() {
        let (book, ctx, entry) = setup();
        let players = field(&[9_000; 6]);
        book.replace_picks(entry.id, &select(&players), None, &ctx, &players, open_time())
            .unwrap();
        let err = book.submit(entry.id, &ctx, open_time()).unwrap_err();
        assert!(matches!(
            err,
            FairwayError::LineupRejected { ref errors } if errors == &[LineupError::MissingCaptain]
        ));

        let captain = Some(players[2].id);
        book.replace_picks(entry.id, &select(&players), captain, &ctx, &players, open_time())
            .unwrap();
        let submitted = book.submit(entry.id, &ctx, open_time()).unwrap();
        assert_eq!(submitted.state, EntryState::Submitted);

        // Submitted entries are frozen.
        assert!(matches!(
            book.replace_picks(entry.id, &select(&players), captain, &ctx, &players, open_time())
                .unwrap_err(),
            FairwayError::EntryNotDraft { .. }
        ));
        assert!(matches!(
            book.submit(entry.id, &ctx, open_time()).unwrap_err(),
            FairwayError::InvalidEntryTransition { .. }
        ));
    }

    #[test]
    fn paid_is_one_way() {
        let (book, ctx, entry) = setup();
        assert!(matches!(
            book.mark_paid(entry.id, open_time()).unwrap_err(),
            FairwayError::InvalidEntryTransition { .. }
        ));
        let players = field(&[9_000; 6]);
        let captain = Some(players[0].id);
        book.replace_picks(entry.id, &select(&players), captain, &ctx, &players, open_time())
            .unwrap();
        book.submit(entry.id, &ctx, open_time()).unwrap();
        assert_eq!(
            book.mark_paid(entry.id, open_time()).unwrap().state,
            EntryState::Paid
        );
        assert!(book.mark_paid(entry.id, open_time()).is_err());
    }

    #[test]
    fn wrong_context_rejected() {
        let (book, _, entry) = setup();
        let t = tournament();
        let other = context(&contest(&t, 50), &t);
        assert!(matches!(
            book.submit(entry.id, &other, open_time()).unwrap_err(),
            FairwayError::InvalidInput { .. }
        ));
    }

    #[test]
    fn entry_limit_is_enforced() {
        let t = tournament();
        let ctx = context(&contest(&t, 2), &t);
        let book = EntryBook::new();
        let players = field(&[9_000; 6]);

        let first = enter(&book, &ctx, &players).unwrap();
        book.mark_paid(first.id, open_time()).unwrap();
        enter(&book, &ctx, &players).unwrap();
        let err = enter(&book, &ctx, &players).unwrap_err();
        assert!(matches!(err, FairwayError::ContestFull { max_entrants: 2 }));
        assert_eq!(err.kind(), fairway_types::ErrorKind::State);
    }

    #[test]
    fn racing_submits_never_overfill() {
        let t = tournament();
        let ctx = context(&contest(&t, 3), &t);
        let book = EntryBook::new();
        let players = field(&[9_000; 6]);

        let (book, ctx, players) = (&book, &ctx, &players);
        let accepted = thread::scope(|s| {
            let handles: Vec<_> = (0..12)
                .map(|_| s.spawn(move || enter(book, ctx, players).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });
        assert_eq!(accepted, 3);
    }

    #[test]
    fn head_to_head_format_caps_at_two() {
        let t = tournament();
        let mut c = contest(&t, 50);
        c.format = ContestFormat::HeadToHead;
        assert_eq!(context(&c, &t).max_entrants, Some(2));
    }

    #[test]
    fn head_to_head_context_uses_template_cap() {
        let t = tournament();
        let template = HeadToHeadTemplate {
            id: TemplateId::new(),
            name: "Heads Up".into(),
            entry_fee: 500,
            salary_cap: 50_000,
        };
        let ctx = EntryContext::for_head_to_head(
            &template,
            &t,
            &RegistrationPolicy::default(),
            &LineupRules::default(),
        )
        .unwrap();
        assert_eq!(ctx.rules.salary_cap, 50_000);
        assert_eq!(ctx.max_entrants, None);
        assert_eq!(
            ctx.window.reg_close,
            Some(start() - TimeDelta::minutes(15))
        );
        assert_eq!(ctx.state(open_time()).unwrap(), ContestState::RegistrationOpen);
    }

    #[test]
    fn seat_requires_submitted_head_to_head_entry() {
        let t = tournament();
        let template = HeadToHeadTemplate {
            id: TemplateId::new(),
            name: "Heads Up".into(),
            entry_fee: 500,
            salary_cap: 50_000,
        };
        let ctx = EntryContext::for_head_to_head(
            &template,
            &t,
            &RegistrationPolicy::default(),
            &LineupRules::default(),
        )
        .unwrap();
        let book = EntryBook::new();
        let draft = book.create_draft(UserId::new(), &ctx, open_time()).unwrap();

        assert!(matches!(
            book.seat_for(EntryId::new(), template.id, t.id).unwrap_err(),
            FairwayError::EntryNotFound(_)
        ));
        assert!(matches!(
            book.seat_for(draft.id, template.id, t.id).unwrap_err(),
            FairwayError::EntryNotSubmitted { .. }
        ));
        assert!(matches!(
            book.seat_for(draft.id, TemplateId::new(), t.id).unwrap_err(),
            FairwayError::InvalidInput { .. }
        ));

        let entry = enter(&book, &ctx, &field(&[8_000; 6])).unwrap();
        let seat = book.seat_for(entry.id, template.id, t.id).unwrap();
        assert_eq!(seat.user, entry.user);

        let slot = SlotId::new();
        assert_eq!(book.assign_slot(entry.id, slot, open_time()).unwrap().slot, Some(slot));
        assert!(book.assign_slot(entry.id, slot, open_time()).is_ok());
        assert!(matches!(
            book.assign_slot(entry.id, SlotId::new(), open_time()).unwrap_err(),
            FairwayError::InvalidInput { .. }
        ));
    }
}
