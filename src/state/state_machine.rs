use crate::state::session::{Player, PlayerId, Session};

/// Commands that can be dispatched to the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append a new player at the end of the list.
    AddPlayer {
        /// Requested display name (trimmed before use).
        name: String,
    },
    /// Add one point, or one pending point while totals are hidden.
    Increment {
        /// Target player.
        id: PlayerId,
    },
    /// Remove one point, or one pending point while totals are hidden.
    Decrement {
        /// Target player.
        id: PlayerId,
    },
    /// Drop a player from the session.
    RemovePlayer {
        /// Target player.
        id: PlayerId,
    },
    /// Zero a single player's score and pending delta.
    ResetPlayer {
        /// Target player.
        id: PlayerId,
    },
    /// Change a player's display name.
    RenamePlayer {
        /// Target player.
        id: PlayerId,
        /// New display name (trimmed before use).
        name: String,
    },
    /// Zero every player's score and pending delta.
    ResetAll,
    /// Merge a player's pending delta into their score.
    ApplyPending {
        /// Target player.
        id: PlayerId,
    },
    /// Flip hidden mode and clear every reveal flag.
    ToggleHideTotals,
    /// Show one player's true total while totals are hidden.
    RevealOne {
        /// Target player.
        id: PlayerId,
    },
    /// Hide one player's total again.
    HideOne {
        /// Target player.
        id: PlayerId,
    },
}

impl Command {
    /// Stable short name used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::AddPlayer { .. } => "add_player",
            Command::Increment { .. } => "increment",
            Command::Decrement { .. } => "decrement",
            Command::RemovePlayer { .. } => "remove_player",
            Command::ResetPlayer { .. } => "reset_player",
            Command::RenamePlayer { .. } => "rename_player",
            Command::ResetAll => "reset_all",
            Command::ApplyPending { .. } => "apply_pending",
            Command::ToggleHideTotals => "toggle_hide_totals",
            Command::RevealOne { .. } => "reveal_one",
            Command::HideOne { .. } => "hide_one",
        }
    }
}

/// Compute the next session for `command`.
///
/// Total over the command set: an unmet precondition (unknown id, blank name, ...)
/// returns the session unchanged.
pub fn transition(mut session: Session, command: &Command) -> Session {
    match command {
        Command::AddPlayer { name } => {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                session.push(Player::new(trimmed.to_owned()));
            }
        }
        Command::Increment { id } => adjust(&mut session, id, 1),
        Command::Decrement { id } => adjust(&mut session, id, -1),
        Command::RemovePlayer { id } => {
            session.remove(id);
        }
        Command::ResetPlayer { id } => {
            if let Some(player) = session.player_mut(id) {
                player.score = 0;
                player.pending_delta = 0;
            }
        }
        Command::RenamePlayer { id, name } => {
            let trimmed = name.trim();
            if let Some(player) = session.player_mut(id) {
                if !trimmed.is_empty() && player.name != trimmed {
                    player.name = trimmed.to_owned();
                }
            }
        }
        Command::ResetAll => {
            for player in session.players_mut() {
                player.score = 0;
                player.pending_delta = 0;
            }
        }
        Command::ApplyPending { id } => {
            if let Some(player) = session.player_mut(id) {
                player.score = player.true_total();
                player.pending_delta = 0;
            }
        }
        Command::ToggleHideTotals => {
            let next = !session.hide_totals();
            session.set_hide_totals(next);
            for player in session.players_mut() {
                player.revealed = false;
            }
        }
        Command::RevealOne { id } => set_revealed(&mut session, id, true),
        Command::HideOne { id } => set_revealed(&mut session, id, false),
    }

    session
}

/// Route a ±1 press to the visible score or, in hidden mode, to the pending delta.
fn adjust(session: &mut Session, id: &PlayerId, step: i64) {
    let hidden = session.hide_totals();
    let Some(player) = session.player_mut(id) else {
        return;
    };

    if hidden {
        player.pending_delta = player.pending_delta.saturating_add(step);
    } else {
        player.score = player.score.saturating_add(step);
    }
}

fn set_revealed(session: &mut Session, id: &PlayerId, revealed: bool) {
    if let Some(player) = session.player_mut(id) {
        player.revealed = revealed;
    }
}

/// Result of dispatching a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The session changed; carries the new version.
    Changed {
        /// Version after the transition.
        version: usize,
    },
    /// The command was a no-op.
    Unchanged,
}

impl DispatchOutcome {
    /// Whether the dispatch produced a new session.
    pub fn is_changed(&self) -> bool {
        matches!(self, DispatchOutcome::Changed { .. })
    }
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current session.
    pub session: Session,
    /// Version number of the state machine (increments on each effective transition).
    pub version: usize,
}

/// Owner of the canonical session, applying commands one at a time.
#[derive(Debug, Clone, Default)]
pub struct SessionStateMachine {
    session: Session,
    version: usize,
}

impl SessionStateMachine {
    /// Create a state machine around a restored or fresh session.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            version: 0,
        }
    }

    /// Borrow the current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of effective transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session: self.session.clone(),
            version: self.version,
        }
    }

    /// Apply `command`, bumping the version only when the session actually changed.
    pub fn dispatch(&mut self, command: &Command) -> DispatchOutcome {
        let next = transition(self.session.clone(), command);
        if next == self.session {
            return DispatchOutcome::Unchanged;
        }

        self.session = next;
        self.version += 1;
        DispatchOutcome::Changed {
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(session: Session, commands: &[Command]) -> Session {
        commands.iter().fold(session, transition)
    }

    fn player(id: &str, name: &str, score: i64) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            score,
            created_at: 1_700_000_000_000,
            pending_delta: 0,
            revealed: false,
        }
    }

    fn only_player(session: &Session) -> &Player {
        assert_eq!(session.len(), 1);
        session.players().next().unwrap()
    }

    fn inc(id: &str) -> Command {
        Command::Increment { id: id.into() }
    }

    fn dec(id: &str) -> Command {
        Command::Decrement { id: id.into() }
    }

    #[test]
    fn add_increment_decrement_scenario() {
        let session = transition(
            Session::new(),
            &Command::AddPlayer {
                name: "Ann".into(),
            },
        );
        let ann = only_player(&session);
        assert_eq!(ann.name, "Ann");
        assert_eq!(ann.score, 0);
        let id = ann.id.clone();

        let session = run(
            session,
            &[
                Command::Increment { id: id.clone() },
                Command::Increment { id: id.clone() },
                Command::Increment { id: id.clone() },
            ],
        );
        assert_eq!(only_player(&session).score, 3);

        let session = transition(session, &Command::Decrement { id });
        assert_eq!(only_player(&session).score, 2);
    }

    #[test]
    fn add_player_trims_and_ignores_blank_names() {
        let session = run(
            Session::new(),
            &[
                Command::AddPlayer { name: "   ".into() },
                Command::AddPlayer { name: "".into() },
                Command::AddPlayer {
                    name: "  Bob ".into(),
                },
            ],
        );

        assert_eq!(only_player(&session).name, "Bob");
    }

    #[test]
    fn add_player_appends_in_insertion_order() {
        let session = run(
            Session::new(),
            &[
                Command::AddPlayer { name: "Ann".into() },
                Command::AddPlayer { name: "Bob".into() },
                Command::AddPlayer { name: "Cid".into() },
            ],
        );

        let names: Vec<_> = session.players().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bob", "Cid"]);
    }

    #[test]
    fn hidden_mode_accumulates_pending_then_applies() {
        let session = Session::restore(vec![player("p", "Pat", 5)], true);

        let session = run(session, &[inc("p"), inc("p"), dec("p")]);
        let pat = only_player(&session);
        assert_eq!(pat.score, 5);
        assert_eq!(pat.pending_delta, 1);

        let session = transition(session, &Command::ApplyPending { id: "p".into() });
        let pat = only_player(&session);
        assert_eq!(pat.score, 6);
        assert_eq!(pat.pending_delta, 0);
    }

    #[test]
    fn hidden_mode_never_touches_score() {
        let session = Session::restore(vec![player("p", "Pat", -4)], true);
        let presses = [inc("p"), dec("p"), dec("p"), dec("p"), inc("p"), dec("p")];

        let session = run(session, &presses);
        let pat = only_player(&session);
        assert_eq!(pat.score, -4);
        assert_eq!(pat.pending_delta, -2);
    }

    #[test]
    fn increments_then_decrements_restore_score() {
        let original = Session::restore(vec![player("p", "Pat", 7)], false);
        let mut commands = vec![inc("p"); 5];
        commands.extend(vec![dec("p"); 5]);

        let session = run(original.clone(), &commands);
        assert_eq!(session, original);
    }

    #[test]
    fn apply_pending_is_idempotent_and_ignores_hide_flag() {
        let mut pat = player("p", "Pat", 3);
        pat.pending_delta = -5;
        let session = Session::restore(vec![pat], false);

        let once = transition(session, &Command::ApplyPending { id: "p".into() });
        assert_eq!(only_player(&once).score, -2);
        assert_eq!(only_player(&once).pending_delta, 0);

        let twice = transition(once.clone(), &Command::ApplyPending { id: "p".into() });
        assert_eq!(twice, once);
    }

    #[test]
    fn apply_pending_does_not_reveal() {
        let session = Session::restore(vec![player("p", "Pat", 0)], true);
        let session = run(
            session,
            &[inc("p"), Command::ApplyPending { id: "p".into() }],
        );

        let pat = only_player(&session);
        assert_eq!(pat.score, 1);
        assert!(!pat.revealed);
        assert_eq!(pat.visible_score(session.hide_totals()), None);
    }

    #[test]
    fn toggle_resets_reveal_flags_both_ways() {
        let session = Session::restore(vec![player("a", "Ann", 0), player("b", "Bob", 0)], false);

        let session = transition(session, &Command::ToggleHideTotals);
        assert!(session.hide_totals());
        assert!(session.players().all(|p| !p.revealed));

        let session = transition(session, &Command::RevealOne { id: "a".into() });
        assert!(session.player(&"a".into()).unwrap().revealed);
        assert!(!session.player(&"b".into()).unwrap().revealed);

        let session = transition(session, &Command::ToggleHideTotals);
        assert!(!session.hide_totals());
        assert!(session.players().all(|p| !p.revealed));
    }

    #[test]
    fn toggle_clears_stale_reveal_flags_from_storage() {
        let mut ann = player("a", "Ann", 0);
        ann.revealed = true;
        let session = Session::restore(vec![ann], false);

        let session = transition(session, &Command::ToggleHideTotals);
        assert!(!only_player(&session).revealed);
    }

    #[test]
    fn toggle_keeps_pending_delta() {
        let session = Session::restore(vec![player("p", "Pat", 2)], true);
        let session = run(session, &[inc("p"), Command::ToggleHideTotals]);

        let pat = only_player(&session);
        assert!(!session.hide_totals());
        assert_eq!(pat.score, 2);
        assert_eq!(pat.pending_delta, 1);
        assert_eq!(pat.visible_score(false), Some(3));
    }

    #[test]
    fn reveal_and_hide_one() {
        let session = Session::restore(vec![player("a", "Ann", 0)], true);

        let session = transition(session, &Command::RevealOne { id: "a".into() });
        assert!(only_player(&session).revealed);

        let session = transition(session, &Command::HideOne { id: "a".into() });
        assert!(!only_player(&session).revealed);
    }

    #[test]
    fn reset_player_keeps_reveal_flag() {
        let mut pat = player("p", "Pat", 9);
        pat.pending_delta = 4;
        pat.revealed = true;
        let session = Session::restore(vec![pat, player("q", "Quin", 3)], true);

        let session = transition(session, &Command::ResetPlayer { id: "p".into() });
        let pat = session.player(&"p".into()).unwrap();
        assert_eq!(pat.score, 0);
        assert_eq!(pat.pending_delta, 0);
        assert!(pat.revealed);
        assert_eq!(session.player(&"q".into()).unwrap().score, 3);
    }

    #[test]
    fn reset_all_is_idempotent() {
        let mut pat = player("p", "Pat", 9);
        pat.pending_delta = -3;
        let session = Session::restore(vec![pat, player("q", "Quin", -2)], true);

        let once = transition(session, &Command::ResetAll);
        assert!(once.players().all(|p| p.score == 0 && p.pending_delta == 0));

        let twice = transition(once.clone(), &Command::ResetAll);
        assert_eq!(twice, once);
    }

    #[test]
    fn rename_trims_and_rejects_blank() {
        let session = Session::restore(vec![player("a", "Bea", 0)], false);

        let session = transition(
            session,
            &Command::RenamePlayer {
                id: "a".into(),
                name: "".into(),
            },
        );
        assert_eq!(only_player(&session).name, "Bea");

        let session = transition(
            session,
            &Command::RenamePlayer {
                id: "a".into(),
                name: "  Ann  ".into(),
            },
        );
        assert_eq!(only_player(&session).name, "Ann");
    }

    #[test]
    fn remove_player_drops_only_the_target() {
        let session = Session::restore(
            vec![player("a", "Ann", 1), player("b", "Bob", 2), player("c", "Cid", 3)],
            false,
        );

        let session = transition(session, &Command::RemovePlayer { id: "b".into() });
        let ids: Vec<_> = session.players().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn unknown_id_is_a_no_op_for_every_targeted_command() {
        let mut pat = player("p", "Pat", 4);
        pat.pending_delta = 2;
        pat.revealed = true;
        let original = Session::restore(vec![pat], true);
        let ghost = PlayerId::from("ghost");

        let commands = [
            Command::Increment { id: ghost.clone() },
            Command::Decrement { id: ghost.clone() },
            Command::RemovePlayer { id: ghost.clone() },
            Command::ResetPlayer { id: ghost.clone() },
            Command::RenamePlayer {
                id: ghost.clone(),
                name: "Zed".into(),
            },
            Command::ApplyPending { id: ghost.clone() },
            Command::RevealOne { id: ghost.clone() },
            Command::HideOne { id: ghost },
        ];

        for command in &commands {
            let next = transition(original.clone(), command);
            assert_eq!(next, original, "{} should be a no-op", command.kind());
        }
    }

    #[test]
    fn score_arithmetic_saturates() {
        let session = Session::restore(vec![player("p", "Pat", i64::MAX)], false);
        let session = transition(session, &inc("p"));
        assert_eq!(only_player(&session).score, i64::MAX);
    }

    #[test]
    fn dispatch_bumps_version_only_on_change() {
        let mut sm = SessionStateMachine::new(Session::new());
        assert_eq!(sm.version(), 0);

        let outcome = sm.dispatch(&Command::AddPlayer { name: "  ".into() });
        assert_eq!(outcome, DispatchOutcome::Unchanged);
        assert_eq!(sm.version(), 0);

        let outcome = sm.dispatch(&Command::AddPlayer { name: "Ann".into() });
        assert_eq!(outcome, DispatchOutcome::Changed { version: 1 });

        let id = sm.session().players().next().unwrap().id.clone();
        let outcome = sm.dispatch(&Command::HideOne { id });
        assert!(!outcome.is_changed());

        let snapshot = sm.snapshot();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.session.len(), 1);
    }

    #[test]
    fn toggle_on_empty_session_still_changes_flag() {
        let mut sm = SessionStateMachine::default();
        assert!(sm.dispatch(&Command::ToggleHideTotals).is_changed());
        assert!(sm.session().hide_totals());
    }
}
