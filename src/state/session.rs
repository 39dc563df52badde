use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Opaque player identifier, assigned once at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Allocate a fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tracked participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identifier.
    pub id: PlayerId,
    /// Display name, never empty after trimming.
    pub name: String,
    /// Authoritative total outside of hidden mode.
    pub score: i64,
    /// Creation timestamp (epoch milliseconds), informational only.
    pub created_at: i64,
    /// Increments and decrements recorded in hidden mode and not merged yet.
    pub pending_delta: i64,
    /// Whether this player's true total is shown despite hidden mode.
    pub revealed: bool,
}

impl Player {
    /// Build a brand-new player with a zero score and a fresh identifier.
    ///
    /// The caller is responsible for passing an already trimmed, non-empty name.
    pub fn new(name: String) -> Self {
        Self {
            id: PlayerId::generate(),
            name,
            score: 0,
            created_at: now_millis(),
            pending_delta: 0,
            revealed: false,
        }
    }

    /// Score including any delta that has not been applied yet.
    pub fn true_total(&self) -> i64 {
        self.score.saturating_add(self.pending_delta)
    }

    /// Whether hidden-mode presses are waiting to be applied.
    pub fn has_pending(&self) -> bool {
        self.pending_delta != 0
    }

    /// Total that may be displayed to viewers, `None` while it must stay hidden.
    ///
    /// Outside of hidden mode, or once the player has been revealed, viewers see the
    /// true total (score plus pending delta).
    pub fn visible_score(&self, hide_totals: bool) -> Option<i64> {
        if hide_totals && !self.revealed {
            None
        } else {
            Some(self.true_total())
        }
    }
}

/// The whole persisted unit: ordered players plus the hidden-mode flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    players: IndexMap<PlayerId, Player>,
    hide_totals: bool,
}

impl Session {
    /// Fresh session without players and with totals visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from previously stored players.
    ///
    /// Insertion order is kept. When two players share an id the first one wins.
    pub fn restore(players: impl IntoIterator<Item = Player>, hide_totals: bool) -> Self {
        let mut map = IndexMap::new();
        for player in players {
            map.entry(player.id.clone()).or_insert(player);
        }

        Self {
            players: map,
            hide_totals,
        }
    }

    /// Players in display order.
    pub fn players(&self) -> impl ExactSizeIterator<Item = &Player> {
        self.players.values()
    }

    /// Lookup a player by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Number of players in the session.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the session has no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Session-wide hidden mode flag.
    pub fn hide_totals(&self) -> bool {
        self.hide_totals
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub(crate) fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub(crate) fn push(&mut self, player: Player) {
        self.players.entry(player.id.clone()).or_insert(player);
    }

    pub(crate) fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        // shift_remove keeps the display order of the remaining players.
        self.players.shift_remove(id)
    }

    pub(crate) fn set_hide_totals(&mut self, value: bool) {
        self.hide_totals = value;
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, name: &str) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            score: 0,
            created_at: 0,
            pending_delta: 0,
            revealed: false,
        }
    }

    #[test]
    fn new_player_starts_at_zero_with_unique_id() {
        let first = Player::new("Ann".into());
        let second = Player::new("Ann".into());

        assert_eq!(first.score, 0);
        assert_eq!(first.pending_delta, 0);
        assert!(!first.revealed);
        assert!(first.created_at > 0);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn restore_keeps_order_and_first_duplicate() {
        let mut duplicate = player("a", "Shadow");
        duplicate.score = 99;

        let session = Session::restore(
            vec![player("a", "Ann"), player("b", "Bob"), duplicate],
            true,
        );

        let names: Vec<_> = session.players().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
        assert_eq!(session.player(&"a".into()).unwrap().score, 0);
        assert!(session.hide_totals());
    }

    #[test]
    fn remove_preserves_display_order() {
        let mut session = Session::restore(
            vec![player("a", "Ann"), player("b", "Bob"), player("c", "Cid")],
            false,
        );

        session.remove(&"a".into());

        let ids: Vec<_> = session.players().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn visible_score_follows_hidden_mode_and_reveal() {
        let mut p = player("a", "Ann");
        p.score = 5;
        p.pending_delta = 2;

        assert_eq!(p.visible_score(false), Some(7));
        assert_eq!(p.visible_score(true), None);

        p.revealed = true;
        assert_eq!(p.visible_score(true), Some(7));
        assert!(p.has_pending());
    }
}
