use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_epoch_millis,
        validation::{validate_player_id, validate_player_name},
    },
    state::{
        Command, Snapshot,
        session::{Player, PlayerId},
    },
};

/// Command accepted by `POST /session/commands`, tagged by `type`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandRequest {
    /// Append a player (blank names are ignored).
    AddPlayer { name: String },
    /// +1, or +1 pending while totals are hidden.
    Increment { id: String },
    /// -1, or -1 pending while totals are hidden.
    Decrement { id: String },
    /// Remove a player.
    RemovePlayer { id: String },
    /// Zero one player's score and pending delta.
    ResetPlayer { id: String },
    /// Rename a player (blank or unchanged names are ignored).
    RenamePlayer { id: String, name: String },
    /// Zero every score and pending delta.
    ResetAll,
    /// Merge one player's pending delta into the score.
    ApplyPending { id: String },
    /// Flip hidden mode, clearing every reveal flag.
    ToggleHideTotals,
    /// Reveal one player's true total.
    RevealOne { id: String },
    /// Hide one player's total again.
    HideOne { id: String },
}

impl CommandRequest {
    fn id(&self) -> Option<&str> {
        match self {
            CommandRequest::Increment { id }
            | CommandRequest::Decrement { id }
            | CommandRequest::RemovePlayer { id }
            | CommandRequest::ResetPlayer { id }
            | CommandRequest::RenamePlayer { id, .. }
            | CommandRequest::ApplyPending { id }
            | CommandRequest::RevealOne { id }
            | CommandRequest::HideOne { id } => Some(id),
            CommandRequest::AddPlayer { .. }
            | CommandRequest::ResetAll
            | CommandRequest::ToggleHideTotals => None,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            CommandRequest::AddPlayer { name } | CommandRequest::RenamePlayer { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }
}

impl Validate for CommandRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(id) = self.id() {
            if let Err(e) = validate_player_id(id) {
                errors.add("id", e);
            }
        }

        if let Some(name) = self.name() {
            if let Err(e) = validate_player_name(name) {
                errors.add("name", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<CommandRequest> for Command {
    fn from(value: CommandRequest) -> Self {
        match value {
            CommandRequest::AddPlayer { name } => Command::AddPlayer { name },
            CommandRequest::Increment { id } => Command::Increment { id: id.into() },
            CommandRequest::Decrement { id } => Command::Decrement { id: id.into() },
            CommandRequest::RemovePlayer { id } => Command::RemovePlayer { id: id.into() },
            CommandRequest::ResetPlayer { id } => Command::ResetPlayer { id: id.into() },
            CommandRequest::RenamePlayer { id, name } => Command::RenamePlayer {
                id: PlayerId::from(id),
                name,
            },
            CommandRequest::ResetAll => Command::ResetAll,
            CommandRequest::ApplyPending { id } => Command::ApplyPending { id: id.into() },
            CommandRequest::ToggleHideTotals => Command::ToggleHideTotals,
            CommandRequest::RevealOne { id } => Command::RevealOne { id: id.into() },
            CommandRequest::HideOne { id } => Command::HideOne { id: id.into() },
        }
    }
}

/// Player as rendered by clients.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Merged score, the authoritative total outside of hidden mode.
    pub score: i64,
    /// Hidden-mode presses not merged yet.
    pub pending_delta: i64,
    /// Whether the true total is shown while totals are hidden.
    pub revealed: bool,
    /// Creation time, RFC 3339.
    pub created_at: String,
    /// Total viewers may see; `null` while hidden and not revealed.
    pub visible_score: Option<i64>,
    /// Whether a pending delta is waiting to be applied.
    pub has_pending: bool,
}

impl PlayerSummary {
    /// Project a player for display under the given hidden-mode flag.
    pub fn from_player(player: &Player, hide_totals: bool) -> Self {
        Self {
            id: player.id.to_string(),
            name: player.name.clone(),
            score: player.score,
            pending_delta: player.pending_delta,
            revealed: player.revealed,
            created_at: format_epoch_millis(player.created_at),
            visible_score: player.visible_score(hide_totals),
            has_pending: player.has_pending(),
        }
    }
}

/// Read-only session snapshot returned after every command.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Number of effective transitions since startup.
    pub version: usize,
    /// Hidden mode flag.
    pub hide_totals: bool,
    /// Players in display order.
    pub players: Vec<PlayerSummary>,
}

impl From<&Snapshot> for SessionSnapshot {
    fn from(value: &Snapshot) -> Self {
        let hide_totals = value.session.hide_totals();
        Self {
            version: value.version,
            hide_totals,
            players: value
                .session
                .players()
                .map(|player| PlayerSummary::from_player(player, hide_totals))
                .collect(),
        }
    }
}

impl From<Snapshot> for SessionSnapshot {
    fn from(value: Snapshot) -> Self {
        (&value).into()
    }
}
