//! Business logic behind the session routes: forwards commands to the shared
//! state machine and fans the resulting snapshot out to SSE subscribers.

use tracing::info;

use crate::{
    dto::{
        session::{CommandRequest, PlayerSummary, SessionSnapshot},
        validation::validate_player_id,
    },
    error::ServiceError,
    services::sse_events,
    state::{Command, SharedState, session::PlayerId},
};

/// Current session as rendered by clients.
pub async fn snapshot(state: &SharedState) -> SessionSnapshot {
    state.snapshot().await.into()
}

/// Look up a single player of the current session.
pub async fn player(state: &SharedState, id: &str) -> Result<PlayerSummary, ServiceError> {
    validate_player_id(id).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| err.code.into_owned()),
        )
    })?;

    let snapshot = state.snapshot().await;
    let hide_totals = snapshot.session.hide_totals();
    snapshot
        .session
        .player(&PlayerId::from(id))
        .map(|player| PlayerSummary::from_player(player, hide_totals))
        .ok_or_else(|| ServiceError::NotFound(format!("player `{id}` not found")))
}

/// Dispatch a command and return the resulting session.
///
/// Commands never fail: unknown ids or blank names leave the session unchanged and
/// the current snapshot is returned as is. Events are published before the session
/// lock is released, so subscribers see versions in order.
pub async fn dispatch(state: &SharedState, request: CommandRequest) -> SessionSnapshot {
    let command = Command::from(request);
    let kind = command.kind();

    let report = state
        .dispatch_with(command, |report| {
            if report.outcome.is_changed() {
                info!(command = kind, version = report.snapshot.version, "session updated");
                sse_events::broadcast_session_updated(state, SessionSnapshot::from(&report.snapshot));
            }
            if let Some(degraded) = report.degraded_changed {
                sse_events::broadcast_system_status(state, degraded);
            }
        })
        .await;

    report.snapshot.into()
}
