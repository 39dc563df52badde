use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        session::SessionSnapshot,
        sse::{ServerEvent, SessionUpdatedEvent, SystemStatus},
    },
    state::SharedState,
};

pub(crate) const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_SESSION_UPDATED: &str = "session.updated";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the session produced by a command that changed it.
pub fn broadcast_session_updated(state: &SharedState, snapshot: SessionSnapshot) {
    send_session_event(state, EVENT_SESSION_UPDATED, &SessionUpdatedEvent(snapshot));
}

/// Broadcast that persistence started failing or recovered.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_session_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_session_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.session_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize session SSE payload"),
    }
}
