use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/session",
    tag = "sse",
    responses((status = 200, description = "Session SSE stream: a `handshake` event followed by `session.updated` and `system.status` events", content_type = "text/event-stream", body = String))
)]
/// Stream session updates to connected displays.
pub async fn session_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (receiver, handshake) = sse_service::subscribe_session(&state).await;
    info!(
        subscribers = state.session_sse().subscriber_count(),
        "New session SSE connection"
    );
    sse_service::to_sse_stream(receiver, handshake)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/session", get(session_stream))
}
