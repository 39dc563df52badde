use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::session::{CommandRequest, PlayerSummary, SessionSnapshot},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Session endpoints: read the current snapshot and dispatch commands.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/commands", post(dispatch_command))
        .route("/session/players/{id}", get(get_player))
}

/// Retrieve the current session.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Current session", body = SessionSnapshot))
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    Json(session_service::snapshot(&state).await)
}

/// Apply one command to the session and return the resulting snapshot.
///
/// Commands referring to unknown players are accepted and leave the session untouched.
#[utoipa::path(
    post,
    path = "/session/commands",
    tag = "session",
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Session after the command", body = SessionSnapshot),
        (status = 400, description = "Malformed or invalid command")
    )
)]
pub async fn dispatch_command(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CommandRequest>>,
) -> Json<SessionSnapshot> {
    Json(session_service::dispatch(&state, payload).await)
}

/// Retrieve a single player.
#[utoipa::path(
    get,
    path = "/session/players/{id}",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "Player found", body = PlayerSummary),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "No player with this identifier")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(session_service::player(&state, &id).await?))
}
