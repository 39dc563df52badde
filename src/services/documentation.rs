use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the scorekeeping backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::session_stream,
        crate::routes::session::get_session,
        crate::routes::session::dispatch_command,
        crate::routes::session::get_player,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::CommandRequest,
            crate::dto::session::PlayerSummary,
            crate::dto::session::SessionSnapshot,
            crate::dto::sse::Handshake,
            crate::dto::sse::SessionUpdatedEvent,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Scorekeeping session commands and queries"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
