use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Storage key the session is persisted under.
    pub storage_key: String,
}

impl HealthResponse {
    /// Create a health response indicating the session is being persisted.
    pub fn ok(storage_key: &str) -> Self {
        Self {
            status: "ok".to_string(),
            storage_key: storage_key.to_string(),
        }
    }

    /// Create a health response indicating persistence is currently failing.
    pub fn degraded(storage_key: &str) -> Self {
        Self {
            status: "degraded".to_string(),
            storage_key: storage_key.to_string(),
        }
    }
}
