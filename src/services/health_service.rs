use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the storage backend and report whether the session is being persisted.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let repository = state.repository();
    let probe_ok = match repository.store().health_check().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            false
        }
    };

    if probe_ok && !state.is_degraded() {
        HealthResponse::ok(repository.key())
    } else {
        HealthResponse::degraded(repository.key())
    }
}
