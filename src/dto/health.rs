use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when a room store is connected, `degraded` otherwise.
    pub status: String,
    /// Whether the backend is currently running without its storage backend.
    pub degraded: bool,
}

impl HealthResponse {
    /// Build the payload from the degraded flag.
    pub fn from_degraded(degraded: bool) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_owned(),
            degraded,
        }
    }
}
