use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Questionnaire admin payloads.
pub mod admin;
/// Room and host console payloads.
pub mod game;
/// Healthcheck payload.
pub mod health;
/// Player-facing payloads.
pub mod play;
/// Server-sent event payloads.
pub mod sse;
/// Field validators shared across payloads.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
