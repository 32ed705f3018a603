/// Answer submission and scoring.
pub mod answer_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game event broadcasting over the channel bus.
pub mod game_events;
/// Health check service.
pub mod health_service;
/// Phase control, question advancement, and game lifecycle.
pub mod phase_service;
/// Questionnaire management operations.
pub mod questionnaire_service;
/// Room creation, joining, and state projections.
pub mod room_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
/// Wildcard lifecycle operations.
pub mod wildcard_service;

#[cfg(test)]
pub(crate) mod test_support;
