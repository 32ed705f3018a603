use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Concursillo Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::admin::list_questionnaires,
        crate::routes::admin::create_questionnaire,
        crate::routes::admin::get_questionnaire,
        crate::routes::admin::update_questionnaire,
        crate::routes::admin::delete_questionnaire,
        crate::routes::host::create_room,
        crate::routes::host::get_room_state,
        crate::routes::host::start_game,
        crate::routes::host::set_phase,
        crate::routes::host::next_question,
        crate::routes::host::finish_game,
        crate::routes::host::reset_game,
        crate::routes::host::randomize_answers,
        crate::routes::host::grant_wildcard,
        crate::routes::host::complete_wildcard,
        crate::routes::host::revive_wildcard,
        crate::routes::play::join_room,
        crate::routes::play::get_player_state,
        crate::routes::play::leave_room,
        crate::routes::play::submit_answer,
        crate::routes::play::get_player_wildcards,
        crate::routes::sse::room_stream,
        crate::routes::sse::display_stream,
        crate::routes::sse::player_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::admin::QuestionInput,
            crate::dto::admin::SaveQuestionnaireRequest,
            crate::dto::admin::QuestionnaireListItem,
            crate::dto::admin::QuestionSummary,
            crate::dto::admin::QuestionnaireDetail,
            crate::dto::admin::ActionResponse,
            crate::dto::game::CreateRoomRequest,
            crate::dto::game::SetPhaseRequest,
            crate::dto::game::RoomSummary,
            crate::dto::game::PlayerSummary,
            crate::dto::game::WildcardSummary,
            crate::dto::game::WildcardSlateSummary,
            crate::dto::game::GameQuestionView,
            crate::dto::game::RoomStateResponse,
            crate::dto::game::NextQuestionResponse,
            crate::dto::game::LeaderboardEntry,
            crate::dto::game::FinishGameResponse,
            crate::dto::game::GrantWildcardRequest,
            crate::dto::game::WildcardActionRequest,
            crate::dto::game::WildcardResultResponse,
            crate::dto::play::JoinRoomRequest,
            crate::dto::play::JoinRoomResponse,
            crate::dto::play::SubmitAnswerRequest,
            crate::dto::play::PlayerQuestionView,
            crate::dto::play::PlayerStateResponse,
            crate::dao::models::RoomStatus,
            crate::state::phase::GamePhase,
            crate::state::phase::AnswerLetter,
            crate::state::wildcard::WildcardKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Questionnaire management"),
        (name = "host", description = "Host console game control"),
        (name = "play", description = "Player actions"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
