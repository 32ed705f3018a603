/// Always-available in-memory backend, used in tests and when no database
/// is configured.
pub mod memory;
/// MongoDB-backed persistent storage.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    GameQuestionEntity, GameRoomEntity, PlayerEntity, QuestionEntity, QuestionnaireEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for questionnaires, rooms,
/// materialized questions, and players.
///
/// `update_room` is the only compare-and-swap operation: it succeeds when the
/// stored revision is exactly one behind the submitted entity and fails with
/// a conflict otherwise. Every other write is last-writer-wins.
pub trait RoomStore: Send + Sync {
    fn save_questionnaire(
        &self,
        questionnaire: QuestionnaireEntity,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_questionnaire(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionnaireEntity>>>;
    fn list_questionnaires(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionnaireEntity>>>;
    fn delete_questionnaire(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn list_questions(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;

    fn insert_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn update_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>>;
    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>>;
    fn find_waiting_room_for(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>>;
    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn delete_stale_waiting_rooms(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    fn insert_game_questions(
        &self,
        questions: Vec<GameQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn list_game_questions(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameQuestionEntity>>>;
    fn find_game_question(
        &self,
        room_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameQuestionEntity>>>;
    fn update_game_question(
        &self,
        question: GameQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    fn find_player_by_name(
        &self,
        room_id: Uuid,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn update_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn update_players(&self, players: Vec<PlayerEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
