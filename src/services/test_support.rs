//! Shared fixtures for service-layer tests, backed by the in-memory store.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        models::{
            GameQuestionEntity, GameRoomEntity, PlayerEntity, QuestionEntity, QuestionnaireEntity,
        },
        room_store::{RoomStore, memory::MemoryRoomStore},
        storage::{StorageError, StorageResult},
    },
    dto::{
        admin::{QuestionInput, SaveQuestionnaireRequest},
        game::{CreateRoomRequest, RoomStateResponse},
        play::{JoinRoomRequest, JoinRoomResponse},
    },
    services::{questionnaire_service, room_service},
    state::{AppState, SharedState},
};

pub(crate) async fn test_state() -> SharedState {
    let state = AppState::new(AppConfig::default());
    state
        .set_room_store(Arc::new(MemoryRoomStore::new()))
        .await;
    state
}

/// State backed by a [`FlakyRoomStore`], for exercising storage error paths.
pub(crate) async fn flaky_test_state() -> (SharedState, Arc<FlakyRoomStore>) {
    let state = AppState::new(AppConfig::default());
    let store = Arc::new(FlakyRoomStore::new());
    state.set_room_store(store.clone()).await;
    (state, store)
}

/// In-memory store that can be told to fail bulk player updates.
pub(crate) struct FlakyRoomStore {
    inner: MemoryRoomStore,
    fail_player_updates: AtomicBool,
}

impl FlakyRoomStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryRoomStore::new(),
            fail_player_updates: AtomicBool::new(false),
        }
    }

    pub(crate) fn fail_player_updates(&self, fail: bool) {
        self.fail_player_updates.store(fail, Ordering::SeqCst);
    }

    fn injected_failure<T>() -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
    {
        Box::pin(async {
            Err(StorageError::unavailable(
                "injected failure".to_owned(),
                std::io::Error::other("injected failure"),
            ))
        })
    }
}

impl RoomStore for FlakyRoomStore {
    fn save_questionnaire(
        &self,
        questionnaire: QuestionnaireEntity,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_questionnaire(questionnaire, questions)
    }

    fn find_questionnaire(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionnaireEntity>>> {
        self.inner.find_questionnaire(id)
    }

    fn list_questionnaires(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionnaireEntity>>> {
        self.inner.list_questionnaires()
    }

    fn delete_questionnaire(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_questionnaire(id)
    }

    fn list_questions(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        self.inner.list_questions(questionnaire_id)
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        self.inner.find_question(id)
    }

    fn insert_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_room(room)
    }

    fn update_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.update_room(room)
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        self.inner.find_room(id)
    }

    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        self.inner.find_room_by_code(code)
    }

    fn find_waiting_room_for(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        self.inner.find_waiting_room_for(questionnaire_id)
    }

    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_room(id)
    }

    fn delete_stale_waiting_rooms(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        self.inner.delete_stale_waiting_rooms(cutoff)
    }

    fn insert_game_questions(
        &self,
        questions: Vec<GameQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_game_questions(questions)
    }

    fn list_game_questions(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameQuestionEntity>>> {
        self.inner.list_game_questions(room_id)
    }

    fn find_game_question(
        &self,
        room_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameQuestionEntity>>> {
        self.inner.find_game_question(room_id, question_id)
    }

    fn update_game_question(
        &self,
        question: GameQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.update_game_question(question)
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_player(player)
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        self.inner.find_player(id)
    }

    fn find_player_by_name(
        &self,
        room_id: Uuid,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        self.inner.find_player_by_name(room_id, name)
    }

    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.inner.list_players(room_id)
    }

    fn update_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.update_player(player)
    }

    fn update_players(&self, players: Vec<PlayerEntity>) -> BoxFuture<'static, StorageResult<()>> {
        if self.fail_player_updates.load(Ordering::SeqCst) {
            return Self::injected_failure();
        }
        self.inner.update_players(players)
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_player(id)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}

pub(crate) async fn seed_questionnaire(state: &SharedState, questions: usize) -> Uuid {
    let inputs = (0..questions)
        .map(|i| QuestionInput {
            question_text: format!("question {i}"),
            correct_answer: format!("right {i}"),
            wrong_answer_1: format!("wrong {i}a"),
            wrong_answer_2: format!("wrong {i}b"),
            wrong_answer_3: format!("wrong {i}c"),
        })
        .collect();
    questionnaire_service::create_questionnaire(
        state,
        SaveQuestionnaireRequest {
            title: "Fixture".to_owned(),
            questions: inputs,
        },
    )
    .await
    .unwrap()
    .id
}

pub(crate) async fn seed_room(state: &SharedState) -> RoomStateResponse {
    let questionnaire_id = seed_questionnaire(state, 3).await;
    room_service::create_room(state, CreateRoomRequest { questionnaire_id })
        .await
        .unwrap()
}

pub(crate) fn join_request(code: &str, name: &str) -> JoinRoomRequest {
    JoinRoomRequest {
        code: code.to_owned(),
        name: name.to_owned(),
    }
}

pub(crate) async fn join(state: &SharedState, code: &str, name: &str) -> JoinRoomResponse {
    room_service::join_room(state, join_request(code, name))
        .await
        .unwrap()
}
