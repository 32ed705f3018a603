//! In-memory [`RoomStore`] backend.
//!
//! Backs the server when no database is configured and every unit test of the
//! service layer. Semantics mirror the MongoDB backend, including the
//! compare-and-swap contract of `update_room`.

use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameQuestionEntity, GameRoomEntity, PlayerEntity, QuestionEntity, QuestionnaireEntity,
        RoomStatus,
    },
    room_store::RoomStore,
    storage::{StorageError, StorageResult},
};

/// Process-local store keeping every entity in concurrent maps.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    questionnaires: DashMap<Uuid, QuestionnaireEntity>,
    questions: DashMap<Uuid, QuestionEntity>,
    rooms: DashMap<Uuid, GameRoomEntity>,
    game_questions: DashMap<Uuid, GameQuestionEntity>,
    // IndexMap keeps global insertion order, which is per-room join order
    // once filtered. Leaderboard tie-breaking relies on it.
    players: RwLock<IndexMap<Uuid, PlayerEntity>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn remove_room_cascade(&self, id: Uuid) -> bool {
        let removed = self.inner.rooms.remove(&id).is_some();
        if removed {
            self.inner
                .game_questions
                .retain(|_, question| question.game_room_id != id);
            let mut players = self.inner.players.write().await;
            players.retain(|_, player| player.game_room_id != id);
        }
        removed
    }
}

impl RoomStore for MemoryRoomStore {
    fn save_questionnaire(
        &self,
        questionnaire: QuestionnaireEntity,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let questionnaire_id = questionnaire.id;
            store
                .inner
                .questionnaires
                .insert(questionnaire_id, questionnaire);
            store
                .inner
                .questions
                .retain(|_, question| question.questionnaire_id != questionnaire_id);
            for question in questions {
                store.inner.questions.insert(question.id, question);
            }
            Ok(())
        })
    }

    fn find_questionnaire(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionnaireEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .questionnaires
                .get(&id)
                .map(|entry| entry.clone()))
        })
    }

    fn list_questionnaires(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionnaireEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut questionnaires: Vec<QuestionnaireEntity> = store
                .inner
                .questionnaires
                .iter()
                .map(|entry| entry.clone())
                .collect();
            questionnaires.sort_by_key(|questionnaire| questionnaire.created_at);
            Ok(questionnaires)
        })
    }

    fn delete_questionnaire(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store.inner.questionnaires.remove(&id).is_some();
            if removed {
                store
                    .inner
                    .questions
                    .retain(|_, question| question.questionnaire_id != id);
            }
            Ok(removed)
        })
    }

    fn list_questions(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut questions: Vec<QuestionEntity> = store
                .inner
                .questions
                .iter()
                .filter(|entry| entry.questionnaire_id == questionnaire_id)
                .map(|entry| entry.clone())
                .collect();
            questions.sort_by_key(|question| question.order_number);
            Ok(questions)
        })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.questions.get(&id).map(|entry| entry.clone())) })
    }

    fn insert_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.rooms.insert(room.id, room);
            Ok(())
        })
    }

    fn update_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.rooms.get_mut(&room.id) {
                Some(mut stored) if stored.version + 1 == room.version => {
                    *stored = room;
                    Ok(())
                }
                _ => Err(StorageError::conflict("room")),
            }
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.rooms.get(&id).map(|entry| entry.clone())) })
    }

    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .rooms
                .iter()
                .find(|entry| entry.code == code)
                .map(|entry| entry.clone()))
        })
    }

    fn find_waiting_room_for(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .rooms
                .iter()
                .find(|entry| {
                    entry.questionnaire_id == questionnaire_id
                        && entry.status == RoomStatus::Waiting
                })
                .map(|entry| entry.clone()))
        })
    }

    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.remove_room_cascade(id).await) })
    }

    fn delete_stale_waiting_rooms(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let stale: Vec<Uuid> = store
                .inner
                .rooms
                .iter()
                .filter(|entry| entry.status == RoomStatus::Waiting && entry.created_at < cutoff)
                .map(|entry| entry.id)
                .collect();
            let mut removed = 0;
            for id in stale {
                if store.remove_room_cascade(id).await {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn insert_game_questions(
        &self,
        questions: Vec<GameQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for question in questions {
                store.inner.game_questions.insert(question.id, question);
            }
            Ok(())
        })
    }

    fn list_game_questions(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut questions: Vec<GameQuestionEntity> = store
                .inner
                .game_questions
                .iter()
                .filter(|entry| entry.game_room_id == room_id)
                .map(|entry| entry.clone())
                .collect();
            questions.sort_by_key(|question| question.order_number);
            Ok(questions)
        })
    }

    fn find_game_question(
        &self,
        room_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .game_questions
                .iter()
                .find(|entry| entry.game_room_id == room_id && entry.question_id == question_id)
                .map(|entry| entry.clone()))
        })
    }

    fn update_game_question(
        &self,
        question: GameQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.game_questions.insert(question.id, question);
            Ok(())
        })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut players = store.inner.players.write().await;
            players.insert(player.id, player);
            Ok(())
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let players = store.inner.players.read().await;
            Ok(players.get(&id).cloned())
        })
    }

    fn find_player_by_name(
        &self,
        room_id: Uuid,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let players = store.inner.players.read().await;
            Ok(players
                .values()
                .find(|player| player.game_room_id == room_id && player.name == name)
                .cloned())
        })
    }

    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let players = store.inner.players.read().await;
            Ok(players
                .values()
                .filter(|player| player.game_room_id == room_id)
                .cloned()
                .collect())
        })
    }

    fn update_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut players = store.inner.players.write().await;
            // Re-inserting an existing key keeps its position, so join order
            // survives score and answer updates.
            players.insert(player.id, player);
            Ok(())
        })
    }

    fn update_players(&self, updated: Vec<PlayerEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut players = store.inner.players.write().await;
            for player in updated {
                players.insert(player.id, player);
            }
            Ok(())
        })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut players = store.inner.players.write().await;
            Ok(players.shift_remove(&id).is_some())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::state::{
        phase::{AnswerLetter, GamePhase},
        wildcard::WildcardSlate,
    };

    fn room(created_at: SystemTime, status: RoomStatus) -> GameRoomEntity {
        GameRoomEntity {
            id: Uuid::new_v4(),
            questionnaire_id: Uuid::new_v4(),
            code: "ABCDEF".to_owned(),
            status,
            current_phase: GamePhase::Hidden,
            current_question_id: None,
            scored_question_ids: Vec::new(),
            version: 0,
            created_at,
            updated_at: created_at,
        }
    }

    fn player(room_id: Uuid, name: &str) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            game_room_id: room_id,
            name: name.to_owned(),
            score: 0,
            current_answer: None,
            session_token: Uuid::new_v4().to_string(),
            wildcards: WildcardSlate::default(),
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn update_room_rejects_stale_revisions() {
        let store = MemoryRoomStore::new();
        let mut current = room(SystemTime::now(), RoomStatus::Waiting);
        store.insert_room(current.clone()).await.unwrap();

        current.version = 1;
        current.current_phase = GamePhase::Question;
        store.update_room(current.clone()).await.unwrap();

        // A second writer holding the version-0 snapshot must lose.
        let mut stale = current.clone();
        stale.version = 1;
        stale.current_phase = GamePhase::Locked;
        let err = store.update_room(stale).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { entity: "room" }));

        let stored = store.find_room(current.id).await.unwrap().unwrap();
        assert_eq!(stored.current_phase, GamePhase::Question);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn delete_room_cascades_players_and_questions() {
        let store = MemoryRoomStore::new();
        let the_room = room(SystemTime::now(), RoomStatus::Waiting);
        let room_id = the_room.id;
        store.insert_room(the_room).await.unwrap();
        store.insert_player(player(room_id, "ana")).await.unwrap();
        store
            .insert_game_questions(vec![GameQuestionEntity {
                id: Uuid::new_v4(),
                game_room_id: room_id,
                question_id: Uuid::new_v4(),
                order_number: 1,
                answers: [
                    "a".to_owned(),
                    "b".to_owned(),
                    "c".to_owned(),
                    "d".to_owned(),
                ],
                correct_letter: AnswerLetter::A,
            }])
            .await
            .unwrap();

        assert!(store.delete_room(room_id).await.unwrap());
        assert!(store.list_players(room_id).await.unwrap().is_empty());
        assert!(store.list_game_questions(room_id).await.unwrap().is_empty());
        assert!(!store.delete_room(room_id).await.unwrap());
    }

    #[tokio::test]
    async fn stale_reaping_only_touches_old_waiting_rooms() {
        let store = MemoryRoomStore::new();
        let now = SystemTime::now();
        let old = now - Duration::from_secs(60 * 60 * 25);

        let stale_waiting = room(old, RoomStatus::Waiting);
        let old_but_playing = room(old, RoomStatus::InProgress);
        let fresh_waiting = room(now, RoomStatus::Waiting);
        let keep = [old_but_playing.id, fresh_waiting.id];

        for entity in [stale_waiting, old_but_playing, fresh_waiting] {
            store.insert_room(entity).await.unwrap();
        }

        let cutoff = now - Duration::from_secs(60 * 60 * 24);
        let removed = store.delete_stale_waiting_rooms(cutoff).await.unwrap();
        assert_eq!(removed, 1);
        for id in keep {
            assert!(store.find_room(id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn players_list_in_join_order_across_updates() {
        let store = MemoryRoomStore::new();
        let room_id = Uuid::new_v4();
        let first = player(room_id, "first");
        let second = player(room_id, "second");
        store.insert_player(first.clone()).await.unwrap();
        store.insert_player(second.clone()).await.unwrap();

        let mut boosted = first.clone();
        boosted.score = 10;
        store.update_player(boosted).await.unwrap();

        let names: Vec<String> = store
            .list_players(room_id)
            .await
            .unwrap()
            .into_iter()
            .map(|player| player.name)
            .collect();
        assert_eq!(names, ["first", "second"]);
    }
}
