use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        GameQuestionDocument, PlayerDocument, QuestionDocument, QuestionnaireDocument,
        RoomDocument, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    models::{
        GameQuestionEntity, GameRoomEntity, PlayerEntity, QuestionEntity, QuestionnaireEntity,
    },
    room_store::RoomStore,
    storage::{StorageError, StorageResult},
};

const QUESTIONNAIRE_COLLECTION: &str = "questionnaires";
const QUESTION_COLLECTION: &str = "questions";
const ROOM_COLLECTION: &str = "rooms";
const GAME_QUESTION_COLLECTION: &str = "game_questions";
const PLAYER_COLLECTION: &str = "players";

/// MongoDB-backed [`RoomStore`] implementation.
#[derive(Clone)]
pub struct MongoRoomStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRoomStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let rooms = database.collection::<RoomDocument>(ROOM_COLLECTION);
        let code_index = mongodb::IndexModel::builder()
            .keys(doc! {"code": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("room_code_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        rooms
            .create_index(code_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ROOM_COLLECTION,
                index: "code",
                source,
            })?;

        let questions = database.collection::<QuestionDocument>(QUESTION_COLLECTION);
        let questionnaire_index = mongodb::IndexModel::builder()
            .keys(doc! {"questionnaire_id": 1, "order_number": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("question_questionnaire_idx".to_owned()))
                    .build(),
            )
            .build();
        questions
            .create_index(questionnaire_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION,
                index: "questionnaire_id,order_number",
                source,
            })?;

        let game_questions = database.collection::<GameQuestionDocument>(GAME_QUESTION_COLLECTION);
        let room_question_index = mongodb::IndexModel::builder()
            .keys(doc! {"game_room_id": 1, "question_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_question_room_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        game_questions
            .create_index(room_question_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_QUESTION_COLLECTION,
                index: "game_room_id,question_id",
                source,
            })?;

        let players = database.collection::<PlayerDocument>(PLAYER_COLLECTION);
        let player_room_index = mongodb::IndexModel::builder()
            .keys(doc! {"game_room_id": 1, "created_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_room_idx".to_owned()))
                    .build(),
            )
            .build();
        players
            .create_index(player_room_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION,
                index: "game_room_id,created_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn questionnaire_collection(&self) -> Collection<QuestionnaireDocument> {
        self.database()
            .await
            .collection(QUESTIONNAIRE_COLLECTION)
    }

    async fn question_collection(&self) -> Collection<QuestionDocument> {
        self.database().await.collection(QUESTION_COLLECTION)
    }

    async fn room_collection(&self) -> Collection<RoomDocument> {
        self.database().await.collection(ROOM_COLLECTION)
    }

    async fn game_question_collection(&self) -> Collection<GameQuestionDocument> {
        self.database().await.collection(GAME_QUESTION_COLLECTION)
    }

    async fn player_collection(&self) -> Collection<PlayerDocument> {
        self.database().await.collection(PLAYER_COLLECTION)
    }

    async fn save_questionnaire(
        &self,
        questionnaire: QuestionnaireEntity,
        questions: Vec<QuestionEntity>,
    ) -> MongoResult<()> {
        let questionnaire_id = questionnaire.id;
        let document: QuestionnaireDocument = questionnaire.into();
        self.questionnaire_collection()
            .await
            .replace_one(doc_id(questionnaire_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: QUESTIONNAIRE_COLLECTION,
                source,
            })?;

        let question_collection = self.question_collection().await;
        question_collection
            .delete_many(doc! {"questionnaire_id": uuid_as_binary(questionnaire_id)})
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: QUESTION_COLLECTION,
                source,
            })?;

        if !questions.is_empty() {
            let documents: Vec<QuestionDocument> =
                questions.into_iter().map(Into::into).collect();
            question_collection
                .insert_many(documents)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: QUESTION_COLLECTION,
                    source,
                })?;
        }

        Ok(())
    }

    async fn find_questionnaire(&self, id: Uuid) -> MongoResult<Option<QuestionnaireEntity>> {
        let document = self
            .questionnaire_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: QUESTIONNAIRE_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_questionnaires(&self) -> MongoResult<Vec<QuestionnaireEntity>> {
        let documents: Vec<QuestionnaireDocument> = self
            .questionnaire_collection()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: QUESTIONNAIRE_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: QUESTIONNAIRE_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_questionnaire(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .questionnaire_collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: QUESTIONNAIRE_COLLECTION,
                source,
            })?;

        self.question_collection()
            .await
            .delete_many(doc! {"questionnaire_id": uuid_as_binary(id)})
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: QUESTION_COLLECTION,
                source,
            })?;

        Ok(result.deleted_count > 0)
    }

    async fn list_questions(&self, questionnaire_id: Uuid) -> MongoResult<Vec<QuestionEntity>> {
        let documents: Vec<QuestionDocument> = self
            .question_collection()
            .await
            .find(doc! {"questionnaire_id": uuid_as_binary(questionnaire_id)})
            .sort(doc! {"order_number": 1})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: QUESTION_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_question(&self, id: Uuid) -> MongoResult<Option<QuestionEntity>> {
        let document = self
            .question_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn insert_room(&self, room: GameRoomEntity) -> MongoResult<()> {
        let document: RoomDocument = room.into();
        self.room_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: ROOM_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn update_room(&self, room: GameRoomEntity) -> StorageResult<()> {
        let id = room.id;
        let document: RoomDocument = room.into();
        let result = self
            .room_collection()
            .await
            .replace_one(
                doc! {"_id": uuid_as_binary(id), "version": document.expected_version()},
                &document,
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: ROOM_COLLECTION,
                source,
            })?;

        if result.matched_count == 0 {
            return Err(StorageError::conflict("room"));
        }
        Ok(())
    }

    async fn find_room(&self, id: Uuid) -> MongoResult<Option<GameRoomEntity>> {
        let document = self
            .room_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: ROOM_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn find_room_by_code(&self, code: String) -> MongoResult<Option<GameRoomEntity>> {
        let document = self
            .room_collection()
            .await
            .find_one(doc! {"code": code})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: ROOM_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn find_waiting_room_for(
        &self,
        questionnaire_id: Uuid,
    ) -> MongoResult<Option<GameRoomEntity>> {
        let document = self
            .room_collection()
            .await
            .find_one(doc! {
                "questionnaire_id": uuid_as_binary(questionnaire_id),
                "status": "waiting",
            })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: ROOM_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn delete_room(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .room_collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: ROOM_COLLECTION,
                source,
            })?;

        self.game_question_collection()
            .await
            .delete_many(doc! {"game_room_id": uuid_as_binary(id)})
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: GAME_QUESTION_COLLECTION,
                source,
            })?;
        self.player_collection()
            .await
            .delete_many(doc! {"game_room_id": uuid_as_binary(id)})
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: PLAYER_COLLECTION,
                source,
            })?;

        Ok(result.deleted_count > 0)
    }

    async fn delete_stale_waiting_rooms(&self, cutoff: SystemTime) -> MongoResult<u64> {
        let stale: Vec<RoomDocument> = self
            .room_collection()
            .await
            .find(doc! {
                "status": "waiting",
                "created_at": {"$lt": DateTime::from_system_time(cutoff)},
            })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: ROOM_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: ROOM_COLLECTION,
                source,
            })?;

        let mut removed = 0;
        for room in stale {
            let entity: GameRoomEntity = room.into();
            if self.delete_room(entity.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn insert_game_questions(&self, questions: Vec<GameQuestionEntity>) -> MongoResult<()> {
        if questions.is_empty() {
            return Ok(());
        }
        let documents: Vec<GameQuestionDocument> =
            questions.into_iter().map(Into::into).collect();
        self.game_question_collection()
            .await
            .insert_many(documents)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAME_QUESTION_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn list_game_questions(&self, room_id: Uuid) -> MongoResult<Vec<GameQuestionEntity>> {
        let documents: Vec<GameQuestionDocument> = self
            .game_question_collection()
            .await
            .find(doc! {"game_room_id": uuid_as_binary(room_id)})
            .sort(doc! {"order_number": 1})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: GAME_QUESTION_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: GAME_QUESTION_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_game_question(
        &self,
        room_id: Uuid,
        question_id: Uuid,
    ) -> MongoResult<Option<GameQuestionEntity>> {
        let document = self
            .game_question_collection()
            .await
            .find_one(doc! {
                "game_room_id": uuid_as_binary(room_id),
                "question_id": uuid_as_binary(question_id),
            })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: GAME_QUESTION_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn update_game_question(&self, question: GameQuestionEntity) -> MongoResult<()> {
        let id = question.id;
        let document: GameQuestionDocument = question.into();
        self.game_question_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAME_QUESTION_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn insert_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let document: PlayerDocument = player.into();
        self.player_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PLAYER_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn find_player(&self, id: Uuid) -> MongoResult<Option<PlayerEntity>> {
        let document = self
            .player_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PLAYER_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn find_player_by_name(
        &self,
        room_id: Uuid,
        name: String,
    ) -> MongoResult<Option<PlayerEntity>> {
        let document = self
            .player_collection()
            .await
            .find_one(doc! {
                "game_room_id": uuid_as_binary(room_id),
                "name": name,
            })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PLAYER_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_players(&self, room_id: Uuid) -> MongoResult<Vec<PlayerEntity>> {
        let documents: Vec<PlayerDocument> = self
            .player_collection()
            .await
            .find(doc! {"game_room_id": uuid_as_binary(room_id)})
            .sort(doc! {"created_at": 1, "_id": 1})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PLAYER_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PLAYER_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn update_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let id = player.id;
        let document: PlayerDocument = player.into();
        self.player_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PLAYER_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn delete_player(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .player_collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: PLAYER_COLLECTION,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }
}

impl RoomStore for MongoRoomStore {
    fn save_questionnaire(
        &self,
        questionnaire: QuestionnaireEntity,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_questionnaire(questionnaire, questions)
                .await
                .map_err(Into::into)
        })
    }

    fn find_questionnaire(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionnaireEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_questionnaire(id).await.map_err(Into::into) })
    }

    fn list_questionnaires(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionnaireEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questionnaires().await.map_err(Into::into) })
    }

    fn delete_questionnaire(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_questionnaire(id).await.map_err(Into::into) })
    }

    fn list_questions(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_questions(questionnaire_id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_question(id).await.map_err(Into::into) })
    }

    fn insert_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_room(room).await.map_err(Into::into) })
    }

    fn update_room(&self, room: GameRoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_room(room).await })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room(id).await.map_err(Into::into) })
    }

    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room_by_code(code).await.map_err(Into::into) })
    }

    fn find_waiting_room_for(
        &self,
        questionnaire_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameRoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_waiting_room_for(questionnaire_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_room(id).await.map_err(Into::into) })
    }

    fn delete_stale_waiting_rooms(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_stale_waiting_rooms(cutoff)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_game_questions(
        &self,
        questions: Vec<GameQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_game_questions(questions)
                .await
                .map_err(Into::into)
        })
    }

    fn list_game_questions(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_game_questions(room_id).await.map_err(Into::into) })
    }

    fn find_game_question(
        &self,
        room_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_game_question(room_id, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn update_game_question(
        &self,
        question: GameQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_game_question(question)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_player(player).await.map_err(Into::into) })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_player(id).await.map_err(Into::into) })
    }

    fn find_player_by_name(
        &self,
        room_id: Uuid,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_player_by_name(room_id, name)
                .await
                .map_err(Into::into)
        })
    }

    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_players(room_id).await.map_err(Into::into) })
    }

    fn update_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_player(player).await.map_err(Into::into) })
    }

    fn update_players(&self, players: Vec<PlayerEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for player in players {
                store.update_player(player).await?;
            }
            Ok(())
        })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_player(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
