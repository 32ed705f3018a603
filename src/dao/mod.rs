/// Database model definitions.
pub mod models;
/// Room, questionnaire, and player storage operations.
pub mod room_store;
/// Storage abstraction layer for database operations.
pub mod storage;
