pub mod memory;
pub mod models;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::{Map, Value};
use std::{sync::Arc, time::Duration};

use crate::config::AppConfig;
use models::{DeleteResult, InsertResult, UpdateResult, UserRecord};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// A JSON object as stored in a collection.
pub type Fields = Map<String, Value>;

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a user with this email already exists")]
    DuplicateUser,

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("document conversion failed: {0}")]
    Conversion(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything the handlers need from the document database.
///
/// Each method maps to exactly one storage operation. Identifiers arrive
/// already parsed, so a malformed id never reaches the store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of `collection`, in storage order. `_id` is rendered as
    /// a hex string.
    async fn list(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: ObjectId)
        -> Result<Option<Value>, StoreError>;

    async fn insert(&self, collection: &str, document: Fields) -> Result<InsertResult, StoreError>;

    /// Overwrite `fields` on the document with `id`, leaving other fields as
    /// they are.
    async fn update_fields(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Fields,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_by_id(&self, collection: &str, id: ObjectId)
        -> Result<DeleteResult, StoreError>;

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Fails with [`StoreError::DuplicateUser`] when the email is taken. The
    /// check is atomic with the insert.
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError>;

    /// Round-trip latency to the backing database.
    async fn ping(&self) -> Result<Duration, StoreError>;

    async fn shutdown(&self);
}

pub type SharedStore = Arc<dyn DocumentStore>;

/// Open the store described by `config`: MongoDB when a URI is set, otherwise
/// the in-memory store.
pub async fn connect(config: &AppConfig) -> Result<SharedStore, StoreError> {
    match &config.mongodb_uri {
        Some(uri) => {
            let store = MongoStore::connect(uri, &config.database_name).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("MONGODB_URI not set. Running on the in-memory store; data is not persisted.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
