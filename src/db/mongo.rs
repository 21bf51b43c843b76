//! MongoDB-backed document store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};
use serde_json::Value;
use std::time::{Duration, Instant};

use super::{
    models::{DeleteResult, InsertResult, UpdateResult, UserRecord},
    DocumentStore, Fields, StoreError, USERS_COLLECTION,
};

const DUPLICATE_KEY_CODE: i32 = 11000;

pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect, verify the server answers, and make sure the unique email
    /// index on `users` exists.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to MongoDB...");

        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;

        let store = Self { client, db };
        store.ensure_indexes().await?;

        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users().create_index(index).await?;
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    fn users(&self) -> Collection<UserRecord> {
        self.db.collection(USERS_COLLECTION)
    }
}

fn to_document(fields: &Fields) -> Result<Document, StoreError> {
    mongodb::bson::to_document(fields).map_err(|e| StoreError::Conversion(e.to_string()))
}

/// Render a stored document as plain JSON with `_id` as a hex string.
fn to_json(document: Document) -> Value {
    let mut value = Bson::Document(document).into_relaxed_extjson();
    if let Some(fields) = value.as_object_mut() {
        let oid = fields
            .get("_id")
            .and_then(|id| id.get("$oid"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        if let Some(oid) = oid {
            fields.insert("_id".to_string(), Value::String(oid));
        }
    }
    value
}

fn render_id(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let documents: Vec<Document> = self
            .collection(collection)
            .find(doc! {})
            .await?
            .try_collect()
            .await?;
        Ok(documents.into_iter().map(to_json).collect())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Value>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": id })
            .await?;
        Ok(found.map(to_json))
    }

    async fn insert(&self, collection: &str, document: Fields) -> Result<InsertResult, StoreError> {
        let document = to_document(&document)?;
        let result = self.collection(collection).insert_one(document).await?;
        Ok(InsertResult {
            acknowledged: true,
            inserted_id: render_id(result.inserted_id),
        })
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Fields,
    ) -> Result<UpdateResult, StoreError> {
        let set = to_document(&fields)?;
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id.map(render_id),
        })
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<DeleteResult, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        match self.users().insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateUser),
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(start.elapsed())
    }

    async fn shutdown(&self) {
        tracing::info!("Closing MongoDB connection");
        self.client.clone().shutdown().await;
    }
}
