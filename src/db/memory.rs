//! In-memory document store, used when no MongoDB URI is configured.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;

use super::{
    models::{DeleteResult, InsertResult, UpdateResult, UserRecord},
    DocumentStore, Fields, StoreError,
};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Fields>>>,
    users: RwLock<Vec<UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_id(document: &Fields, id: &str) -> bool {
    document.get("_id").and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Value>, StoreError> {
        let id = id.to_hex();
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, &id)))
            .cloned()
            .map(Value::Object))
    }

    async fn insert(&self, collection: &str, document: Fields) -> Result<InsertResult, StoreError> {
        let id = ObjectId::new().to_hex();
        let mut stored = Fields::new();
        stored.insert("_id".to_string(), Value::String(id.clone()));
        stored.extend(document);

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(stored);

        Ok(InsertResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Fields,
    ) -> Result<UpdateResult, StoreError> {
        let id = id.to_hex();
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, &id)));

        let Some(document) = target else {
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
            });
        };

        let mut modified = false;
        for (key, value) in fields {
            if document.get(&key) != Some(&value) {
                document.insert(key, value);
                modified = true;
            }
        }

        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_id: None,
        })
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<DeleteResult, StoreError> {
        let id = id.to_hex();
        let mut collections = self.collections.write().await;
        let deleted = match collections.get_mut(collection) {
            Some(docs) => match docs.iter().position(|doc| has_id(doc, &id)) {
                Some(index) => {
                    docs.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: deleted,
        })
    }

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        // Check and insert under one write lock so concurrent registrations
        // cannot both pass.
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::DuplicateUser);
        }
        users.push(user);
        Ok(())
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        Ok(Duration::ZERO)
    }

    async fn shutdown(&self) {}
}

/// Store whose every operation fails, for exercising error paths.
#[cfg(test)]
pub(crate) struct UnavailableStore;

#[cfg(test)]
#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn list(&self, _: &str) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_by_id(&self, _: &str, _: ObjectId) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert(&self, _: &str, _: Fields) -> Result<InsertResult, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn update_fields(&self, _: &str, _: ObjectId, _: Fields) -> Result<UpdateResult, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete_by_id(&self, _: &str, _: ObjectId) -> Result<DeleteResult, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_user(&self, _: &str) -> Result<Option<UserRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert_user(&self, _: UserRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_list_preserves_order() {
        let store = MemoryStore::new();
        store.insert("skills", fields(json!({"title": "Go"}))).await.unwrap();
        store.insert("skills", fields(json!({"title": "Rust"}))).await.unwrap();

        let docs = store.list("skills").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["title"], "Go");
        assert_eq!(docs[1]["title"], "Rust");
        assert!(docs[0]["_id"].is_string());
    }

    #[tokio::test]
    async fn test_list_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.list("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_reports_matched_and_modified() {
        let store = MemoryStore::new();
        let inserted = store.insert("skills", fields(json!({"title": "Go"}))).await.unwrap();
        let id = ObjectId::parse_str(&inserted.inserted_id).unwrap();

        let result = store
            .update_fields("skills", id, fields(json!({"title": "Go"})))
            .await
            .unwrap();
        assert_eq!((result.matched_count, result.modified_count), (1, 0));

        let result = store
            .update_fields("skills", id, fields(json!({"title": "Golang"})))
            .await
            .unwrap();
        assert_eq!((result.matched_count, result.modified_count), (1, 1));

        let missing = store
            .update_fields("skills", ObjectId::new(), fields(json!({"title": "x"})))
            .await
            .unwrap();
        assert_eq!(missing.matched_count, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_zero() {
        let store = MemoryStore::new();
        let result = store.delete_by_id("skills", ObjectId::new()).await.unwrap();
        assert_eq!(result.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_insert_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let user = UserRecord {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "hash-1".into(),
        };
        store.insert_user(user.clone()).await.unwrap();

        let again = UserRecord {
            password_hash: "hash-2".into(),
            ..user
        };
        assert!(matches!(
            store.insert_user(again).await,
            Err(StoreError::DuplicateUser)
        ));

        let stored = store.find_user("ada@example.com").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash-1");
    }
}
