/**
 * Resource CRUD
 * One set of handlers shared by every portfolio collection
 */
use axum::{
    extract::{Path, State},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;

use crate::{
    auth::middleware::require_bearer,
    db::{
        models::{DeleteResult, InsertResult, UpdateResult},
        Fields,
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

/// A document collection exposed over the CRUD routes.
pub trait Resource: Send + Sync + 'static {
    /// Collection name, also used in the route paths.
    const COLLECTION: &'static str;

    /// Singular name used in error messages.
    const LABEL: &'static str;

    /// The only fields an update may write.
    const UPDATE_FIELDS: &'static [&'static str];

    /// Adjust a document before it is inserted.
    fn prepare_insert(_document: &mut Fields) {}

    /// Adjust one update field before it is written.
    fn normalize_update(_field: &str, value: Value) -> Value {
        value
    }
}

/// Parse a path identifier. A malformed id is an internal error, not a miss.
pub fn parse_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw)
        .map_err(|e| ApiError::Internal(format!("malformed identifier {:?}: {}", raw, e)))
}

/// Keep exactly the declared update fields. Absent ones become `null`.
pub fn update_set<R: Resource>(mut payload: Fields) -> Fields {
    R::UPDATE_FIELDS
        .iter()
        .map(|&field| {
            let value = payload.remove(field).unwrap_or(Value::Null);
            (field.to_string(), R::normalize_update(field, value))
        })
        .collect()
}

/// GET /{collection}
pub async fn list<R: Resource>(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let documents = state.store.list(R::COLLECTION).await?;
    tracing::debug!(collection = R::COLLECTION, count = documents.len(), "listed documents");
    Ok(Json(documents))
}

/// GET /{collection}/{id}
pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .find_by_id(R::COLLECTION, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(R::LABEL))
}

/// POST /add-{collection}
pub async fn insert<R: Resource>(
    State(state): State<AppState>,
    ApiJson(mut document): ApiJson<Fields>,
) -> Result<Json<InsertResult>, ApiError> {
    // Identity is always assigned by the store.
    document.remove("_id");
    R::prepare_insert(&mut document);

    let result = state.store.insert(R::COLLECTION, document).await?;
    tracing::info!(collection = R::COLLECTION, id = %result.inserted_id, "document inserted");
    Ok(Json(result))
}

/// PUT /update-{collection}/{id}
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Fields>,
) -> Result<Json<UpdateResult>, ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .store
        .update_fields(R::COLLECTION, id, update_set::<R>(payload))
        .await?;
    tracing::info!(
        collection = R::COLLECTION,
        id = %id,
        matched = result.matched_count,
        modified = result.modified_count,
        "document updated"
    );
    Ok(Json(result))
}

/// DELETE /delete-{collection}/{id}
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let id = parse_id(&id)?;
    let result = state.store.delete_by_id(R::COLLECTION, id).await?;
    tracing::info!(
        collection = R::COLLECTION,
        id = %id,
        deleted = result.deleted_count,
        "document deleted"
    );
    Ok(Json(result))
}

/// List, insert, update and delete routes for `R`. Writes go through the
/// bearer-token middleware.
pub fn routes<R: Resource>(state: &AppState) -> Router<AppState> {
    let collection = R::COLLECTION;

    let writes = Router::new()
        .route(&format!("/add-{}", collection), post(insert::<R>))
        .route(&format!("/update-{}/{{id}}", collection), put(update::<R>))
        .route(&format!("/delete-{}/{{id}}", collection), delete(remove::<R>))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route(&format!("/{}", collection), get(list::<R>))
        .merge(writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Notes;

    impl Resource for Notes {
        const COLLECTION: &'static str = "notes";
        const LABEL: &'static str = "Note";
        const UPDATE_FIELDS: &'static [&'static str] = &["title", "body"];

        fn normalize_update(field: &str, value: Value) -> Value {
            match (field, value) {
                ("title", Value::String(s)) => Value::String(s.to_uppercase()),
                (_, value) => value,
            }
        }
    }

    #[test]
    fn test_update_set_keeps_only_declared_fields() {
        let payload = json!({ "title": "hi", "body": "text", "extra": 1, "_id": "x" });
        let set = update_set::<Notes>(payload.as_object().cloned().unwrap());
        assert_eq!(Value::Object(set), json!({ "title": "HI", "body": "text" }));
    }

    #[test]
    fn test_update_set_missing_fields_become_null() {
        let set = update_set::<Notes>(Fields::new());
        assert_eq!(Value::Object(set), json!({ "title": null, "body": null }));
    }

    #[test]
    fn test_parse_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_id(&oid.to_hex()).unwrap(), oid);
        assert!(matches!(parse_id("not-an-id"), Err(ApiError::Internal(_))));
    }
}
