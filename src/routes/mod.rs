/**
 * Routes Module
 * API route handlers
 */

pub mod auth;
pub mod blog;
pub mod health;
pub mod projects;
pub mod resource;
pub mod skills;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Every API route, before the shared middleware layers are applied.
pub fn api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(health::server_status))
        .route("/health", get(health::health_ping))
        .route("/health/database", get(health::health_database))
        .route("/api/v1/register", post(auth::register))
        .route("/api/v1/login", post(auth::login))
        .route("/api/v1/verify", post(auth::verify_token))
        .merge(resource::routes::<skills::Skills>(state))
        .merge(blog::routes(state))
        .merge(resource::routes::<projects::Projects>(state))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::{
        config::AppConfig,
        db::{DocumentStore, MemoryStore},
        state::AppState,
    };

    pub fn app_with(store: Arc<dyn DocumentStore>, config: &AppConfig) -> (Router, AppState) {
        let state = AppState::new(store, config);
        (crate::create_app(state.clone()), state)
    }

    /// Full app on a fresh in-memory store, plus a valid bearer token.
    pub async fn authed_app() -> (Router, String) {
        let (app, state) = app_with(Arc::new(MemoryStore::new()), &AppConfig::default());
        let token = state.tokens.issue("owner@example.com").unwrap();
        (app, token)
    }

    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(json) => req
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}
