/**
 * Authentication Routes
 * User registration, login and token verification
 */
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{extract_bearer_token, hash_password, verify_password},
    db::models::UserRecord,
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/register
/// Create a user. Email uniqueness is enforced by the store at insert time.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;

    let password_hash = hash_password(password).await?;

    state
        .store
        .insert_user(UserRecord {
            name,
            email: email.clone(),
            password_hash,
        })
        .await
        .map_err(|e| {
            tracing::warn!(email = %email, error = %e, "registration rejected");
            ApiError::from(e)
        })?;

    tracing::info!("User registered successfully: {}", email);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// POST /api/v1/login
/// Verify credentials and issue a bearer token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = match state.store.find_user(&payload.email).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Login attempt for unknown user: {}", payload.email);
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(payload.password, user.password_hash).await {
        tracing::warn!("Failed login attempt for: {}", user.email);
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(&user.email)
        .map_err(|e| ApiError::Internal(format!("failed to create token: {}", e)))?;

    tracing::info!("Successful login for user: {}", user.email);

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
    }))
}

/// POST /api/v1/verify
/// Report whether the bearer token is valid
pub async fn verify_token(State(state): State<AppState>, headers: HeaderMap) -> Json<VerifyResponse> {
    let claims = extract_bearer_token(&headers).and_then(|token| match state.tokens.verify(token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            None
        }
    });

    Json(VerifyResponse {
        success: claims.is_some(),
        valid: claims.is_some(),
        email: claims.map(|c| c.email),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        db::{memory::UnavailableStore, DocumentStore, MemoryStore},
    };
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn auth_router(store: Arc<dyn DocumentStore>) -> (Router, AppState) {
        let state = AppState::new(store, &AppConfig::default());
        let router = Router::new()
            .route("/api/v1/register", post(register))
            .route("/api/v1/login", post(login))
            .route("/api/v1/verify", post(verify_token))
            .with_state(state.clone());
        (router, state)
    }

    async fn post_json(
        app: Router,
        uri: &str,
        json: &impl serde::Serialize,
    ) -> (StatusCode, serde_json::Value) {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ada() -> RegisterRequest {
        RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_returns_created_without_password() {
        let (app, _) = auth_router(Arc::new(MemoryStore::new()));
        let (status, body) = post_json(app, "/api/v1/register", &ada()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User registered successfully");
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_twice_is_duplicate_and_keeps_first_record() {
        let store = Arc::new(MemoryStore::new());
        let (app, _) = auth_router(store.clone());
        let (status, _) = post_json(app.clone(), "/api/v1/register", &ada()).await;
        assert_eq!(status, StatusCode::CREATED);

        let second = RegisterRequest {
            name: "Imposter".to_string(),
            password: "other password".to_string(),
            ..ada()
        };
        let (status, body) = post_json(app, "/api/v1/register", &second).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User already exists");

        let stored = store.find_user("ada@example.com").await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada");
        assert!(verify_password("correct horse".to_string(), stored.password_hash).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_create_one_user() {
        let store = Arc::new(MemoryStore::new());
        let (app, _) = auth_router(store.clone());

        let attempts: Vec<_> = (0..16)
            .map(|i| {
                let app = app.clone();
                let request = RegisterRequest {
                    name: format!("Ada {}", i),
                    ..ada()
                };
                tokio::spawn(async move { post_json(app, "/api/v1/register", &request).await })
            })
            .collect();

        let mut created = 0;
        for attempt in attempts {
            let (status, body) = attempt.await.unwrap();
            if status == StatusCode::CREATED {
                created += 1;
            } else {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body["message"], "User already exists");
            }
        }
        assert_eq!(created, 1);
        assert!(store.find_user("ada@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_register_missing_field_is_json_error() {
        let (app, _) = auth_router(Arc::new(MemoryStore::new()));
        let (status, body) = post_json(
            app,
            "/api/v1/register",
            &serde_json::json!({ "email": "ada@example.com", "password": "correct horse" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["message"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_login_issues_token_for_registered_email() {
        let (app, state) = auth_router(Arc::new(MemoryStore::new()));
        post_json(app.clone(), "/api/v1/register", &ada()).await;

        let (status, body) = post_json(
            app,
            "/api/v1/login",
            &LoginRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Login successful");

        let claims = state.tokens.verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!((claims.exp - claims.iat) as u64, state.tokens.ttl().as_secs());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (app, _) = auth_router(Arc::new(MemoryStore::new()));
        post_json(app.clone(), "/api/v1/register", &ada()).await;

        let wrong_password = post_json(
            app.clone(),
            "/api/v1/login",
            &LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrongpassword".to_string(),
            },
        )
        .await;
        let unknown_user = post_json(
            app,
            "/api/v1/login",
            &LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "wrongpassword".to_string(),
            },
        )
        .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(
            wrong_password.1,
            serde_json::json!({ "message": "Invalid email or password" })
        );
    }

    #[tokio::test]
    async fn test_login_store_failure_is_internal_error() {
        let (app, _) = auth_router(Arc::new(UnavailableStore));
        let (status, body) = post_json(
            app,
            "/api/v1/login",
            &LoginRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_verify_without_token_is_invalid() {
        let (app, _) = auth_router(Arc::new(MemoryStore::new()));
        let req = Request::post("/api/v1/verify").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: VerifyResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert!(!body.valid);
        assert!(body.email.is_none());
    }

    #[tokio::test]
    async fn test_verify_with_valid_token() {
        let (app, state) = auth_router(Arc::new(MemoryStore::new()));
        let token = state.tokens.issue("ada@example.com").unwrap();
        let req = Request::post("/api/v1/verify")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: VerifyResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.valid);
        assert_eq!(body.email.as_deref(), Some("ada@example.com"));
    }
}
