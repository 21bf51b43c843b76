use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::extract_bearer_token;
use crate::{error::ApiError, state::AppState};

/// Reject requests without a valid bearer token. The verified [`Claims`]
/// are stored in the request extensions for handlers that want them.
///
/// [`Claims`]: super::Claims
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.require_auth_for_writes {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(request.headers())
        .ok_or(ApiError::Unauthorized("Authorization required"))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        ApiError::Unauthorized("Invalid or expired token")
    })?;

    tracing::debug!(email = %claims.email, "authorized write request");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
