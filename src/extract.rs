/**
 * Request Extractors
 * JSON body extraction that fails with the API's own error bodies
 */
use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json`, with body rejections (415, 400, 422) rendered as
/// `{"message": ...}` through [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
