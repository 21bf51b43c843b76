use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Instrument;

/// Log one line per request outcome inside a span carrying the request id.
/// Server errors log at error level, client errors at warn.
pub async fn log_request(request: Request, next: Next) -> Response {
    let started = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let span = tracing::info_span!(
        "http",
        request_id = %request_id,
        method = %request.method(),
        route = %route,
    );

    async move {
        tracing::debug!(uri = %request.uri(), "incoming request");

        let response = next.run(request).await;
        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_server_error() {
            tracing::error!(status = %status, elapsed_ms, "request failed");
        } else if status.is_client_error() {
            tracing::warn!(status = %status, elapsed_ms, "request rejected");
        } else {
            tracing::info!(status = %status, elapsed_ms, "request completed");
        }

        response
    }
    .instrument(span)
    .await
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
