//! Request ID middleware for log correlation.
//!
//! Every request runs inside a tracing span carrying its request ID, so
//! records emitted by handlers and by the booking engine can be grouped per
//! request. The ID is echoed back in the `x-request-id` response header.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Reuse the client's request ID or generate a new one
fn request_id_for(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware to add request ID to all requests and responses
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_for(request.headers());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        tracing::info!("Request started");
        let mut response = next.run(request).await;

        if let Ok(header_value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
        }

        tracing::info!(status = %response.status(), "Request completed");
        response
    }
    .instrument(span)
    .await
}
