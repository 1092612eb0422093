//! Request ID tagging.
//!
//! # Responsibilities
//! - Make sure every request carries an `x-request-id` (UUID v4 when absent)
//! - Echo the ID back on the response
//! - Run the rest of the request inside a `reqId` span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Tagging is a span around the inner service; the logger is never mutated

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Instrument;

use crate::observability::with_request_id;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Read the request ID set by the outer layers.
pub fn request_id<B>(request: &axum::http::Request<B>) -> Option<&str> {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
}

async fn tag_request(request: Request, next: Next) -> Response {
    let span = with_request_id(request_id(&request).unwrap_or("unknown"));
    next.run(request).instrument(span).await
}

/// Wrap `router` so every request gets an ID and a `reqId` span.
pub fn with_request_logging<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(middleware::from_fn(tag_request))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
