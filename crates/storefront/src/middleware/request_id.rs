//! Request ID middleware for request tracing and correlation.
//!
//! Every request carries an `x-request-id`: either the one an upstream
//! proxy stamped on it, or a fresh UUID v4. The ID is recorded on the
//! tracing span, tagged onto the Sentry scope, and echoed back in the
//! response headers so shopper-reported errors can be matched to logs.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn incoming_or_new_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = incoming_or_new_id(request.headers());

    // Record in current span for structured logging
    Span::current().record("request_id", &request_id);

    // Set in Sentry scope for error correlation
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    // Echo back so shoppers can quote the ID in support requests
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("edge-abc123"));
        assert_eq!(incoming_or_new_id(&headers), "edge-abc123");
    }

    #[test]
    fn test_missing_id_gets_a_uuid() {
        let id = incoming_or_new_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
