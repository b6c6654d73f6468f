//! Request ID middleware for correlating logs with requests.
//!
//! Load balancers and ingress proxies often stamp health probes with their own
//! `x-request-id`. When the incoming header holds a UUID it is kept, so the
//! prober's logs and ours line up; otherwise a fresh UUID v4 is generated.
//! Either way the ID labels a span around the whole request (all per-probe
//! logs of one run carry it) and is echoed back in the response header.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Request and response header carrying the request ID
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID of the current request, stored in request extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Reuse the caller's ID if it is a UUID, else generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let inherited = headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());

        Self(inherited.unwrap_or_else(Uuid::new_v4))
    }
}

/// Outermost layer: wraps the request, health check included, in a span.
pub async fn request_id_layer(mut request: Request, next: Next) -> Response {
    let RequestId(request_id) = RequestId::from_headers(request.headers());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    request.extensions_mut().insert(RequestId(request_id));

    async move {
        let mut response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        response
    }
    .instrument(span)
    .await
}
