//! Health check endpoint for load balancers and container orchestration.
//!
//! Installed as middleware rather than a route: a request whose path is
//! exactly the mount path runs every configured probe and answers with the
//! aggregate status; any other request is passed to the next handler
//! untouched and never triggers a probe.
//!
//! | Status     | Response                |
//! |------------|-------------------------|
//! | `Ok`       | 200 OK                  |
//! | `Degraded` | 503 Service Unavailable |
//! | `TimedOut` | 504 Gateway Timeout     |
//!
//! With `?debug=true` a completed run also returns the formatted report.

use axum::{
    extract::{Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::engine::{HealthReport, OverallStatus};
use crate::state::AppState;

/// Query parameter that requests the diagnostic report
pub const DEBUG_PARAM: &str = "debug";

/// Middleware that answers on the mount path and forwards everything else.
pub async fn health_check_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() != &*state.mount_path {
        return next.run(request).await;
    }

    let verbose = debug_requested(request.uri());
    let report = state.engine.evaluate(verbose).await;

    tracing::info!(status = %report.status, debug = verbose, "Health check evaluated");

    report_response(report)
}

/// HTTP status for an aggregate verdict.
pub fn status_code(status: OverallStatus) -> StatusCode {
    match status {
        OverallStatus::Ok => StatusCode::OK,
        OverallStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        OverallStatus::TimedOut => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Whether the query string asks for the debug report.
///
/// Keys match case-insensitively and repeated values are joined with `,`
/// before parsing, so `debug=true&debug=true` is not a boolean. Absent or
/// unparsable values mean `false`.
pub fn debug_requested(uri: &Uri) -> bool {
    let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(uri) else {
        return false;
    };

    let values: Vec<&str> = pairs
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(DEBUG_PARAM))
        .map(|(_, value)| value.as_str())
        .collect();

    if values.is_empty() {
        return false;
    }

    parse_bool(&values.join(",")).unwrap_or(false)
}

/// Case-insensitive `true`/`false`, ignoring surrounding whitespace.
fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn report_response(report: HealthReport) -> Response {
    let status = status_code(report.status);
    match report.body {
        Some(rendered) => (status, [(CONTENT_TYPE, rendered.content_type)], rendered.body).into_response(),
        None => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_code(OverallStatus::Ok), StatusCode::OK);
        assert_eq!(status_code(OverallStatus::Degraded), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_code(OverallStatus::TimedOut), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_debug_absent() {
        assert!(!debug_requested(&uri("/healthcheck")));
        assert!(!debug_requested(&uri("/healthcheck?verbose=true")));
    }

    #[test]
    fn test_debug_true_variants() {
        assert!(debug_requested(&uri("/healthcheck?debug=true")));
        assert!(debug_requested(&uri("/healthcheck?debug=True")));
        assert!(debug_requested(&uri("/healthcheck?DEBUG=TRUE")));
        assert!(debug_requested(&uri("/healthcheck?debug=%20true%20")));
        assert!(debug_requested(&uri("/healthcheck?other=1&debug=true")));
    }

    #[test]
    fn test_debug_false_or_unparsable() {
        assert!(!debug_requested(&uri("/healthcheck?debug=false")));
        assert!(!debug_requested(&uri("/healthcheck?debug=1")));
        assert!(!debug_requested(&uri("/healthcheck?debug=yes")));
        assert!(!debug_requested(&uri("/healthcheck?debug=")));
        assert!(!debug_requested(&uri("/healthcheck?debug")));
    }

    #[test]
    fn test_repeated_debug_values_are_joined() {
        assert!(!debug_requested(&uri("/healthcheck?debug=true&debug=true")));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" FALSE "), Some(false));
        assert_eq!(parse_bool("tru"), None);
    }
}
