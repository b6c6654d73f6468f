//! HTTP routing for the health endpoint.
//!
//! The health check is middleware placed in front of the rest of the router,
//! so it sees every request first and only handles the exact mount path.
//! Everything it forwards lands on the fallback, which redirects to the
//! mount path.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod health;

use axum::{extract::State, middleware, response::Redirect, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::request_id_layer;
use crate::state::AppState;

pub use health::{debug_requested, health_check_layer, status_code};

/// Health responses must never be served from an intermediary cache
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

/// Default next handler: send the client to the health endpoint.
pub async fn redirect_to_health(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.mount_path)
}

/// Creates the Axum router with the health middleware and the redirect fallback.
pub fn create_router(state: AppState) -> Router {
    create_router_with_fallback(
        state.clone(),
        Router::new()
            .fallback(redirect_to_health)
            .with_state(state),
    )
}

/// Mount the health middleware in front of an existing router.
///
/// Requests that are not for the mount path reach `inner` unchanged.
pub fn create_router_with_fallback(state: AppState, inner: Router) -> Router {
    inner
        .layer(middleware::from_fn_with_state(state, health_check_layer))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
