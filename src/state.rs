//! Shared application state for the health middleware.

use std::sync::Arc;

use crate::engine::HealthCheckEngine;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the configured engine and the exact path it is mounted at.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<HealthCheckEngine>,
    pub mount_path: Arc<str>,
}

impl AppState {
    pub fn new(engine: HealthCheckEngine, mount_path: &str) -> Self {
        Self {
            engine: Arc::new(engine),
            mount_path: Arc::from(mount_path),
        }
    }
}
