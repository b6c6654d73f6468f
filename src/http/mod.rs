//! HTTP server module.
//!
//! Binds the configured address, serves the router, and shuts down
//! gracefully on SIGTERM/SIGINT so an orchestrator's in-flight health
//! checks are answered before the process exits.

mod server;
mod shutdown;

pub use server::{listen_addr, start_server, ServerError};
