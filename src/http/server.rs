//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::config::HttpServerConfig;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Resolve the configured host and port into a listen address.
pub fn listen_addr(config: &HttpServerConfig) -> Result<SocketAddr, ServerError> {
    format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Address(format!("http.host or http.port: {}", e)))
}

/// Start the HTTP server and serve until a shutdown signal drains it.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, config: &HttpServerConfig) -> Result<(), ServerError> {
    let addr = listen_addr(config)?;
    let handle = Handle::new();

    tracing::info!(%addr, "Starting HTTP server");

    shutdown::setup_shutdown_handler(handle.clone());

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr() {
        let config = HttpServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3333,
        };
        assert_eq!(listen_addr(&config).unwrap(), "127.0.0.1:3333".parse().unwrap());
    }

    #[test]
    fn test_listen_addr_rejects_hostname() {
        let config = HttpServerConfig {
            host: "not a host".to_string(),
            port: 80,
        };
        assert!(matches!(listen_addr(&config), Err(ServerError::Address(_))));
    }
}
