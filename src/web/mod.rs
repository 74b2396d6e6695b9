//! Web server and API endpoints for the Shelly panel.
//!
//! Exposes the relay list and command endpoints consumed by the dashboard,
//! plus a health check.

pub mod config;
pub mod handlers;
pub mod router;
pub mod security;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{PanelError, Result};
use crate::shelly::DeviceController;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Start the web server with the provided configuration and controller.
pub async fn start_web_server(config: WebConfig, controller: DeviceController) -> Result<()> {
    let app = create_app(&config, Arc::new(controller));

    // Parse the bind address
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| PanelError::config_error(format!("Invalid bind address: {}", e)))?;

    info!("Starting Shelly panel web server on http://{}", addr);
    info!("Relay list: http://{}/api/shelly/list", addr);
    info!("Relay command: POST http://{}/api/shelly/command", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PanelError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| PanelError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
