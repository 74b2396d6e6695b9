//! # Shelly Panel - Raspberry Pi home dashboard backend
//!
//! Reads and switches Shelly smart relays over their HTTP JSON-RPC interface
//! and serves the results to the home dashboard running on a Raspberry Pi.
//!
//! ## Features
//!
//! - **Concurrent status reads**: every device is queried at once, results keep configuration order
//! - **Fault isolation**: an unreachable device never hides the state of the others
//! - **Firmware agnostic**: Gen1 and Gen2+ answers are normalized to on / off / unknown
//! - **Library + Binary**: Use as a crate or standalone application
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shelly_panel::{PanelConfig, start_web_server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PanelConfig::load(Some("panel.toml".as_ref()))?;
//!     let controller = config.build_controller();
//!
//!     let batch = controller.list().await?;
//!     println!("{} device(s), errors: {}", batch.count, batch.has_errors);
//!
//!     start_web_server(config.web.clone(), controller).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod shelly;
pub mod web;

// Re-export public API
pub use config::{PanelConfig, RpcSettings};
pub use error::{ErrorClass, ErrorCode, PanelError, Result};
pub use shelly::{
    Action, BatchDispatcher, BatchResult, CommandRequest, CommandResult, DeviceAuth,
    DeviceController, DeviceDescriptor, DeviceSet, DeviceState, DeviceStatusResult, DispatchMode,
    DispatchOptions, HttpTransport, RpcTransport,
};

pub use web::{start_web_server, WebConfig};

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;
