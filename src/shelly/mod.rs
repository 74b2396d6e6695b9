//! Shelly relay control.
//!
//! This module talks to Shelly devices over their HTTP JSON-RPC interface:
//! building calls, sending them with short LAN timeouts, normalizing the
//! differently shaped answers of each firmware generation into a tri-state
//! and fanning status reads out across every configured device.

pub mod batch;
pub mod command;
pub mod controller;
pub mod data;
pub mod response;
pub mod rpc;
pub mod state;
pub mod status;
pub mod traits;
pub mod transport;

// Re-export commonly used items
pub use batch::{BatchDispatcher, DispatchMode, DispatchOptions};
pub use controller::DeviceController;
pub use data::{
    Action, BatchResult, CommandRequest, CommandResult, DeviceAuth, DeviceDescriptor, DeviceSet,
    DeviceState, DeviceStatusResult,
};
pub use traits::{RawResponse, RpcTransport, TransportFailure};
pub use transport::HttpTransport;
