//! Entry point used by the web layer and the CLI.

use crate::error::ErrorCode;
use crate::shelly::batch::{BatchDispatcher, DispatchOptions};
use crate::shelly::command::execute_command;
use crate::shelly::data::{BatchResult, CommandRequest, CommandResult, DeviceSet};
use crate::shelly::traits::RpcTransport;
use std::sync::Arc;
use tracing::{error, info};

/// Owns the device set and the transport and runs list/command operations.
#[derive(Clone)]
pub struct DeviceController {
    devices: DeviceSet,
    dispatcher: Result<BatchDispatcher, String>,
}

impl DeviceController {
    pub fn new(devices: DeviceSet, transport: Arc<dyn RpcTransport>, options: DispatchOptions) -> Self {
        info!("Device controller ready with {} device(s)", devices.len());
        Self {
            devices,
            dispatcher: Ok(BatchDispatcher::new(transport, options)),
        }
    }

    /// A controller whose HTTP client could not be created.
    ///
    /// Every operation fails with `missing_capability`.
    pub fn unavailable(devices: DeviceSet, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!("Device control unavailable: {}", reason);
        Self {
            devices,
            dispatcher: Err(reason),
        }
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    fn dispatcher(&self) -> Result<&BatchDispatcher, ErrorCode> {
        self.dispatcher
            .as_ref()
            .map_err(|reason| ErrorCode::MissingCapability(reason.clone()))
    }

    /// Fails with `missing_capability` when no HTTP client is available.
    pub fn ensure_available(&self) -> Result<(), ErrorCode> {
        self.dispatcher().map(|_| ())
    }

    /// Read the state of every configured device.
    ///
    /// Per-device failures are reported inside the result; only a missing
    /// HTTP client fails the whole call.
    pub async fn list(&self) -> Result<BatchResult, ErrorCode> {
        let dispatcher = self.dispatcher()?;
        Ok(dispatcher.dispatch(self.devices.as_slice()).await)
    }

    /// Run one relay command.
    ///
    /// Returns `Err` for request-level failures (`missing_capability`,
    /// `device_not_found`); device-level failures come back inside the
    /// [`CommandResult`].
    pub async fn command(&self, request: &CommandRequest) -> Result<CommandResult, ErrorCode> {
        let dispatcher = self.dispatcher()?;
        let device_id = request.device_id.trim();
        let device = self
            .devices
            .get(device_id)
            .ok_or_else(|| ErrorCode::DeviceNotFound(device_id.to_string()))?;

        Ok(execute_command(dispatcher.transport(), device, &request.action).await)
    }
}
