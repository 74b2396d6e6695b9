//! Single-device status reads.

use crate::error::ErrorCode;
use crate::shelly::data::{DeviceDescriptor, DeviceState, DeviceStatusResult};
use crate::shelly::rpc::{self, RpcCall, RpcOutcome};
use crate::shelly::state::normalize_state;
use crate::shelly::traits::RpcTransport;
use serde_json::Value;
use tracing::warn;

/// Read one device's relay state with a single `Switch.GetStatus` call.
pub async fn fetch_status(transport: &dyn RpcTransport, device: &DeviceDescriptor) -> DeviceStatusResult {
    let outcome = rpc::perform(transport, device, &RpcCall::get_status()).await;
    status_from_outcome(device, outcome)
}

/// Build the status record for a finished (or failed) status call.
pub fn status_from_outcome(device: &DeviceDescriptor, outcome: RpcOutcome) -> DeviceStatusResult {
    match outcome {
        Ok(payload) => {
            let state = normalize_state(&payload);
            let description = match state {
                DeviceState::On => "Device is on.",
                DeviceState::Off => "Device is off.",
                DeviceState::Unknown => "Could not determine the relay state.",
            };

            DeviceStatusResult {
                device: device.clone(),
                state,
                description: description.to_string(),
                error: None,
                data: Some(payload),
            }
        }
        Err(failure) => status_failure(device, failure.code, failure.data),
    }
}

/// Status record for a device whose state could not be read.
pub fn status_failure(
    device: &DeviceDescriptor,
    code: ErrorCode,
    data: Option<Value>,
) -> DeviceStatusResult {
    warn!("Failed to read state of device '{}': {}", device.id, code);

    DeviceStatusResult {
        device: device.clone(),
        state: DeviceState::Unknown,
        description: format!("Failed to read the device state ({}).", code),
        error: Some(code),
        data,
    }
}
