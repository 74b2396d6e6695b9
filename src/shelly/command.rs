//! Relay command execution.

use crate::error::ErrorCode;
use crate::shelly::data::{Action, CommandResult, DeviceDescriptor, DeviceState};
use crate::shelly::rpc::{self, RpcCall};
use crate::shelly::state::normalize_state;
use crate::shelly::traits::RpcTransport;
use tracing::{info, warn};

/// Validate `raw_action` and send the matching `Switch.Set` call to `device`.
///
/// An invalid action is rejected before any network call. The resulting
/// state comes from the device's echo when present; otherwise `on`/`off`
/// report the commanded state and `toggle` reports [`DeviceState::Unknown`],
/// since the post-toggle state was never confirmed.
pub async fn execute_command(
    transport: &dyn RpcTransport,
    device: &DeviceDescriptor,
    raw_action: &str,
) -> CommandResult {
    let action = match raw_action.parse::<Action>() {
        Ok(action) => action,
        Err(code) => {
            return command_result(
                device,
                raw_action,
                DeviceState::Unknown,
                "Unknown action. Allowed values: on, off, toggle.".to_string(),
                Some(code),
            );
        }
    };

    match rpc::perform(transport, device, &RpcCall::set(action)).await {
        Ok(payload) => {
            let state = match normalize_state(&payload) {
                DeviceState::Unknown => fallback_state(action),
                reported => reported,
            };
            info!("Relay '{}' {} -> {}", device.id, action, state);

            command_result(device, raw_action, state, success_message(action).to_string(), None)
        }
        Err(failure) => {
            warn!("Command {} on '{}' failed: {}", action, device.id, failure.code);

            let description = format!("Failed to change the relay state ({}).", failure.code);
            command_result(device, raw_action, DeviceState::Unknown, description, Some(failure.code))
        }
    }
}

fn fallback_state(action: Action) -> DeviceState {
    match action {
        Action::On => DeviceState::On,
        Action::Off => DeviceState::Off,
        Action::Toggle => DeviceState::Unknown,
    }
}

fn success_message(action: Action) -> &'static str {
    match action {
        Action::On => "Relay switched on.",
        Action::Off => "Relay switched off.",
        Action::Toggle => "Relay toggled.",
    }
}

fn command_result(
    device: &DeviceDescriptor,
    raw_action: &str,
    state: DeviceState,
    description: String,
    error: Option<ErrorCode>,
) -> CommandResult {
    CommandResult {
        device_id: device.id.clone(),
        label: device.display_label().to_string(),
        requested_action: raw_action.trim().to_string(),
        state,
        description,
        error,
    }
}
