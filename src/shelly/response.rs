//! JSON shapes handed to the dashboard.

use crate::shelly::data::{BatchResult, CommandResult, DeviceState, DeviceStatusResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One device entry in a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    pub label: String,
    pub state: DeviceState,
    pub description: String,
    pub error: Option<String>,
    pub ok: bool,
}

impl From<&DeviceStatusResult> for DeviceEntry {
    fn from(result: &DeviceStatusResult) -> Self {
        Self {
            id: result.device.id.clone(),
            label: result.device.display_label().to_string(),
            state: result.state,
            description: result.description.clone(),
            error: result.error.as_ref().map(|code| code.tag().to_string()),
            ok: result.ok(),
        }
    }
}

/// Body of the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub has_errors: bool,
    pub devices: Vec<DeviceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&BatchResult> for BatchResponse {
    fn from(batch: &BatchResult) -> Self {
        Self {
            generated_at: batch.generated_at,
            count: batch.count,
            has_errors: batch.has_errors,
            devices: batch.results.iter().map(DeviceEntry::from).collect(),
            error: None,
            message: None,
        }
    }
}

impl BatchResponse {
    /// An empty, failed batch for when no device can be reached at all.
    pub fn unavailable(error: &str, message: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            count: 0,
            has_errors: true,
            devices: Vec::new(),
            error: Some(error.to_string()),
            message: Some(message.into()),
        }
    }
}

/// Device reference inside a command response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRef {
    pub id: String,
    pub label: String,
}

/// Body of the command endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub device: DeviceRef,
    pub requested_action: String,
    pub state: DeviceState,
    pub description: String,
    pub error: Option<String>,
}

impl From<&CommandResult> for CommandResponse {
    fn from(result: &CommandResult) -> Self {
        Self {
            device: DeviceRef {
                id: result.device_id.clone(),
                label: result.label.clone(),
            },
            requested_action: result.requested_action.clone(),
            state: result.state,
            description: result.description.clone(),
            error: result.error.as_ref().map(|code| code.tag().to_string()),
        }
    }
}

/// Request-level error body (`{error, message}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
