//! Data structures for Shelly devices and the outcomes reported about them.

use crate::error::{ErrorCode, PanelError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Label used when a device has neither a label nor an id.
pub const FALLBACK_LABEL: &str = "Shelly";

/// Credential sent with every RPC call to a device.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceAuth {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
}

impl DeviceAuth {
    /// Short description with secrets masked.
    pub fn describe(&self) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::Bearer { .. } => "bearer ****".to_string(),
            Self::Basic { username, .. } => format!("basic {}:****", username),
        }
    }
}

impl fmt::Debug for DeviceAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Static description of one relay on one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Unique identifier (e.g., "boiler")
    pub id: String,
    /// Display label shown on the dashboard
    pub label: String,
    /// Base URL of the device (e.g., "http://192.168.0.10"), validated per call
    pub base_url: String,
    /// Relay (switch component) index on the device
    pub relay_id: u32,
    /// Optional credential
    pub auth: DeviceAuth,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            base_url: base_url.into(),
            relay_id: 0,
            auth: DeviceAuth::None,
        }
    }

    /// Set the relay index.
    pub fn with_relay_id(mut self, relay_id: u32) -> Self {
        self.relay_id = relay_id;
        self
    }

    /// Set the credential.
    pub fn with_auth(mut self, auth: DeviceAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Label to show, falling back to the id and then to a generic name.
    pub fn display_label(&self) -> &str {
        if !self.label.trim().is_empty() {
            &self.label
        } else if !self.id.trim().is_empty() {
            &self.id
        } else {
            FALLBACK_LABEL
        }
    }
}

/// Ordered, explicitly owned set of configured devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceSet {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceSet {
    /// Build a set, rejecting duplicate ids. Input order is preserved.
    pub fn new(devices: Vec<DeviceDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for device in &devices {
            if !seen.insert(device.id.as_str()) {
                return Err(PanelError::config_error(format!(
                    "duplicate device id '{}'",
                    device.id
                )));
            }
        }
        Ok(Self { devices })
    }

    pub fn get(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|device| device.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceDescriptor> {
        self.devices.iter()
    }

    pub fn as_slice(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<'a> IntoIterator for &'a DeviceSet {
    type Item = &'a DeviceDescriptor;
    type IntoIter = std::slice::Iter<'a, DeviceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

/// Relay state as reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    On,
    Off,
    Unknown,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }
}

impl From<Option<bool>> for DeviceState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::On,
            Some(false) => Self::Off,
            None => Self::Unknown,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reading one device's relay state.
#[derive(Debug, Clone)]
pub struct DeviceStatusResult {
    pub device: DeviceDescriptor,
    pub state: DeviceState,
    pub description: String,
    pub error: Option<ErrorCode>,
    /// Decoded payload, or the raw body on HTTP/JSON errors, kept for diagnostics
    pub data: Option<serde_json::Value>,
}

impl DeviceStatusResult {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of reading every configured device.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub has_errors: bool,
    pub results: Vec<DeviceStatusResult>,
}

impl BatchResult {
    /// Wrap per-device results, deriving `count` and `has_errors` from them.
    pub fn from_results(results: Vec<DeviceStatusResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            count: results.len(),
            has_errors: results.iter().any(|result| !result.ok()),
            results,
        }
    }
}

/// Relay action a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    On,
    Off,
    Toggle,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Toggle => "toggle",
        }
    }
}

impl FromStr for Action {
    type Err = ErrorCode;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "toggle" => Ok(Self::Toggle),
            _ => Err(ErrorCode::InvalidAction(raw.trim().to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller's request to change a relay. The action is kept raw until validated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandRequest {
    #[serde(rename = "device", default)]
    pub device_id: String,
    #[serde(default)]
    pub action: String,
}

impl CommandRequest {
    pub fn new(device_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            action: action.into(),
        }
    }
}

/// Outcome of one relay command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub device_id: String,
    pub label: String,
    pub requested_action: String,
    pub state: DeviceState,
    pub description: String,
    pub error: Option<ErrorCode>,
}

impl CommandResult {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}
