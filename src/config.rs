//! Panel configuration: TOML file plus per-device environment overrides.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [rpc]
//! dispatch = "auto"
//!
//! [[devices]]
//! id = "boiler"
//! label = "Water heater"
//! host = "http://192.168.0.10"
//! ```
//!
//! Every device value can be overridden with `APP_SHELLY_<ID>_HOST`,
//! `APP_SHELLY_<ID>_AUTH_KEY`, `APP_SHELLY_<ID>_USERNAME` and
//! `APP_SHELLY_<ID>_PASSWORD`.

use crate::error::{PanelError, Result};
use crate::shelly::batch::{DispatchMode, DispatchOptions, DEFAULT_MAX_IN_FLIGHT};
use crate::shelly::rpc::parse_base_url;
use crate::shelly::transport::{HttpTransport, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use crate::shelly::{DeviceAuth, DeviceController, DeviceDescriptor, DeviceSet};
use crate::web::WebConfig;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Extra time a batch call gets on top of one request timeout.
const CALL_GRACE: Duration = Duration::from_secs(1);

/// Top-level TOML file schema. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct PanelConfigFile {
    #[serde(default)]
    pub server: ServerFileConfig,

    #[serde(default)]
    pub rpc: RpcFileConfig,

    /// Devices in display order
    #[serde(default)]
    pub devices: Vec<DeviceFileConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub enable_cors: Option<bool>,
    pub static_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RpcFileConfig {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub dispatch: Option<DispatchMode>,
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeviceFileConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub relay_id: u32,
    pub auth_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Resolved RPC settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub dispatch: DispatchMode,
    pub max_in_flight: usize,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            dispatch: DispatchMode::Auto,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl RpcSettings {
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions::default()
            .with_mode(self.dispatch)
            .with_max_in_flight(self.max_in_flight)
            .with_call_timeout(self.request_timeout + CALL_GRACE)
    }
}

/// Fully resolved panel configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub web: WebConfig,
    pub rpc: RpcSettings,
    pub devices: DeviceSet,
}

impl PanelConfig {
    /// Load from an optional TOML file, applying environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                toml::from_str(&std::fs::read_to_string(path)?)?
            }
            None => PanelConfigFile::default(),
        };

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Parse TOML text, applying environment overrides.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::resolve(toml::from_str(text)?, |key| std::env::var(key).ok())
    }

    /// Resolve a parsed file against an environment lookup.
    pub fn resolve(file: PanelConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = WebConfig::default();
        let web = WebConfig {
            host: file.server.host.unwrap_or(defaults.host),
            port: file.server.port.unwrap_or(defaults.port),
            enable_cors: file.server.enable_cors.unwrap_or(defaults.enable_cors),
            static_path: file.server.static_dir.or(defaults.static_path),
        };

        let rpc = resolve_rpc(&file.rpc)?;

        let devices = file
            .devices
            .into_iter()
            .map(|entry| resolve_device(entry, &env))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            web,
            rpc,
            devices: DeviceSet::new(devices)?,
        })
    }

    /// Build the device controller, degrading to an unavailable controller
    /// when the HTTP client cannot be created.
    pub fn build_controller(&self) -> DeviceController {
        match HttpTransport::new(self.rpc.connect_timeout, self.rpc.request_timeout) {
            Ok(transport) => DeviceController::new(
                self.devices.clone(),
                Arc::new(transport),
                self.rpc.dispatch_options(),
            ),
            Err(err) => DeviceController::unavailable(self.devices.clone(), err.to_string()),
        }
    }
}

fn resolve_rpc(file: &RpcFileConfig) -> Result<RpcSettings> {
    let defaults = RpcSettings::default();
    let settings = RpcSettings {
        connect_timeout: file
            .connect_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.connect_timeout),
        request_timeout: file
            .request_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout),
        dispatch: file.dispatch.unwrap_or(defaults.dispatch),
        max_in_flight: file.max_in_flight.unwrap_or(defaults.max_in_flight),
    };

    if settings.connect_timeout.is_zero() || settings.request_timeout.is_zero() {
        return Err(PanelError::config_error("RPC timeouts must be greater than zero"));
    }
    if settings.max_in_flight == 0 {
        return Err(PanelError::config_error("rpc.max_in_flight must be at least 1"));
    }

    Ok(settings)
}

/// Environment variable name for a device setting, e.g. `APP_SHELLY_BOILER_HOST`.
pub fn env_key(device_id: &str, suffix: &str) -> String {
    let id: String = device_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("APP_SHELLY_{}_{}", id, suffix)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve_device(entry: DeviceFileConfig, env: &impl Fn(&str) -> Option<String>) -> Result<DeviceDescriptor> {
    let id = entry.id.trim().to_string();
    if id.is_empty() {
        return Err(PanelError::config_error("device entry without an id"));
    }

    let lookup = |suffix: &str| non_empty(env(&env_key(&id, suffix)));

    let host = lookup("HOST")
        .or_else(|| non_empty(Some(entry.host)))
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string();

    if let Err(code) = parse_base_url(&host) {
        warn!(
            "Device '{}' has an unusable host '{}' ({}); set it in the config file or {}",
            id,
            host,
            code.tag(),
            env_key(&id, "HOST")
        );
    }

    let auth_key = lookup("AUTH_KEY").or_else(|| non_empty(entry.auth_key));
    let username = lookup("USERNAME").or_else(|| non_empty(entry.username));
    let password = lookup("PASSWORD").or_else(|| non_empty(entry.password));

    let auth = match (auth_key, username, password) {
        (Some(token), _, _) => DeviceAuth::Bearer { token },
        (None, Some(username), Some(password)) => DeviceAuth::Basic { username, password },
        _ => DeviceAuth::None,
    };

    Ok(DeviceDescriptor::new(id, entry.label.trim(), host)
        .with_relay_id(entry.relay_id)
        .with_auth(auth))
}
