//! Shelly JSON-RPC call building and response finalization.
//!
//! Calls are plain `POST {base_url}/rpc/{method}` requests with a JSON body
//! of the form `{"id": <relay>, ...params}`. Building a request never touches
//! the network; [`perform`] ties building, transport and finalization
//! together for a single device.

use crate::error::ErrorCode;
use crate::shelly::data::{Action, DeviceAuth, DeviceDescriptor};
use crate::shelly::traits::{RawResponse, RpcTransport, TransportFailure};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_TYPE};
use reqwest::Url;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Relay status read method.
pub const METHOD_GET_STATUS: &str = "Switch.GetStatus";

/// Relay state change method.
pub const METHOD_SET: &str = "Switch.Set";

/// Method name plus parameters, before the relay id is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub method: &'static str,
    pub params: Map<String, Value>,
}

impl RpcCall {
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            params: Map::new(),
        }
    }

    pub fn param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Status read for the device's relay.
    pub fn get_status() -> Self {
        Self::new(METHOD_GET_STATUS)
    }

    /// State change matching the requested action.
    pub fn set(action: Action) -> Self {
        let call = Self::new(METHOD_SET);
        match action {
            Action::On => call.param("on", json!(true)),
            Action::Off => call.param("on", json!(false)),
            Action::Toggle => call.param("toggle", json!(true)),
        }
    }
}

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub device_id: String,
    pub method: &'static str,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Why an RPC call did not yield a usable payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcFailure {
    pub code: ErrorCode,
    /// Response body kept for diagnostics when the device did answer
    pub data: Option<Value>,
}

impl From<ErrorCode> for RpcFailure {
    fn from(code: ErrorCode) -> Self {
        Self { code, data: None }
    }
}

/// Decoded payload or structured failure.
pub type RpcOutcome = Result<Value, RpcFailure>;

/// Parse and validate a device base URL.
pub fn parse_base_url(raw: &str) -> Result<Url, ErrorCode> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ErrorCode::MissingHost);
    }

    let url = Url::parse(trimmed).map_err(|_| ErrorCode::InvalidHost)?;
    let web_scheme = matches!(url.scheme(), "http" | "https");
    if !web_scheme || url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ErrorCode::InvalidHost);
    }

    Ok(url)
}

/// Build the outbound request for `call` against `device`.
pub fn build_request(device: &DeviceDescriptor, call: &RpcCall) -> Result<RpcRequest, ErrorCode> {
    let base = parse_base_url(&device.base_url)?;
    let endpoint = format!("{}/rpc/{}", base.as_str().trim_end_matches('/'), call.method);
    let url = Url::parse(&endpoint).map_err(|_| ErrorCode::InvalidHost)?;

    let mut body = Map::with_capacity(call.params.len() + 1);
    body.insert("id".to_string(), json!(device.relay_id));
    for (key, value) in &call.params {
        body.insert(key.clone(), value.clone());
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    if let Some(value) = authorization_header(&device.auth)? {
        headers.insert(AUTHORIZATION, value);
    }

    Ok(RpcRequest {
        device_id: device.id.clone(),
        method: call.method,
        url,
        headers,
        body: Value::Object(body).to_string().into_bytes(),
    })
}

fn authorization_header(auth: &DeviceAuth) -> Result<Option<HeaderValue>, ErrorCode> {
    let raw = match auth {
        DeviceAuth::None => return Ok(None),
        DeviceAuth::Bearer { token } => format!("Bearer {}", token),
        DeviceAuth::Basic { username, password } => {
            format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
        }
    };

    let mut value = HeaderValue::from_str(&raw).map_err(|_| ErrorCode::InvalidAuth)?;
    value.set_sensitive(true);
    Ok(Some(value))
}

/// Turn a raw transport result into a decoded payload or a structured failure.
pub fn finalize(raw: Result<RawResponse, TransportFailure>) -> RpcOutcome {
    let response = raw.map_err(|failure| RpcFailure::from(ErrorCode::Transport(failure.reason)))?;

    if !(200..300).contains(&response.status) {
        return Err(RpcFailure {
            code: ErrorCode::Http {
                status: response.status,
            },
            data: Some(Value::String(
                String::from_utf8_lossy(&response.body).into_owned(),
            )),
        });
    }

    serde_json::from_slice(&response.body).map_err(|err| RpcFailure {
        code: ErrorCode::JsonDecode(err.to_string()),
        data: Some(Value::String(
            String::from_utf8_lossy(&response.body).into_owned(),
        )),
    })
}

/// Build, send and finalize one call for one device.
pub async fn perform(
    transport: &dyn RpcTransport,
    device: &DeviceDescriptor,
    call: &RpcCall,
) -> RpcOutcome {
    let request = build_request(device, call)?;
    debug!("RPC {} -> {} ({})", call.method, device.id, request.url);
    let outcome = finalize(transport.execute(request).await);

    if let Err(failure) = &outcome {
        debug!("RPC {} on {} failed: {}", call.method, device.id, failure.code);
    }

    outcome
}
