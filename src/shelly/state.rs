//! Relay state normalization across Shelly firmware generations.
//!
//! Gen1 devices report `ison`, Gen2+ `Switch.GetStatus` reports `output`,
//! `Shelly.GetStatus` nests it under `switch:0`, and some proxies flatten
//! everything into `on` or `state`. The candidate paths below are tried in
//! a fixed order and the first one present wins.

use crate::shelly::data::DeviceState;
use serde_json::Value;

type Extractor = fn(&Value) -> Option<&Value>;

/// One candidate location of the relay state inside a payload.
pub struct StatePath {
    pub name: &'static str,
    extract: Extractor,
}

fn output(payload: &Value) -> Option<&Value> {
    payload.get("output")
}

fn on(payload: &Value) -> Option<&Value> {
    payload.get("on")
}

fn ison(payload: &Value) -> Option<&Value> {
    payload.get("ison")
}

fn state(payload: &Value) -> Option<&Value> {
    payload.get("state")
}

fn switch0_output(payload: &Value) -> Option<&Value> {
    payload.get("switch:0")?.get("output")
}

fn switch0_on(payload: &Value) -> Option<&Value> {
    payload.get("switch:0")?.get("on")
}

/// Candidate paths in precedence order.
pub const STATE_PATHS: [StatePath; 6] = [
    StatePath { name: "output", extract: output },
    StatePath { name: "on", extract: on },
    StatePath { name: "ison", extract: ison },
    StatePath { name: "state", extract: state },
    StatePath { name: "switch:0.output", extract: switch0_output },
    StatePath { name: "switch:0.on", extract: switch0_on },
];

/// Find the first present, non-null state field and coerce it.
///
/// Returns `None` when no path matches or the matched value cannot be read
/// as on/off.
pub fn extract_output_state(payload: &Value) -> Option<bool> {
    let value = STATE_PATHS
        .iter()
        .filter_map(|path| (path.extract)(payload))
        .find(|value| !value.is_null())?;

    coerce(value)
}

/// Reduce an arbitrary device payload to a tri-state.
pub fn normalize_state(payload: &Value) -> DeviceState {
    DeviceState::from(extract_output_state(payload))
}

fn coerce(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => {
            if let Some(n) = number.as_i64() {
                Some(n != 0)
            } else {
                number.as_u64().map(|n| n != 0)
            }
        }
        Value::String(text) => match text.to_lowercase().as_str() {
            "true" | "on" | "1" => Some(true),
            "false" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
