//! Mock Shelly devices served by axum on loopback ports.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shelly_panel::{DeviceController, DeviceDescriptor, DeviceSet, DispatchOptions, HttpTransport};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Answer shape a mock device uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firmware {
    /// `{"id":0,"output":true}`
    Gen2,
    /// `{"ison":true}`
    Gen1,
    /// Always answers HTTP 500
    Broken,
}

/// Shared state of one mock relay.
pub struct MockDevice {
    pub firmware: Firmware,
    pub output: AtomicBool,
    pub required_auth: Option<String>,
    pub calls: AtomicUsize,
    pub last_body: Mutex<Option<Value>>,
    pub delay: Duration,
}

impl MockDevice {
    pub fn new(firmware: Firmware, output: bool) -> Self {
        Self {
            firmware,
            output: AtomicBool::new(output),
            required_auth: None,
            calls: AtomicUsize::new(0),
            last_body: Mutex::new(None),
            delay: Duration::ZERO,
        }
    }

    pub fn with_auth(mut self, header: impl Into<String>) -> Self {
        self.required_auth = Some(header.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn output(&self) -> bool {
        self.output.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap().clone()
    }

    fn status_body(&self) -> Value {
        let on = self.output();
        match self.firmware {
            Firmware::Gen1 => json!({"ison": on, "has_timer": false}),
            _ => json!({"id": 0, "source": "http", "output": on, "apower": 0.0}),
        }
    }
}

type Shared = Arc<MockDevice>;

async fn guard(device: &MockDevice, headers: &HeaderMap, body: &Value) -> Option<Response> {
    device.calls.fetch_add(1, Ordering::SeqCst);
    *device.last_body.lock().unwrap() = Some(body.clone());

    if !device.delay.is_zero() {
        tokio::time::sleep(device.delay).await;
    }

    if let Some(expected) = &device.required_auth {
        let presented = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return Some((StatusCode::UNAUTHORIZED, "unauthorized").into_response());
        }
    }

    if device.firmware == Firmware::Broken {
        return Some((StatusCode::INTERNAL_SERVER_ERROR, "relay fault").into_response());
    }

    None
}

async fn get_status(State(device): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(rejection) = guard(&device, &headers, &body).await {
        return rejection;
    }
    Json(device.status_body()).into_response()
}

async fn set(State(device): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(rejection) = guard(&device, &headers, &body).await {
        return rejection;
    }

    let was_on = device.output();
    let next = if body.get("toggle").and_then(Value::as_bool) == Some(true) {
        !was_on
    } else {
        body.get("on").and_then(Value::as_bool).unwrap_or(was_on)
    };
    device.output.store(next, Ordering::SeqCst);

    match device.firmware {
        // Gen1 relays echo the new state
        Firmware::Gen1 => Json(device.status_body()).into_response(),
        _ => Json(json!({"was_on": was_on})).into_response(),
    }
}

/// Start a mock device and return its base URL.
pub async fn spawn_device(device: Shared) -> String {
    let router = Router::new()
        .route("/rpc/Switch.GetStatus", post(get_status))
        .route("/rpc/Switch.Set", post(set))
        .with_state(device);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind mock device listener");
    let addr: SocketAddr = listener.local_addr().expect("Should read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{}", addr)
}

/// A base URL on which nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind listener");
    let addr = listener.local_addr().expect("Should read local addr");
    drop(listener);
    format!("http://{}", addr)
}

/// Controller over real HTTP with short timeouts.
pub fn http_controller(devices: Vec<DeviceDescriptor>) -> DeviceController {
    let transport = HttpTransport::new(Duration::from_millis(500), Duration::from_millis(1500))
        .expect("Should create HTTP transport");
    DeviceController::new(
        DeviceSet::new(devices).expect("Should build device set"),
        Arc::new(transport),
        DispatchOptions::default().with_call_timeout(Duration::from_secs(3)),
    )
}
