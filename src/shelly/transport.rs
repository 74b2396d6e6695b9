//! HTTP transport for device RPC calls, backed by `reqwest`.

use crate::error::{PanelError, Result};
use crate::shelly::rpc::RpcRequest;
use crate::shelly::traits::{RawResponse, RpcTransport, TransportFailure};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default connect timeout; devices live on the LAN.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default total request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Sends RPC requests over HTTP with short, bounded timeouts.
///
/// Connections are never pooled: each call opens its own connection, which
/// is closed when the response (or error) is dropped.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given timeouts.
    ///
    /// Fails with [`PanelError::MissingCapability`] when the HTTP client
    /// cannot be initialised at all (e.g. no usable TLS backend).
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .pool_max_idle_per_host(0)
            .user_agent(concat!("shelly_panel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PanelError::capability_error(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create a transport with the default LAN timeouts.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }
}

fn describe_failure(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn execute(&self, request: RpcRequest) -> std::result::Result<RawResponse, TransportFailure> {
        let response = self
            .client
            .post(request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| TransportFailure::new(describe_failure(&e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::new(describe_failure(&e)))?;

        Ok(RawResponse::new(status, body.to_vec()))
    }
}
