//! Transport seam between the orchestration logic and the network.

use crate::shelly::rpc::RpcRequest;
use async_trait::async_trait;

/// Raw HTTP answer from a device, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced an HTTP response (refused, timed out, DNS...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct TransportFailure {
    pub reason: String,
}

impl TransportFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Executes a single prepared RPC request against a device.
///
/// Implementations must enforce their own per-call timeouts and release the
/// underlying connection on every exit path.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send one request and return the raw response.
    async fn execute(&self, request: RpcRequest) -> Result<RawResponse, TransportFailure>;

    /// Whether several requests may be in flight at once.
    ///
    /// The batch dispatcher falls back to one-at-a-time dispatch when this
    /// returns `false`.
    fn supports_concurrency(&self) -> bool {
        true
    }
}
