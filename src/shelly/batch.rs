//! Batch status dispatch across many devices.
//!
//! A batch moves through `Idle -> Dispatching -> Draining -> Complete`.
//! With more than one device and a transport that allows it, every status
//! call is spawned into one [`JoinSet`] (the batch session) and results are
//! matched back to their slot through the task id, never through arrival
//! order. Each call's deadline starts when it acquires its in-flight permit,
//! so devices queued behind `max_in_flight` are not cut short. Devices whose
//! call could not complete inside the session get one final sequential call
//! before the batch completes.

use crate::shelly::data::{BatchResult, DeviceDescriptor, DeviceStatusResult};
use crate::shelly::rpc::{build_request, finalize, RpcCall};
use crate::shelly::status::{fetch_status, status_failure, status_from_outcome};
use crate::shelly::traits::RpcTransport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, warn};

/// Default cap on concurrently running device calls within one batch.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Default bound on one session call, measured from when it starts running.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// How a batch may dispatch its calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Concurrent when the transport allows it and there is more than one device
    #[default]
    Auto,
    /// Always one call at a time
    Sequential,
}

/// Tuning for the batch dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub mode: DispatchMode,
    pub max_in_flight: usize,
    pub call_timeout: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Auto,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl DispatchOptions {
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchPhase {
    Idle,
    Dispatching,
    Draining,
    Complete,
}

impl BatchPhase {
    fn advance(self) -> Self {
        let next = match self {
            Self::Idle => Self::Dispatching,
            Self::Dispatching => Self::Draining,
            Self::Draining | Self::Complete => Self::Complete,
        };
        debug!("Batch phase {:?} -> {:?}", self, next);
        next
    }
}

/// Reads the state of many devices at once.
#[derive(Clone)]
pub struct BatchDispatcher {
    transport: Arc<dyn RpcTransport>,
    options: DispatchOptions,
}

impl BatchDispatcher {
    pub fn new(transport: Arc<dyn RpcTransport>, options: DispatchOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn transport(&self) -> &dyn RpcTransport {
        self.transport.as_ref()
    }

    /// Whether a batch of `device_count` devices would run concurrently.
    pub fn uses_concurrency(&self, device_count: usize) -> bool {
        self.options.mode == DispatchMode::Auto
            && self.transport.supports_concurrency()
            && device_count > 1
    }

    /// Read every device's state. Results keep the input order.
    pub async fn dispatch(&self, devices: &[DeviceDescriptor]) -> BatchResult {
        let mut phase = BatchPhase::Idle;
        let mut slots: Vec<Option<DeviceStatusResult>> = vec![None; devices.len()];

        phase = phase.advance();
        if self.uses_concurrency(devices.len()) {
            self.run_session(devices, &mut slots).await;
        } else {
            debug!("Dispatching {} device(s) sequentially", devices.len());
        }

        phase = phase.advance();
        let mut results = Vec::with_capacity(devices.len());
        for (device, slot) in devices.iter().zip(slots) {
            let result = match slot {
                Some(result) => result,
                None => fetch_status(self.transport.as_ref(), device).await,
            };
            results.push(result);
        }

        phase.advance();
        BatchResult::from_results(results)
    }

    /// Run all calls in one bounded task group, filling `slots` by correlation key.
    ///
    /// Slots left empty (task failure, call timeout, no runtime) are
    /// completed sequentially by the caller.
    async fn run_session(&self, devices: &[DeviceDescriptor], slots: &mut [Option<DeviceStatusResult>]) {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("No tokio runtime available, falling back to sequential dispatch");
            return;
        }

        let limiter = Arc::new(Semaphore::new(self.options.max_in_flight.max(1)));
        let mut session = JoinSet::new();
        let mut correlation: HashMap<task::Id, usize> = HashMap::with_capacity(devices.len());

        for (slot, device) in devices.iter().enumerate() {
            let request = match build_request(device, &RpcCall::get_status()) {
                Ok(request) => request,
                Err(code) => {
                    slots[slot] = Some(status_failure(device, code, None));
                    continue;
                }
            };

            let transport = Arc::clone(&self.transport);
            let limiter = Arc::clone(&limiter);
            let call_timeout = self.options.call_timeout;
            let device = device.clone();
            let handle = session.spawn(async move {
                let _permit = limiter.acquire_owned().await.ok();
                let raw = tokio::time::timeout(call_timeout, transport.execute(request))
                    .await
                    .ok()?;
                Some(status_from_outcome(&device, finalize(raw)))
            });
            correlation.insert(handle.id(), slot);
        }

        debug!("Batch session started with {} call(s)", session.len());

        while let Some(joined) = session.join_next_with_id().await {
            match joined {
                Ok((id, Some(result))) => match correlation.remove(&id) {
                    Some(slot) => slots[slot] = Some(result),
                    None => warn!("Discarding result with unknown correlation key {}", id),
                },
                Ok((id, None)) => {
                    let device = correlation
                        .remove(&id)
                        .map(|slot| devices[slot].id.as_str())
                        .unwrap_or("?");
                    warn!(
                        "Batch call for '{}' exceeded {:?}, retrying sequentially",
                        device, self.options.call_timeout
                    );
                }
                Err(err) => {
                    let device = correlation
                        .remove(&err.id())
                        .map(|slot| devices[slot].id.as_str())
                        .unwrap_or("?");
                    warn!("Batch call for '{}' did not complete ({}), retrying sequentially", device, err);
                }
            }
        }

        // Release every remaining handle before the batch continues.
        session.shutdown().await;
    }
}
