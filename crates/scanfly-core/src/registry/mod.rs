// ── Device registry ──
//
// The owned service object at the center of the crate: it holds the
// published device table, the readiness channel `list_devices` waits
// on, and the shared HTTP client, and it spawns the event task that
// owns all mutable state. Constructed at startup, torn down with
// `shutdown`, never reached through globals.

pub(crate) mod events;
mod handle;
mod table;
mod worker;

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use scanfly_api::EsclClient;

use crate::config::RegistryConfig;
use crate::discovery::DiscoverySink;
use crate::error::CoreError;
use crate::parser::CapabilityParser;
use crate::registry::events::RegistryEvent;

pub use handle::DeviceHandle;
pub use table::{DeviceView, Lifecycle};

/// Device-type label reported for every listed scanner.
pub const DEVICE_TYPE: &str = "eSCL network scanner";

/// The condition `list_devices` waits on: no device still carries
/// `init_wait`, and the initial discovery sweep has finished.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Readiness {
    pub(crate) init_wait: usize,
    pub(crate) sweep_pending: bool,
}

impl Readiness {
    fn table_ready(&self) -> bool {
        self.init_wait == 0 && !self.sweep_pending
    }
}

/// One row of the device listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub model: String,
    pub device_type: &'static str,
}

/// The device registry service.
///
/// Cheaply cloneable; all clones share one table and one event task.
/// Requires a running tokio runtime to start.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    published: Arc<DashMap<String, Arc<DeviceView>>>,
    readiness: watch::Sender<Readiness>,
    events: mpsc::UnboundedSender<RegistryEvent>,
    list_timeout: std::time::Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Registry {
    /// Start a registry: build the shared HTTP client, spawn the event
    /// task, and add the statically configured devices.
    pub fn start(
        config: RegistryConfig,
        parser: Arc<dyn CapabilityParser>,
    ) -> Result<Self, CoreError> {
        let client = EsclClient::new(&config.transport)?;
        Ok(Self::start_with_client(config, client, parser))
    }

    /// Start a registry with a pre-built HTTP client (used by tests).
    pub fn start_with_client(
        config: RegistryConfig,
        client: EsclClient,
        parser: Arc<dyn CapabilityParser>,
    ) -> Self {
        let published = Arc::new(DashMap::new());
        let (readiness, _) = watch::channel(Readiness {
            init_wait: 0,
            sweep_pending: true,
        });
        let (events, events_rx) = mpsc::unbounded_channel();

        let state = worker::LoopState::new(
            Arc::clone(&published),
            readiness.clone(),
            &events,
            client,
            parser,
        );
        let worker = tokio::spawn(worker::run(state, events_rx));

        for dev in config.static_devices {
            let _ = events.send(RegistryEvent::AddStatic {
                name: dev.name,
                url: dev.url,
            });
        }

        Self {
            inner: Arc::new(RegistryInner {
                published,
                readiness,
                events,
                list_timeout: config.list_timeout,
                worker: Mutex::new(Some(worker)),
            }),
        }
    }

    /// The sink the discovery collaborator feeds events into.
    pub fn discovery(&self) -> DiscoverySink {
        DiscoverySink {
            events: self.inner.events.clone(),
            readiness: self.inner.readiness.subscribe(),
        }
    }

    /// List all ready devices, ordered by name.
    ///
    /// Waits (bounded by the configured timeout, 5 s by default) until
    /// no device is still resolving its initial fetch and the discovery
    /// sweep has finished, then snapshots the table. Devices that never
    /// became ready are simply absent — discovery failures are not
    /// reported here.
    pub async fn list_devices(&self) -> Vec<DeviceInfo> {
        let mut readiness = self.inner.readiness.subscribe();
        let wait = readiness.wait_for(Readiness::table_ready);
        if tokio::time::timeout(self.inner.list_timeout, wait)
            .await
            .is_err()
        {
            debug!("device table not ready before timeout, listing anyway");
        }

        let mut list: Vec<DeviceInfo> = self
            .inner
            .published
            .iter()
            .filter(|entry| entry.value().lifecycle() == Lifecycle::Ready)
            .map(|entry| {
                let view = entry.value();
                DeviceInfo {
                    name: view.name().to_owned(),
                    vendor: view.vendor().unwrap_or_default().to_owned(),
                    model: view.model().unwrap_or_default().to_owned(),
                    device_type: DEVICE_TYPE,
                }
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Open a device by name. Succeeds only for devices currently
    /// ready; a device mid-probe (or just deleted) is "not found".
    pub fn open(&self, name: &str) -> Result<DeviceHandle, CoreError> {
        match self.inner.published.get(name) {
            Some(entry) if entry.value().lifecycle() == Lifecycle::Ready => {
                Ok(DeviceHandle::new(Arc::clone(entry.value())))
            }
            _ => Err(CoreError::DeviceNotFound { name: name.into() }),
        }
    }

    /// Close an opened device, releasing its reference.
    pub fn close(&self, handle: DeviceHandle) {
        drop(handle);
    }

    /// Number of currently listed devices (ready or probing).
    pub fn device_count(&self) -> usize {
        self.inner.published.len()
    }

    /// Tear down: force-delete every listed device (cancelling their
    /// in-flight requests) and stop the event task. The table is empty
    /// when this returns.
    pub async fn shutdown(&self) {
        let _ = self.inner.events.send(RegistryEvent::Shutdown);
        if let Some(worker) = self.inner.worker.lock().await.take() {
            let _ = worker.await;
        }
        debug!("registry shut down");
    }
}
