// ── Registry event task ──
//
// The single context that drives all state transitions: discovery
// events, address probing, capability-fetch completions, and teardown.
// Fetches themselves run as spawned tasks; their results come back here
// as messages, so device state is only ever touched from this loop.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tracing::debug;
use url::Url;

use scanfly_api::EsclClient;

use crate::model::{normalize_base_url, AddrInfo};
use crate::options::OptionState;
use crate::parser::CapabilityParser;
use crate::registry::events::RegistryEvent;
use crate::registry::table::{Device, DeviceTable, DeviceView, Lifecycle};
use crate::registry::Readiness;

pub(crate) struct LoopState {
    table: DeviceTable,
    readiness: watch::Sender<Readiness>,
    // Weak so the loop itself never keeps the event channel open: once
    // every registry handle and sink is gone, `run` sees the channel
    // close and tears down instead of leaking the task.
    events: mpsc::WeakUnboundedSender<RegistryEvent>,
    client: EsclClient,
    parser: Arc<dyn CapabilityParser>,
    next_generation: u64,
    next_request: u64,
}

impl LoopState {
    pub(crate) fn new(
        published: Arc<DashMap<String, Arc<DeviceView>>>,
        readiness: watch::Sender<Readiness>,
        events: &mpsc::UnboundedSender<RegistryEvent>,
        client: EsclClient,
        parser: Arc<dyn CapabilityParser>,
    ) -> Self {
        Self {
            table: DeviceTable::new(published),
            readiness,
            events: events.downgrade(),
            client,
            parser,
            next_generation: 0,
            next_request: 0,
        }
    }

    // ── Event handlers ───────────────────────────────────────────

    fn on_found(&mut self, name: String, init_sweep: bool, addresses: Vec<AddrInfo>) {
        if self.table.contains(&name) {
            debug!(device = %name, "device already exists");
            return;
        }

        let mut dev = self.new_device(name.clone());
        dev.init_wait = init_sweep;
        dev.addresses = Some(addresses);
        debug!(device = %name, "created");
        self.table.insert(dev);

        self.probe_current(&name);
        self.refresh_readiness();
    }

    fn on_add_static(&mut self, name: String, url: &Url) {
        if self.table.contains(&name) {
            debug!(device = %name, "device already exists");
            return;
        }

        let mut dev = self.new_device(name.clone());
        dev.init_wait = true;
        dev.base_url = Some(normalize_base_url(url));
        debug!(device = %name, "created (static)");
        self.table.insert(dev);

        self.start_fetch(&name);
        self.refresh_readiness();
    }

    fn on_removed(&mut self, name: &str) {
        if self.table.contains(name) {
            self.delete_device(name);
        }
    }

    fn on_sweep_finished(&mut self) {
        debug!("initial discovery sweep finished");
        self.readiness.send_modify(|r| r.sweep_pending = false);
    }

    fn on_fetch_done(
        &mut self,
        name: &str,
        generation: u64,
        request: u64,
        result: Result<Bytes, scanfly_api::Error>,
    ) {
        let parser = Arc::clone(&self.parser);

        let failure: Option<String> = {
            let Some(dev) = self.table.get_mut(name) else {
                debug!(device = %name, "fetch completion for unknown device");
                return;
            };
            if dev.generation != generation {
                debug!(device = %name, "stale fetch completion");
                return;
            }
            dev.pending.remove(&request);

            match result {
                Err(e) => Some(e.to_string()),
                Ok(body) => match parser.parse(&body) {
                    Err(e) => Some(format!("failed to parse capability document: {e}")),
                    Ok(caps) => match caps.first_source() {
                        // A capability document must declare at least one
                        // usable source; one that doesn't can never activate.
                        None => Some("capability document declares no source".into()),
                        Some(source) => match OptionState::activate(&caps, source) {
                            None => Some("active source declares no color mode".into()),
                            Some(options) => {
                                dev.caps = Some(caps);
                                dev.options = Some(options);
                                dev.lifecycle = Lifecycle::Ready;
                                dev.init_wait = false;
                                None
                            }
                        },
                    },
                },
            }
        };

        match failure {
            None => {
                debug!(device = %name, "ready");
                self.table.publish(name);
                self.refresh_readiness();
            }
            Some(err) => {
                debug!(device = %name, error = %err, "capability fetch failed");
                self.advance_probe(name);
            }
        }
    }

    // ── Address probing ──────────────────────────────────────────

    /// Probe the current candidate address: build its base URL and
    /// start a capability fetch against it.
    fn probe_current(&mut self, name: &str) {
        let ok = {
            let Some(dev) = self.table.get_mut(name) else {
                return;
            };
            match dev.current_address() {
                Some(addr) => {
                    let url = addr.base_url();
                    debug!(device = %name, %url, "probing address");
                    dev.base_url = Some(url);
                    true
                }
                None => false,
            }
        };

        if ok {
            self.start_fetch(name);
        } else {
            // Discovery handed us an empty address list.
            self.delete_device(name);
        }
    }

    /// Advance the fallback sweep after a failed fetch: next candidate
    /// if one exists, otherwise the device is done for.
    fn advance_probe(&mut self, name: &str) {
        let has_next = {
            let Some(dev) = self.table.get_mut(name) else {
                return;
            };
            match &dev.addresses {
                Some(list) if dev.addr_index + 1 < list.len() => {
                    dev.addr_index += 1;
                    true
                }
                // Last candidate, or statically configured: no fallback.
                _ => false,
            }
        };

        if has_next {
            self.probe_current(name);
        } else {
            self.delete_device(name);
        }
    }

    /// Spawn a capability fetch for the device's current base URL.
    ///
    /// The spawned task delivers a `FetchDone` message unless the
    /// device's cancellation token fires first, in which case nothing
    /// is ever delivered.
    fn start_fetch(&mut self, name: &str) {
        let request = self.next_request;
        self.next_request += 1;

        // Channel already closed means teardown is underway.
        let Some(events) = self.events.upgrade() else {
            return;
        };
        let Some(dev) = self.table.get_mut(name) else {
            return;
        };
        let Some(base) = dev.base_url.clone() else {
            return;
        };
        dev.pending.insert(request);

        let token = dev.cancel.child_token();
        let generation = dev.generation;
        let client = self.client.clone();
        let device = dev.name.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                result = client.capabilities(&base) => {
                    let _ = events.send(RegistryEvent::FetchDone {
                        name: device,
                        generation,
                        request,
                        result,
                    });
                }
            }
        });
    }

    // ── Deletion / teardown ──────────────────────────────────────

    /// Unlist a device, cancel its I/O, and mark it halted. Outstanding
    /// open handles keep their snapshot alive; the record itself is
    /// freed once the last handle drops.
    fn delete_device(&mut self, name: &str) {
        if let Some(mut dev) = self.table.remove(name) {
            dev.halt();
            debug!(device = %name, "removed from device table");
        }
        self.refresh_readiness();
    }

    /// Force-delete every listed device.
    fn purge(&mut self) {
        for name in self.table.names() {
            self.delete_device(&name);
        }
        debug_assert!(self.table.is_empty());
    }

    /// Recompute and broadcast the readiness condition. Every send
    /// wakes `list_devices` waiters so they can re-check, mirroring a
    /// condition-variable broadcast.
    fn refresh_readiness(&mut self) {
        let init_wait = self.table.init_wait_count();
        self.readiness.send_modify(|r| r.init_wait = init_wait);
    }

    fn new_device(&mut self, name: String) -> Device {
        self.next_generation += 1;
        Device::new(name, self.next_generation)
    }
}

/// Run the registry event loop until shutdown (or until every sender is
/// gone), then purge the table.
pub(crate) async fn run(mut state: LoopState, mut events: mpsc::UnboundedReceiver<RegistryEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            RegistryEvent::Found {
                name,
                init_sweep,
                addresses,
            } => state.on_found(name, init_sweep, addresses),
            RegistryEvent::AddStatic { name, url } => state.on_add_static(name, &url),
            RegistryEvent::Removed { name } => state.on_removed(&name),
            RegistryEvent::SweepFinished => state.on_sweep_finished(),
            RegistryEvent::FetchDone {
                name,
                generation,
                request,
                result,
            } => state.on_fetch_done(&name, generation, request, result),
            RegistryEvent::Shutdown => break,
        }
    }

    state.purge();
    debug!("registry event task stopped");
}
