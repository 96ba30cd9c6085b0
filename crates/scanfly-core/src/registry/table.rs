// ── Device table ──
//
// The event task's private, mutable view of every listed device, plus
// the published read-only snapshots consumers see. The two are kept in
// lockstep: a name is in the published map iff the device is listed.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::model::{AddrInfo, Capabilities};
use crate::options::OptionState;

/// Lifecycle of a device record.
///
/// `Halted` is terminal: it is only ever observed through a snapshot
/// held by an open handle after the device left the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    /// Capability fetch not yet resolved; not eligible for `open`.
    Probing,
    /// Capabilities resolved, option model valid, listable.
    Ready,
    /// Removed from the registry, all I/O cancelled.
    Halted,
}

/// Mutable device record, owned exclusively by the event task.
pub(crate) struct Device {
    pub(crate) name: String,
    /// Incarnation counter; fetch completions carrying another
    /// generation are ignored.
    pub(crate) generation: u64,
    pub(crate) lifecycle: Lifecycle,
    /// Found during the initial discovery sweep and not yet resolved.
    pub(crate) init_wait: bool,
    /// Candidate addresses, `None` for statically configured devices.
    pub(crate) addresses: Option<Vec<AddrInfo>>,
    /// Index of the candidate currently being probed.
    pub(crate) addr_index: usize,
    pub(crate) base_url: Option<String>,
    /// Request ids of in-flight fetches, for teardown bookkeeping.
    pub(crate) pending: HashSet<u64>,
    /// Cancels every in-flight fetch for this device.
    pub(crate) cancel: CancellationToken,
    pub(crate) caps: Option<Capabilities>,
    pub(crate) options: Option<OptionState>,
}

impl Device {
    pub(crate) fn new(name: String, generation: u64) -> Self {
        Self {
            name,
            generation,
            lifecycle: Lifecycle::Probing,
            init_wait: false,
            addresses: None,
            addr_index: 0,
            base_url: None,
            pending: HashSet::new(),
            cancel: CancellationToken::new(),
            caps: None,
            options: None,
        }
    }

    /// The candidate address currently being probed.
    pub(crate) fn current_address(&self) -> Option<&AddrInfo> {
        self.addresses.as_ref()?.get(self.addr_index)
    }

    /// Stop all I/O and mark the record terminal.
    pub(crate) fn halt(&mut self) {
        self.cancel.cancel();
        self.pending.clear();
        self.lifecycle = Lifecycle::Halted;
    }

    fn view(&self) -> DeviceView {
        DeviceView {
            name: self.name.clone(),
            lifecycle: self.lifecycle,
            vendor: self.caps.as_ref().map(|c| c.vendor.clone()),
            model: self.caps.as_ref().map(|c| c.model.clone()),
            base_url: self.base_url.clone(),
            options: self.options.clone(),
            halted: AtomicBool::new(false),
        }
    }
}

/// Published immutable snapshot of one device.
///
/// Handed out by `open` and kept alive by `Arc` for as long as any
/// handle exists, independent of table membership. The `halted` flag is
/// the one late-breaking fact pushed into an already-published
/// snapshot, so handle holders can see their device go away.
#[derive(Debug)]
pub struct DeviceView {
    name: String,
    lifecycle: Lifecycle,
    vendor: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    options: Option<OptionState>,
    halted: AtomicBool,
}

impl DeviceView {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn options(&self) -> Option<&OptionState> {
        self.options.as_ref()
    }

    /// `true` once the device has been deleted from the registry.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    fn mark_halted(&self) {
        self.halted.store(true, Ordering::Release);
    }
}

/// The name-keyed table of listed devices.
pub(crate) struct DeviceTable {
    devices: HashMap<String, Device>,
    published: Arc<DashMap<String, Arc<DeviceView>>>,
}

impl DeviceTable {
    pub(crate) fn new(published: Arc<DashMap<String, Arc<DeviceView>>>) -> Self {
        Self {
            devices: HashMap::new(),
            published,
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// List a device: insert it and publish its first snapshot.
    pub(crate) fn insert(&mut self, dev: Device) {
        self.published
            .insert(dev.name.clone(), Arc::new(dev.view()));
        self.devices.insert(dev.name.clone(), dev);
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.get_mut(name)
    }

    /// Re-publish a device's snapshot after mutation.
    pub(crate) fn publish(&self, name: &str) {
        if let Some(dev) = self.devices.get(name) {
            self.published.insert(name.to_owned(), Arc::new(dev.view()));
        }
    }

    /// Unlist a device. Its published snapshot is marked halted before
    /// being dropped from the map, so outstanding handles observe the
    /// deletion.
    pub(crate) fn remove(&mut self, name: &str) -> Option<Device> {
        if let Some((_, view)) = self.published.remove(name) {
            view.mark_halted();
        }
        self.devices.remove(name)
    }

    /// Count listed devices still waiting on their initial fetch.
    pub(crate) fn init_wait_count(&self) -> usize {
        self.devices.values().filter(|d| d.init_wait).count()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.devices.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
