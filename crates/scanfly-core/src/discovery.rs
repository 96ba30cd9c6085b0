// ── Discovery event ingestion ──
//
// The entry points the network-service discovery collaborator (mDNS,
// zeroconf, or a test harness) calls into. Each method is a fire-and-
// forget message to the registry's event task; sends after shutdown are
// silently dropped.

use tokio::sync::{mpsc, watch};

use crate::model::AddrInfo;
use crate::registry::events::RegistryEvent;
use crate::registry::Readiness;

/// Handle the discovery collaborator uses to feed the registry.
///
/// Cheap to clone. All methods are non-blocking and safe to call from
/// any task.
#[derive(Debug, Clone)]
pub struct DiscoverySink {
    pub(crate) events: mpsc::UnboundedSender<RegistryEvent>,
    pub(crate) readiness: watch::Receiver<Readiness>,
}

impl DiscoverySink {
    /// A device appeared. `init_sweep` marks devices found during the
    /// initial discovery sweep; `list_devices` waits for those to
    /// resolve. Duplicate names are ignored by the registry.
    pub fn device_found(
        &self,
        name: impl Into<String>,
        init_sweep: bool,
        addresses: Vec<AddrInfo>,
    ) {
        let _ = self.events.send(RegistryEvent::Found {
            name: name.into(),
            init_sweep,
            addresses,
        });
    }

    /// A previously announced device disappeared.
    pub fn device_removed(&self, name: impl Into<String>) {
        let _ = self.events.send(RegistryEvent::Removed { name: name.into() });
    }

    /// The initial discovery sweep has completed: no more `init_sweep`
    /// devices will be announced.
    pub fn initial_sweep_finished(&self) {
        let _ = self.events.send(RegistryEvent::SweepFinished);
    }

    /// Whether the initial sweep is still pending.
    pub fn is_initial_sweep_pending(&self) -> bool {
        self.readiness.borrow().sweep_pending
    }
}
