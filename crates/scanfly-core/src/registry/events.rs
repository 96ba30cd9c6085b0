// ── Registry event messages ──
//
// Everything that mutates registry state arrives as one of these on the
// event task's channel, so no two mutations ever race.

use bytes::Bytes;
use url::Url;

use crate::model::AddrInfo;

#[derive(Debug)]
pub(crate) enum RegistryEvent {
    /// Discovery announced a device.
    Found {
        name: String,
        init_sweep: bool,
        addresses: Vec<AddrInfo>,
    },

    /// Discovery withdrew a device.
    Removed { name: String },

    /// A statically configured device, added before discovery begins.
    AddStatic { name: String, url: Url },

    /// The initial discovery sweep has completed.
    SweepFinished,

    /// A capability fetch resolved. `generation` pins the completion to
    /// the device incarnation that issued it; a stale generation means
    /// the device was deleted (and possibly re-added) in the meantime.
    FetchDone {
        name: String,
        generation: u64,
        request: u64,
        result: Result<Bytes, scanfly_api::Error>,
    },

    /// Tear down: delete every device and stop the event task.
    Shutdown,
}
