// scanfly-core: device registry and discovery state machine for eSCL scanners.
//
// The registry owns a single event-processing task that serializes all
// mutation: discovery events, capability-fetch completions, and shutdown
// all arrive as messages. Consumers read through published immutable
// snapshots, so `list_devices` and `open` never contend with the state
// machine.

pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod options;
pub mod parser;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{RegistryConfig, StaticDevice};
pub use discovery::DiscoverySink;
pub use error::CoreError;
pub use parser::{CapabilityParser, JsonCapabilityParser};
pub use registry::{DeviceHandle, DeviceInfo, DeviceView, Lifecycle, Registry};

// Re-export model types at the crate root for ergonomics.
pub use model::{AddrInfo, Capabilities, ColorMode, MmRange, Resolutions, Source, SourceCaps};
pub use options::{
    Constraint, OptionDescriptor, OptionIndex, OptionState, OptionValue, NUM_OPTIONS,
};
