// scanfly-api: async HTTP transport for eSCL network scanners.
//
// One shared `reqwest::Client` carries every request the process makes,
// so dropping the client (or cancelling the callers' tasks) is a global
// teardown point. Higher layers decide what a failed fetch means; this
// crate only distinguishes transport failures from non-success statuses.

pub mod error;
pub mod transport;

mod client;

pub use client::{EsclClient, CAPABILITIES_PATH};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
