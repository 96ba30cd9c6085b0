// ── Domain model ──
//
// Capability records as delivered by the parser collaborator, and
// discovered network addresses with their URL formatting rules.

mod address;
mod capabilities;

pub use address::{normalize_base_url, AddrInfo};
pub use capabilities::{Capabilities, ColorMode, MmRange, Resolutions, Source, SourceCaps};
