// ── Capability record ──
//
// What the capability-document parser hands back: vendor/model identity
// plus per-source color modes, resolutions, and scan-area geometry.
// The document's wire schema is the parser's business, not ours.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scan input. Declaration order is the probe order: when a device
/// supports several sources, the lowest-ordered one becomes the initial
/// active source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Source {
    #[strum(serialize = "Flatbed")]
    Platen,
    #[strum(serialize = "ADF")]
    AdfSimplex,
    #[strum(serialize = "ADF Duplex")]
    AdfDuplex,
}

/// Color modes, ordered best-first: when no mode is requested, the
/// first supported one in this order wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum ColorMode {
    #[strum(serialize = "Color")]
    Color,
    #[strum(serialize = "Gray")]
    Grayscale,
    #[strum(serialize = "Lineart")]
    Lineart,
}

/// A closed millimeter range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MmRange {
    pub min: f64,
    pub max: f64,
}

/// Supported resolutions: either an explicit dpi list or a continuous range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolutions {
    Discrete(Vec<u32>),
    Range { min: u32, max: u32 },
}

/// Capabilities of a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCaps {
    pub color_modes: Vec<ColorMode>,
    pub resolutions: Resolutions,
    pub tl_x: MmRange,
    pub tl_y: MmRange,
    pub br_x: MmRange,
    pub br_y: MmRange,
}

impl SourceCaps {
    /// Pick a color mode: `wanted` if this source supports it, otherwise
    /// the best available one. `None` only when the source declares no
    /// modes at all (a malformed document).
    pub fn choose_color_mode(&self, wanted: Option<ColorMode>) -> Option<ColorMode> {
        if let Some(mode) = wanted {
            if self.color_modes.contains(&mode) {
                return Some(mode);
            }
        }
        self.color_modes.iter().min().copied()
    }

    /// Pick the supported resolution closest to `wanted` dpi.
    ///
    /// Discrete lists prefer an exact match, then nearest by absolute
    /// difference with ties broken toward the smaller value. Ranges clamp.
    pub fn choose_resolution(&self, wanted: u32) -> u32 {
        match &self.resolutions {
            Resolutions::Discrete(list) => {
                let mut best: Option<u32> = None;
                for &res in list {
                    let better = match best {
                        None => true,
                        Some(b) => {
                            let (d_res, d_best) = (res.abs_diff(wanted), b.abs_diff(wanted));
                            d_res < d_best || (d_res == d_best && res < b)
                        }
                    };
                    if better {
                        best = Some(res);
                    }
                }
                best.unwrap_or(wanted)
            }
            Resolutions::Range { min, max } => wanted.clamp(*min, *max),
        }
    }
}

/// The full capability record for one device.
///
/// Owned exclusively by the device that fetched it. Sources are keyed
/// by [`Source`], whose `Ord` impl fixes the probe order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub vendor: String,
    pub model: String,
    pub sources: BTreeMap<Source, SourceCaps>,
}

impl Capabilities {
    /// The lowest-ordered supported source, used as the initial active
    /// source at activation. `None` means the document declared no
    /// usable source and the device can never activate.
    pub fn first_source(&self) -> Option<Source> {
        self.sources.keys().next().copied()
    }
}
