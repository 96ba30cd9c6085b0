// ── Option model ──
//
// The fixed-shape descriptor table consumers introspect, plus the
// current selection state it describes. The table is never patched in
// place: any change of active source regenerates the whole thing, so
// constraints and selections can never disagree.

use serde::Serialize;

use crate::model::{Capabilities, ColorMode, MmRange, Source, SourceCaps};

/// Default resolution target, dpi.
pub const DEFAULT_RESOLUTION: u32 = 300;

/// Number of slots in the option descriptor table.
pub const NUM_OPTIONS: usize = 10;

/// Fixed slot order of the option table. The order and the slot types
/// are part of the consumer contract and never vary per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::FromRepr)]
#[repr(usize)]
pub enum OptionIndex {
    NumOptions = 0,
    GroupStandard = 1,
    Resolution = 2,
    ColorMode = 3,
    Source = 4,
    GroupGeometry = 5,
    TlX = 6,
    TlY = 7,
    BrX = 8,
    BrY = 9,
}

/// Value type of an option slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionType {
    Int,
    Fixed,
    String,
    Group,
}

/// Physical unit of an option's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    None,
    Dpi,
    Mm,
}

/// What the consumer may do with an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionCaps {
    pub soft_select: bool,
    pub soft_detect: bool,
}

impl OptionCaps {
    const SETTABLE: Self = Self {
        soft_select: true,
        soft_detect: true,
    };
    const DETECT_ONLY: Self = Self {
        soft_select: false,
        soft_detect: true,
    };
    const NONE: Self = Self {
        soft_select: false,
        soft_detect: false,
    };
}

/// Constraint on an option's value. The constraint *kind* per slot is
/// fixed by the table contract (except resolution, which is a word list
/// or a range depending on the source); only the values vary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constraint {
    None,
    /// Discrete numeric values (resolution, dpi).
    WordList(Vec<u32>),
    /// Continuous numeric range (resolution, dpi).
    IntRange { min: u32, max: u32 },
    /// Continuous millimeter range (geometry).
    FixedRange(MmRange),
    /// Enumerated string values (color mode, source).
    StringList(Vec<String>),
}

/// One slot of the option descriptor table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub ty: OptionType,
    pub unit: Unit,
    pub caps: OptionCaps,
    pub constraint: Constraint,
}

/// A read option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OptionValue {
    Int(i64),
    Fixed(f64),
    String(String),
}

/// Current option selections plus the descriptor table they imply.
///
/// Built at source activation and rebuilt wholesale whenever the active
/// source changes.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionState {
    pub source: Source,
    pub color_mode: ColorMode,
    pub resolution: u32,
    pub tl_x: f64,
    pub tl_y: f64,
    pub br_x: f64,
    pub br_y: f64,
    descriptors: Vec<OptionDescriptor>,
}

impl OptionState {
    /// Run source activation: derive defaults for `source` from `caps`
    /// and build the descriptor table.
    ///
    /// `None` if the capability record does not cover `source` or the
    /// source declares no color mode — either way the device must not
    /// activate.
    pub fn activate(caps: &Capabilities, source: Source) -> Option<Self> {
        let src = caps.sources.get(&source)?;
        let color_mode = src.choose_color_mode(None)?;
        let resolution = src.choose_resolution(DEFAULT_RESOLUTION);

        Some(Self {
            source,
            color_mode,
            resolution,
            tl_x: 0.0,
            tl_y: 0.0,
            br_x: src.br_x.max,
            br_y: src.br_y.max,
            descriptors: build_descriptors(caps, src),
        })
    }

    /// Switch the active source, re-deriving every default and
    /// regenerating the table as a whole.
    pub fn select_source(&mut self, caps: &Capabilities, source: Source) -> Option<()> {
        *self = Self::activate(caps, source)?;
        Some(())
    }

    /// Read one option value. `None` for out-of-range indices and for
    /// group markers, which have no value.
    #[allow(clippy::cast_possible_wrap)]
    pub fn get(&self, index: usize) -> Option<OptionValue> {
        match OptionIndex::from_repr(index)? {
            OptionIndex::NumOptions => Some(OptionValue::Int(NUM_OPTIONS as i64)),
            OptionIndex::Resolution => Some(OptionValue::Int(i64::from(self.resolution))),
            OptionIndex::ColorMode => Some(OptionValue::String(self.color_mode.to_string())),
            OptionIndex::Source => Some(OptionValue::String(self.source.to_string())),
            OptionIndex::TlX => Some(OptionValue::Fixed(self.tl_x)),
            OptionIndex::TlY => Some(OptionValue::Fixed(self.tl_y)),
            OptionIndex::BrX => Some(OptionValue::Fixed(self.br_x)),
            OptionIndex::BrY => Some(OptionValue::Fixed(self.br_y)),
            OptionIndex::GroupStandard | OptionIndex::GroupGeometry => None,
        }
    }

    /// Look up one slot of the descriptor table. `None` iff the index
    /// is outside the fixed table.
    pub fn descriptor(&self, index: usize) -> Option<&OptionDescriptor> {
        self.descriptors.get(index)
    }

    /// The full table, always exactly [`NUM_OPTIONS`] slots.
    pub fn descriptors(&self) -> &[OptionDescriptor] {
        &self.descriptors
    }
}

/// Build the fixed descriptor table for the active source.
fn build_descriptors(caps: &Capabilities, src: &SourceCaps) -> Vec<OptionDescriptor> {
    let resolution_constraint = match &src.resolutions {
        crate::model::Resolutions::Discrete(list) => Constraint::WordList(list.clone()),
        crate::model::Resolutions::Range { min, max } => Constraint::IntRange {
            min: *min,
            max: *max,
        },
    };

    let color_modes: Vec<String> = src.color_modes.iter().map(ToString::to_string).collect();
    let sources: Vec<String> = caps.sources.keys().map(ToString::to_string).collect();

    vec![
        OptionDescriptor {
            name: "",
            title: "Number of options",
            ty: OptionType::Int,
            unit: Unit::None,
            caps: OptionCaps::DETECT_ONLY,
            constraint: Constraint::None,
        },
        OptionDescriptor {
            name: "standard",
            title: "Standard",
            ty: OptionType::Group,
            unit: Unit::None,
            caps: OptionCaps::NONE,
            constraint: Constraint::None,
        },
        OptionDescriptor {
            name: "resolution",
            title: "Scan resolution",
            ty: OptionType::Int,
            unit: Unit::Dpi,
            caps: OptionCaps::SETTABLE,
            constraint: resolution_constraint,
        },
        OptionDescriptor {
            name: "mode",
            title: "Scan mode",
            ty: OptionType::String,
            unit: Unit::None,
            caps: OptionCaps::SETTABLE,
            constraint: Constraint::StringList(color_modes),
        },
        OptionDescriptor {
            name: "source",
            title: "Scan source",
            ty: OptionType::String,
            unit: Unit::None,
            caps: OptionCaps::SETTABLE,
            constraint: Constraint::StringList(sources),
        },
        OptionDescriptor {
            name: "geometry",
            title: "Geometry",
            ty: OptionType::Group,
            unit: Unit::None,
            caps: OptionCaps::NONE,
            constraint: Constraint::None,
        },
        OptionDescriptor {
            name: "tl-x",
            title: "Top-left x",
            ty: OptionType::Fixed,
            unit: Unit::Mm,
            caps: OptionCaps::SETTABLE,
            constraint: Constraint::FixedRange(src.tl_x),
        },
        OptionDescriptor {
            name: "tl-y",
            title: "Top-left y",
            ty: OptionType::Fixed,
            unit: Unit::Mm,
            caps: OptionCaps::SETTABLE,
            constraint: Constraint::FixedRange(src.tl_y),
        },
        OptionDescriptor {
            name: "br-x",
            title: "Bottom-right x",
            ty: OptionType::Fixed,
            unit: Unit::Mm,
            caps: OptionCaps::SETTABLE,
            constraint: Constraint::FixedRange(src.br_x),
        },
        OptionDescriptor {
            name: "br-y",
            title: "Bottom-right y",
            ty: OptionType::Fixed,
            unit: Unit::Mm,
            caps: OptionCaps::SETTABLE,
            constraint: Constraint::FixedRange(src.br_y),
        },
    ]
}
