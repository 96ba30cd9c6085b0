// ── Open-device handles ──
//
// A handle is a reference into the registry: it keeps the device's
// published snapshot alive even after the device is deleted from the
// table. Dropping the handle releases the reference (the "close"
// operation); the record's memory goes away when the registry's own
// reference and every handle are gone.

use std::sync::Arc;

use crate::error::CoreError;
use crate::options::{OptionDescriptor, OptionValue};
use crate::registry::table::DeviceView;

/// An opened device.
///
/// Obtained from [`Registry::open`](crate::Registry::open), which only
/// succeeds for ready devices, so the snapshot always carries a valid
/// option model. Close the device by dropping the handle.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    view: Arc<DeviceView>,
}

impl DeviceHandle {
    pub(crate) fn new(view: Arc<DeviceView>) -> Self {
        Self { view }
    }

    pub fn name(&self) -> &str {
        self.view.name()
    }

    pub fn vendor(&self) -> Option<&str> {
        self.view.vendor()
    }

    pub fn model(&self) -> Option<&str> {
        self.view.model()
    }

    /// `true` once the device has been deleted from the registry. The
    /// handle itself stays usable until dropped.
    pub fn is_halted(&self) -> bool {
        self.view.is_halted()
    }

    /// Read one option value from the current selection state.
    pub fn get_option(&self, index: usize) -> Result<OptionValue, CoreError> {
        let options = self
            .view
            .options()
            .ok_or_else(|| CoreError::Internal("option model not built".into()))?;
        options
            .get(index)
            .ok_or(CoreError::InvalidOption { index })
    }

    /// Look up one slot of the option descriptor table. `None` iff the
    /// index is outside the fixed table.
    pub fn option_descriptor(&self, index: usize) -> Option<&OptionDescriptor> {
        self.view.options()?.descriptor(index)
    }
}
