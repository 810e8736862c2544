//! Device sensing capabilities, queried once at startup.

use serde::{Deserialize, Serialize};

/// Which sensor families the device offers. Immutable for the lifetime of a
/// session; computed once at startup or reconfiguration, never per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Structured-light face sensing: 3D anchor + mesh + eye sub-transforms.
    pub has_primary_sensor: bool,
    /// Depth-buffer sensing: 2D landmark detector + per-pixel depth.
    pub has_secondary_sensor: bool,
}

impl DeviceCapabilities {
    pub fn new(has_primary_sensor: bool, has_secondary_sensor: bool) -> Self {
        Self {
            has_primary_sensor,
            has_secondary_sensor,
        }
    }

    /// At least one sensor pathway is usable. A device failing this check is
    /// incompatible — a fatal-to-the-session condition, not a per-frame one.
    pub fn is_supported(&self) -> bool {
        self.has_primary_sensor || self.has_secondary_sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_combinations() {
        assert!(DeviceCapabilities::new(true, false).is_supported());
        assert!(DeviceCapabilities::new(false, true).is_supported());
        assert!(DeviceCapabilities::new(true, true).is_supported());
        assert!(!DeviceCapabilities::new(false, false).is_supported());
    }
}
