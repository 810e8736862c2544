//! Sensor pathway selection.

use framefit_sensor::{DeviceCapabilities, PrimaryFrame, SecondaryFrame, SensorFrame};

/// The sensing pathway chosen for one frame. `Unavailable` is a first-class
/// case: device incompatible, or the anchor not yet acquired this frame.
#[derive(Debug)]
pub enum Pathway<'a> {
    Primary(&'a PrimaryFrame),
    Secondary(&'a SecondaryFrame),
    Unavailable,
}

/// Choose which pathway to run for one frame.
///
/// Prefers the primary (structured-light) pathway when the device has it and
/// the frame carries an anchor; falls back to depth-buffer sensing when that
/// is what the device and frame offer. Pure, no failure mode beyond
/// `Unavailable`.
pub fn select_pathway<'a>(
    caps: &DeviceCapabilities,
    frame: &'a SensorFrame,
) -> Pathway<'a> {
    match frame {
        SensorFrame::Primary(p) if caps.has_primary_sensor && p.anchor.is_some() => {
            Pathway::Primary(p)
        }
        SensorFrame::Secondary(s) if caps.has_secondary_sensor => Pathway::Secondary(s),
        _ => Pathway::Unavailable,
    }
}
