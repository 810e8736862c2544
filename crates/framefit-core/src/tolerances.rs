//! Pass/fail tolerance configuration.
//!
//! The thresholds evolved across hardware revisions, so every one of them is
//! configuration rather than a hard-coded literal. Values are read-only
//! after startup and safe for unsynchronized concurrent reads.

use serde::{Deserialize, Serialize};

/// Absolute sanity ceiling on a distance reading; anything beyond this is
/// sensor noise, not a user standing far away.
pub const DISTANCE_SANITY_CEILING_M: f32 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Per-axis centering limit, meters.
    pub centering_m: f32,
    /// Per-axis head rotation limit, degrees.
    pub head_alignment_deg: f32,
    /// Acceptable face distance range, meters. Bounds are inclusive.
    pub min_distance_m: f32,
    pub max_distance_m: f32,
    /// Angular gaze limit for the primary pathway, radians.
    pub gaze_angle_rad: f32,
    /// Eye-blink blendshape value above which gaze is not judged (a natural
    /// blink must not fail the stage).
    pub blink_limit: f32,
    /// Pupil deviation limit for the secondary pathway, normalized units.
    pub pupil_deviation: f32,
    /// Strict cascading: a failing stage short-circuits and publishes all
    /// downstream stages as false. When off, every stage is evaluated
    /// independently each frame.
    pub cascade_on_failure: bool,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            centering_m: 0.005,
            head_alignment_deg: 5.0,
            min_distance_m: 0.25,
            max_distance_m: 0.60,
            gaze_angle_rad: std::f32::consts::PI / 12.0,
            blink_limit: 0.5,
            pupil_deviation: 0.04,
            cascade_on_failure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tol = Tolerances::default();
        assert_eq!(tol.centering_m, 0.005);
        assert_eq!(tol.head_alignment_deg, 5.0);
        assert_eq!(tol.min_distance_m, 0.25);
        assert_eq!(tol.max_distance_m, 0.60);
        assert!(tol.cascade_on_failure);
    }
}
