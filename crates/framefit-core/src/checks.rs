//! The five verification evaluators.
//!
//! Each is a pure function from a [`FaceFrame`] (or the raw pathway, where
//! the check needs sensor data the canonical frame does not carry) and a
//! tolerance to a pass/fail verdict plus the measured values the UI needs
//! for its "keep adjusting" feedback.

use crate::euler::{angles_from_quaternion, EulerAngles};
use crate::geometry::FaceFrame;
use crate::pathway::Pathway;
use crate::tolerances::{Tolerances, DISTANCE_SANITY_CEILING_M};
use framefit_sensor::{best_observation, region_centroid, FaceObservation};
use nalgebra::Vector3;

/// Blendshape keys for blink gating on the primary pathway.
pub const BLINK_LEFT_KEY: &str = "eye_blink_left";
pub const BLINK_RIGHT_KEY: &str = "eye_blink_right";

#[derive(Debug, Clone, Copy)]
pub struct DetectionCheck {
    pub passed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DistanceCheck {
    pub passed: bool,
    /// Camera-space depth of the eye midpoint, meters.
    pub distance_m: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct CenteringCheck {
    pub passed: bool,
    pub horizontal_m: f32,
    pub vertical_m: f32,
    pub nose_offset_m: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct AlignmentCheck {
    pub passed: bool,
    /// Head rotation, degrees.
    pub angles_deg: EulerAngles,
}

#[derive(Debug, Clone, Copy)]
pub struct GazeCheck {
    pub passed: bool,
    /// Angle between the gaze ray and the camera direction, radians
    /// (primary pathway).
    pub angle_rad: Option<f32>,
    /// Worst pupil deviation from its eye-region centroid, normalized units
    /// (secondary pathway).
    pub deviation: Option<f32>,
}

/// Face detection: existence check, no tolerance.
///
/// Primary: an anchor is present, actively tracked, and carries blendshape
/// data. Secondary: the detector returned at least one observation.
pub fn check_detection(pathway: &Pathway<'_>) -> DetectionCheck {
    let passed = match pathway {
        Pathway::Primary(frame) => frame
            .anchor
            .as_ref()
            .is_some_and(|a| a.is_tracked && !a.blendshapes.is_empty()),
        Pathway::Secondary(frame) => !frame.observations.is_empty(),
        Pathway::Unavailable => false,
    };
    DetectionCheck { passed }
}

/// Distance: eye-midpoint depth within the configured range, bounds
/// inclusive. Non-finite, non-positive, or absurdly large readings are
/// sensor noise and fail outright.
pub fn check_distance(face: &FaceFrame, tol: &Tolerances) -> DistanceCheck {
    let distance_m = face.eye_midpoint().z.abs();
    let sane = distance_m.is_finite()
        && distance_m > 0.0
        && distance_m <= DISTANCE_SANITY_CEILING_M;
    DistanceCheck {
        passed: sane && distance_m >= tol.min_distance_m && distance_m <= tol.max_distance_m,
        distance_m,
    }
}

/// Centering: three independent axis checks, all strict.
pub fn check_centering(face: &FaceFrame, tol: &Tolerances) -> CenteringCheck {
    let horizontal_m = face.horizontal_offset();
    let vertical_m = face.vertical_offset();
    let nose_offset_m = face.nose_offset();
    CenteringCheck {
        passed: horizontal_m.abs() < tol.centering_m
            && vertical_m.abs() < tol.centering_m
            && nose_offset_m.abs() < tol.centering_m,
        horizontal_m,
        vertical_m,
        nose_offset_m,
    }
}

/// Head alignment: quaternion-decomposed pitch/yaw/roll all within the
/// degree limit, bounds inclusive.
pub fn check_alignment(face: &FaceFrame, tol: &Tolerances) -> AlignmentCheck {
    let angles_deg = angles_from_quaternion(&face.rotation).degrees();
    AlignmentCheck {
        passed: angles_deg.pitch.abs() <= tol.head_alignment_deg
            && angles_deg.yaw.abs() <= tol.head_alignment_deg
            && angles_deg.roll.abs() <= tol.head_alignment_deg,
        angles_deg,
    }
}

/// Gaze direction. Pathway-specific: the canonical frame does not carry the
/// look-at vector or pupil positions, so this one reads the raw pathway.
pub fn check_gaze(face: &FaceFrame, pathway: &Pathway<'_>, tol: &Tolerances) -> GazeCheck {
    match pathway {
        Pathway::Primary(frame) => {
            let Some(anchor) = frame.anchor.as_ref() else {
                return GazeCheck {
                    passed: false,
                    angle_rad: None,
                    deviation: None,
                };
            };

            // A natural blink collapses the look-at estimate; skip the
            // judgement rather than failing the user mid-blink.
            let blink = |key: &str| anchor.blendshapes.get(key).copied().unwrap_or(0.0);
            let blinking =
                blink(BLINK_LEFT_KEY) > tol.blink_limit || blink(BLINK_RIGHT_KEY) > tol.blink_limit;

            let look_cam = face.rotation * anchor.look_at;
            let norm = look_cam.norm();
            if norm < f32::EPSILON {
                return GazeCheck {
                    passed: false,
                    angle_rad: None,
                    deviation: None,
                };
            }
            // Unit Z pointing from the face region toward the camera plane.
            let toward_camera = Vector3::new(0.0, 0.0, -face.face_center.z.signum());
            let angle = (look_cam / norm)
                .dot(&toward_camera)
                .clamp(-1.0, 1.0)
                .acos();

            GazeCheck {
                passed: !blinking && angle < tol.gaze_angle_rad,
                angle_rad: Some(angle),
                deviation: None,
            }
        }
        Pathway::Secondary(frame) => {
            let Some(obs) = best_observation(&frame.observations) else {
                return GazeCheck {
                    passed: false,
                    angle_rad: None,
                    deviation: None,
                };
            };
            match pupil_deviations(obs) {
                Some((left, right)) => GazeCheck {
                    passed: left < tol.pupil_deviation && right < tol.pupil_deviation,
                    angle_rad: None,
                    deviation: Some(left.max(right)),
                },
                None => GazeCheck {
                    passed: false,
                    angle_rad: None,
                    deviation: None,
                },
            }
        }
        Pathway::Unavailable => GazeCheck {
            passed: false,
            angle_rad: None,
            deviation: None,
        },
    }
}

/// Euclidean deviation of each pupil centroid from its eye-region centroid,
/// normalized coordinates. `None` when pupils or contours are unavailable.
fn pupil_deviations(obs: &FaceObservation) -> Option<(f32, f32)> {
    let left_pupil = obs.left_pupil?;
    let right_pupil = obs.right_pupil?;
    let left_center = region_centroid(&obs.left_eye_region)?;
    let right_center = region_centroid(&obs.right_eye_region)?;
    Some((
        (left_pupil - left_center).norm(),
        (right_pupil - right_center).norm(),
    ))
}
