//! Landmark observations from the 2D face detector and their resolution
//! into pixel coordinate spaces.

use crate::depth::{normalized_to_pixel, SensorOrientation};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One detected face, in normalized display coordinates (origin
/// bottom-left, both axes in [0, 1]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Detector confidence in [0, 1].
    pub confidence: f32,
    pub nose: Point2<f32>,
    pub left_eye: Point2<f32>,
    pub right_eye: Point2<f32>,
    /// Pupil centroids, absent when the detector cannot resolve them.
    pub left_pupil: Option<Point2<f32>>,
    pub right_pupil: Option<Point2<f32>>,
    /// Eye-region contour points, used as the reference centroid for gaze
    /// deviation. May be empty for detectors without contour output.
    pub left_eye_region: Vec<Point2<f32>>,
    pub right_eye_region: Vec<Point2<f32>>,
    /// Detector-estimated head rotation, radians.
    pub roll: f32,
    pub yaw: f32,
    pub pitch: f32,
}

/// Pick the single highest-confidence observation of a frame. The pipeline
/// never attempts multi-face tracking.
pub fn best_observation(observations: &[FaceObservation]) -> Option<&FaceObservation> {
    observations.iter().max_by(|a, b| {
        a.confidence
            .partial_cmp(&b.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Landmark points of one observation resolved into depth-buffer pixel
/// coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLandmarks {
    pub nose_px: (u32, u32),
    pub left_eye_px: (u32, u32),
    pub right_eye_px: (u32, u32),
}

impl ResolvedLandmarks {
    /// Convert an observation's core landmarks into pixel coordinates of a
    /// `width`×`height` buffer. Returns `None` when any required landmark
    /// falls outside the unit square (clipped at the frame edge).
    pub fn resolve(
        obs: &FaceObservation,
        width: u32,
        height: u32,
        orientation: SensorOrientation,
        mirrored: bool,
    ) -> Option<Self> {
        let to_px = |p: &Point2<f32>| normalized_to_pixel(p.x, p.y, width, height, orientation, mirrored);
        Some(Self {
            nose_px: to_px(&obs.nose)?,
            left_eye_px: to_px(&obs.left_eye)?,
            right_eye_px: to_px(&obs.right_eye)?,
        })
    }
}

/// Centroid of a normalized contour. `None` for an empty contour.
pub fn region_centroid(points: &[Point2<f32>]) -> Option<Point2<f32>> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}
