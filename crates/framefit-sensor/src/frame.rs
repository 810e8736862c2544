//! Sensor frame types delivered by the camera/session collaborator.
//!
//! One frame arrives per capture callback. The pipeline only reads it; the
//! session owns the memory for the duration of the callback.

use crate::depth::{DepthBuffer, SensorOrientation};
use crate::landmarks::FaceObservation;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pinhole camera intrinsics for back-projection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl CameraIntrinsics {
    /// Extract focal lengths and principal point from a 3×3 intrinsics matrix.
    pub fn from_matrix(k: &Matrix3<f32>) -> Self {
        Self {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
            cx: k[(0, 2)],
            cy: k[(1, 2)],
        }
    }
}

/// Tracked 3D face pose and geometry from the structured-light sensor.
///
/// All sub-transforms and vertices are expressed in anchor space; the anchor
/// `transform` places them in world space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceAnchor {
    /// Anchor pose in world space.
    pub transform: Matrix4<f32>,
    /// Left eyeball pose in anchor space.
    pub left_eye_transform: Matrix4<f32>,
    /// Right eyeball pose in anchor space.
    pub right_eye_transform: Matrix4<f32>,
    /// Face mesh vertices in anchor space.
    pub mesh_vertices: Vec<Point3<f32>>,
    /// Gaze direction estimate in anchor space.
    pub look_at: Vector3<f32>,
    /// Named facial muscle activations in [0, 1], e.g. `eye_blink_left`.
    pub blendshapes: HashMap<String, f32>,
    /// Whether the sensing subsystem is actively tracking this anchor.
    pub is_tracked: bool,
}

/// One frame from the primary (structured-light) pathway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryFrame {
    /// Camera pose in world space.
    pub camera_transform: Matrix4<f32>,
    /// The face anchor, absent until the sensor acquires a face.
    pub anchor: Option<FaceAnchor>,
}

/// One frame from the secondary (2D detector + depth buffer) pathway.
///
/// The landmark detector is an external collaborator that consumes the color
/// image; its per-face observations arrive already attached to the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryFrame {
    pub observations: Vec<FaceObservation>,
    pub depth: DepthBuffer,
    /// Intrinsics expressed in depth-buffer pixel units.
    pub intrinsics: CameraIntrinsics,
    pub orientation: SensorOrientation,
    pub mirrored: bool,
}

/// Tagged union over the two sensor families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorFrame {
    Primary(PrimaryFrame),
    Secondary(SecondaryFrame),
}

impl SensorFrame {
    /// Whether a primary face anchor is present in this frame.
    pub fn has_primary_anchor(&self) -> bool {
        matches!(self, SensorFrame::Primary(p) if p.anchor.is_some())
    }
}
