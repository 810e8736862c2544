//! Geometry extraction: canonical camera-space face description.
//!
//! Both sensor pathways reduce to a single [`FaceFrame`] so the verification
//! evaluators never see raw sensor data. All positions are camera-space
//! meters; the rotation is expressed relative to the camera so device tilt
//! cancels out.

use crate::euler::{quaternion_from_angles, EulerAngles};
use crate::pathway::Pathway;
use framefit_sensor::{
    best_observation, CameraIntrinsics, PrimaryFrame, ResolvedLandmarks, SecondaryFrame,
};
use nalgebra::{Matrix4, Point3, Rotation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Designated nose-tip vertex of the face mesh topology.
pub const NOSE_VERTEX_INDEX: usize = 9;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no face in frame")]
    NoFace,
    #[error("insufficient mesh vertices: have {have}, need {need}")]
    InsufficientMesh { have: usize, need: usize },
    #[error("camera transform is not invertible")]
    SingularCamera,
    #[error("degenerate homogeneous projection")]
    DegenerateProjection,
    #[error("landmark outside the frame")]
    LandmarkClipped,
    #[error("no valid depth sample for {landmark}")]
    MissingDepth { landmark: &'static str },
    #[error("degenerate camera intrinsics")]
    BadIntrinsics,
    #[error("non-finite geometry")]
    NonFinite,
}

/// Which pathway produced a [`FaceFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Primary,
    Secondary,
}

/// Canonical geometric description of the face relative to the camera.
///
/// Value type: built fresh per frame, never mutated, discarded after the
/// cascade evaluates it. Positions in camera-space meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceFrame {
    pub nose: Point3<f32>,
    pub left_eye: Point3<f32>,
    pub right_eye: Point3<f32>,
    pub face_center: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub sensor_kind: SensorKind,
}

impl FaceFrame {
    pub fn eye_midpoint(&self) -> Point3<f32> {
        Point3::from((self.left_eye.coords + self.right_eye.coords) * 0.5)
    }

    /// Signed horizontal centering offset, meters.
    pub fn horizontal_offset(&self) -> f32 {
        self.face_center.x
    }

    /// Signed vertical centering offset, meters.
    pub fn vertical_offset(&self) -> f32 {
        self.face_center.y
    }

    /// Nose X minus the mean eye X. Removes the lateral bias that asymmetric
    /// mesh sampling puts on the raw face-center offset.
    pub fn nose_offset(&self) -> f32 {
        self.nose.x - (self.left_eye.x + self.right_eye.x) * 0.5
    }
}

/// Build a [`FaceFrame`] for the selected pathway.
///
/// Every error is per-frame recoverable; callers treat any `Err` as a face
/// detection failure for the frame and move on.
pub fn extract(pathway: &Pathway<'_>) -> Result<FaceFrame, ExtractError> {
    match pathway {
        Pathway::Primary(frame) => extract_primary(frame),
        Pathway::Secondary(frame) => extract_secondary(frame),
        Pathway::Unavailable => Err(ExtractError::NoFace),
    }
}

fn extract_primary(frame: &PrimaryFrame) -> Result<FaceFrame, ExtractError> {
    let anchor = frame.anchor.as_ref().ok_or(ExtractError::NoFace)?;
    if anchor.mesh_vertices.len() <= NOSE_VERTEX_INDEX {
        return Err(ExtractError::InsufficientMesh {
            have: anchor.mesh_vertices.len(),
            need: NOSE_VERTEX_INDEX + 1,
        });
    }

    let world_to_camera = frame
        .camera_transform
        .try_inverse()
        .ok_or(ExtractError::SingularCamera)?;
    let anchor_to_camera = world_to_camera * anchor.transform;

    let nose = transform_point(&anchor_to_camera, &anchor.mesh_vertices[NOSE_VERTEX_INDEX])?;
    let left_eye = translation(&(anchor_to_camera * anchor.left_eye_transform));
    let right_eye = translation(&(anchor_to_camera * anchor.right_eye_transform));
    let face_center = translation(&anchor_to_camera);
    // Relative quaternion camera⁻¹ · anchor: head rotation with device tilt
    // cancelled.
    let rotation = rotation_part(&anchor_to_camera);

    finish(FaceFrame {
        nose,
        left_eye,
        right_eye,
        face_center,
        rotation,
        sensor_kind: SensorKind::Primary,
    })
}

fn extract_secondary(frame: &SecondaryFrame) -> Result<FaceFrame, ExtractError> {
    let obs = best_observation(&frame.observations).ok_or(ExtractError::NoFace)?;
    let landmarks = ResolvedLandmarks::resolve(
        obs,
        frame.depth.width(),
        frame.depth.height(),
        frame.orientation,
        frame.mirrored,
    )
    .ok_or(ExtractError::LandmarkClipped)?;

    let intr = &frame.intrinsics;
    if intr.fx.abs() < f32::EPSILON || intr.fy.abs() < f32::EPSILON {
        return Err(ExtractError::BadIntrinsics);
    }

    let sample = |px: (u32, u32), landmark: &'static str| {
        frame
            .depth
            .sample(px.0 as i32, px.1 as i32)
            .ok_or(ExtractError::MissingDepth { landmark })
    };
    let nose_depth = sample(landmarks.nose_px, "nose")?;
    let left_depth = sample(landmarks.left_eye_px, "left eye")?;
    let right_depth = sample(landmarks.right_eye_px, "right eye")?;

    let nose = back_project(landmarks.nose_px, nose_depth, intr);
    let left_eye = back_project(landmarks.left_eye_px, left_depth, intr);
    let right_eye = back_project(landmarks.right_eye_px, right_depth, intr);
    // No mesh on this pathway: the eye midpoint stands in for the face
    // center, and the rotation comes from the detector's own estimate.
    let face_center = Point3::from((left_eye.coords + right_eye.coords) * 0.5);
    let rotation = quaternion_from_angles(&EulerAngles {
        pitch: obs.pitch,
        yaw: obs.yaw,
        roll: obs.roll,
    });

    finish(FaceFrame {
        nose,
        left_eye,
        right_eye,
        face_center,
        rotation,
        sensor_kind: SensorKind::Secondary,
    })
}

/// Back-project a pixel + depth through the pinhole model.
fn back_project(px: (u32, u32), depth: f32, intr: &CameraIntrinsics) -> Point3<f32> {
    Point3::new(
        (px.0 as f32 - intr.cx) / intr.fx * depth,
        (px.1 as f32 - intr.cy) / intr.fy * depth,
        depth,
    )
}

fn translation(m: &Matrix4<f32>) -> Point3<f32> {
    Point3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

fn rotation_part(m: &Matrix4<f32>) -> UnitQuaternion<f32> {
    let r = m.fixed_view::<3, 3>(0, 0).into_owned();
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix(&r))
}

fn transform_point(m: &Matrix4<f32>, p: &Point3<f32>) -> Result<Point3<f32>, ExtractError> {
    let h = m * p.to_homogeneous();
    if h.w.abs() < 1e-9 {
        return Err(ExtractError::DegenerateProjection);
    }
    Ok(Point3::new(h.x / h.w, h.y / h.w, h.z / h.w))
}

fn finish(face: FaceFrame) -> Result<FaceFrame, ExtractError> {
    let finite = [face.nose, face.left_eye, face.right_eye, face.face_center]
        .iter()
        .all(|p| p.coords.iter().all(|c| c.is_finite()))
        && face.rotation.coords.iter().all(|c| c.is_finite());
    if finite {
        Ok(face)
    } else {
        Err(ExtractError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use framefit_sensor::{
        CameraIntrinsics, DepthBuffer, FaceAnchor, FaceObservation, SensorOrientation,
    };
    use nalgebra::{Point2, Vector3};
    use std::collections::HashMap;

    fn mesh_with_nose(nose: Point3<f32>) -> Vec<Point3<f32>> {
        let mut mesh = vec![Point3::origin(); NOSE_VERTEX_INDEX + 1];
        mesh[NOSE_VERTEX_INDEX] = nose;
        mesh
    }

    fn anchor_at(x: f32, y: f32, z: f32) -> FaceAnchor {
        FaceAnchor {
            transform: Matrix4::new_translation(&Vector3::new(x, y, z)),
            left_eye_transform: Matrix4::new_translation(&Vector3::new(-0.032, 0.02, 0.025)),
            right_eye_transform: Matrix4::new_translation(&Vector3::new(0.032, 0.02, 0.025)),
            mesh_vertices: mesh_with_nose(Point3::new(0.0, -0.01, 0.08)),
            look_at: Vector3::z(),
            blendshapes: HashMap::from([("eye_blink_left".into(), 0.05)]),
            is_tracked: true,
        }
    }

    fn primary_at(x: f32, y: f32, z: f32) -> PrimaryFrame {
        PrimaryFrame {
            camera_transform: Matrix4::identity(),
            anchor: Some(anchor_at(x, y, z)),
        }
    }

    #[test]
    fn test_primary_positions_in_camera_space() {
        let frame = primary_at(0.01, 0.02, -0.4);
        let face = extract(&Pathway::Primary(&frame)).unwrap();

        assert_relative_eq!(face.face_center.x, 0.01, epsilon = 1e-6);
        assert_relative_eq!(face.face_center.y, 0.02, epsilon = 1e-6);
        assert_relative_eq!(face.face_center.z, -0.4, epsilon = 1e-6);
        assert_relative_eq!(face.left_eye.x, 0.01 - 0.032, epsilon = 1e-6);
        assert_relative_eq!(face.right_eye.x, 0.01 + 0.032, epsilon = 1e-6);
        assert_relative_eq!(face.nose.x, 0.01, epsilon = 1e-6);
        assert_relative_eq!(face.nose.z, -0.4 + 0.08, epsilon = 1e-6);
        assert_eq!(face.sensor_kind, SensorKind::Primary);
    }

    #[test]
    fn test_primary_rotation_is_relative_to_camera() {
        // Tilt camera and anchor by the same rotation: the relative head
        // rotation must stay identity.
        let tilt = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3).to_homogeneous();
        let mut frame = primary_at(0.0, 0.0, -0.4);
        frame.camera_transform = tilt;
        if let Some(a) = frame.anchor.as_mut() {
            a.transform = tilt * a.transform;
        }
        let face = extract(&Pathway::Primary(&frame)).unwrap();
        assert!(face.rotation.angle() < 1e-4);
    }

    #[test]
    fn test_primary_insufficient_mesh() {
        let mut frame = primary_at(0.0, 0.0, -0.4);
        if let Some(a) = frame.anchor.as_mut() {
            a.mesh_vertices.truncate(NOSE_VERTEX_INDEX);
        }
        assert!(matches!(
            extract(&Pathway::Primary(&frame)),
            Err(ExtractError::InsufficientMesh { .. })
        ));
    }

    #[test]
    fn test_primary_no_anchor() {
        let frame = PrimaryFrame {
            camera_transform: Matrix4::identity(),
            anchor: None,
        };
        assert!(matches!(
            extract(&Pathway::Primary(&frame)),
            Err(ExtractError::NoFace)
        ));
    }

    #[test]
    fn test_primary_singular_camera() {
        let mut frame = primary_at(0.0, 0.0, -0.4);
        frame.camera_transform = Matrix4::zeros();
        assert!(matches!(
            extract(&Pathway::Primary(&frame)),
            Err(ExtractError::SingularCamera)
        ));
    }

    fn centered_observation() -> FaceObservation {
        FaceObservation {
            confidence: 0.95,
            nose: Point2::new(0.5, 0.5),
            left_eye: Point2::new(0.45, 0.55),
            right_eye: Point2::new(0.55, 0.55),
            left_pupil: None,
            right_pupil: None,
            left_eye_region: vec![],
            right_eye_region: vec![],
            roll: 0.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    fn secondary_with_depth(depth: DepthBuffer) -> SecondaryFrame {
        SecondaryFrame {
            observations: vec![centered_observation()],
            depth,
            intrinsics: CameraIntrinsics {
                fx: 500.0,
                fy: 500.0,
                cx: 50.0,
                cy: 50.0,
            },
            orientation: SensorOrientation::Landscape,
            mirrored: false,
        }
    }

    #[test]
    fn test_secondary_back_projection() {
        let frame = secondary_with_depth(DepthBuffer::new(101, 101, vec![0.30; 101 * 101]).unwrap());
        let face = extract(&Pathway::Secondary(&frame)).unwrap();

        // Eyes symmetric about the principal point: center x ≈ 0.
        assert_relative_eq!(face.face_center.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(face.face_center.z, 0.30, epsilon = 1e-6);
        // left eye at u=0.45 → pixel 45 → (45-50)/500*0.3 = -0.003 m
        assert_relative_eq!(face.left_eye.x, -0.003, epsilon = 1e-6);
        assert_relative_eq!(face.right_eye.x, 0.003, epsilon = 1e-6);
        assert_eq!(face.sensor_kind, SensorKind::Secondary);
    }

    #[test]
    fn test_secondary_missing_depth() {
        let frame = secondary_with_depth(DepthBuffer::new(101, 101, vec![f32::NAN; 101 * 101]).unwrap());
        assert!(matches!(
            extract(&Pathway::Secondary(&frame)),
            Err(ExtractError::MissingDepth { .. })
        ));
    }

    #[test]
    fn test_secondary_no_observations() {
        let mut frame = secondary_with_depth(DepthBuffer::new(4, 4, vec![0.3; 16]).unwrap());
        frame.observations.clear();
        assert!(matches!(
            extract(&Pathway::Secondary(&frame)),
            Err(ExtractError::NoFace)
        ));
    }

    #[test]
    fn test_secondary_bad_intrinsics() {
        let mut frame = secondary_with_depth(DepthBuffer::new(101, 101, vec![0.3; 101 * 101]).unwrap());
        frame.intrinsics.fx = 0.0;
        assert!(matches!(
            extract(&Pathway::Secondary(&frame)),
            Err(ExtractError::BadIntrinsics)
        ));
    }

    #[test]
    fn test_secondary_picks_highest_confidence_face() {
        let mut frame = secondary_with_depth(DepthBuffer::new(101, 101, vec![0.30; 101 * 101]).unwrap());
        let mut off_center = centered_observation();
        off_center.confidence = 0.4;
        off_center.nose = Point2::new(0.9, 0.9);
        frame.observations.insert(0, off_center);

        let face = extract(&Pathway::Secondary(&frame)).unwrap();
        // The 0.95-confidence centered face wins.
        assert_relative_eq!(face.face_center.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unavailable_pathway() {
        assert!(matches!(
            extract(&Pathway::Unavailable),
            Err(ExtractError::NoFace)
        ));
    }
}
