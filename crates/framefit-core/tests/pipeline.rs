//! End-to-end cascade scenarios through the public pipeline surface.

use framefit_core::{Tolerances, VerificationStage, Verifier};
use framefit_sensor::{
    CameraIntrinsics, DepthBuffer, DeviceCapabilities, FaceAnchor, FaceObservation, PrimaryFrame,
    SecondaryFrame, SensorFrame, SensorOrientation,
};
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use std::collections::HashMap;

const NOSE_VERTEX_INDEX: usize = framefit_core::geometry::NOSE_VERTEX_INDEX;

/// Primary frame with the face at `center`, eyes at absolute X ±0.02 m and
/// eye height 0, nose at absolute X `nose_x`.
fn primary_frame(center: Point3<f32>, nose_x: f32) -> SensorFrame {
    let mut mesh = vec![Point3::origin(); NOSE_VERTEX_INDEX + 1];
    mesh[NOSE_VERTEX_INDEX] = Point3::new(nose_x - center.x, -center.y, 0.06);

    SensorFrame::Primary(PrimaryFrame {
        camera_transform: Matrix4::identity(),
        anchor: Some(FaceAnchor {
            transform: Matrix4::new_translation(&center.coords),
            left_eye_transform: Matrix4::new_translation(&Vector3::new(
                -0.02 - center.x,
                -center.y,
                0.0,
            )),
            right_eye_transform: Matrix4::new_translation(&Vector3::new(
                0.02 - center.x,
                -center.y,
                0.0,
            )),
            mesh_vertices: mesh,
            look_at: Vector3::z(),
            blendshapes: HashMap::from([
                ("eye_blink_left".to_string(), 0.02),
                ("eye_blink_right".to_string(), 0.02),
            ]),
            is_tracked: true,
        }),
    })
}

fn secondary_frame(depth_m: f32) -> SensorFrame {
    let size = 101u32;
    SensorFrame::Secondary(SecondaryFrame {
        observations: vec![FaceObservation {
            confidence: 0.9,
            nose: Point2::new(0.5, 0.5),
            left_eye: Point2::new(0.45, 0.55),
            right_eye: Point2::new(0.55, 0.55),
            left_pupil: Some(Point2::new(0.45, 0.55)),
            right_pupil: Some(Point2::new(0.55, 0.55)),
            left_eye_region: vec![
                Point2::new(0.43, 0.55),
                Point2::new(0.47, 0.55),
                Point2::new(0.45, 0.54),
                Point2::new(0.45, 0.56),
            ],
            right_eye_region: vec![
                Point2::new(0.53, 0.55),
                Point2::new(0.57, 0.55),
                Point2::new(0.55, 0.54),
                Point2::new(0.55, 0.56),
            ],
            roll: 0.0,
            yaw: 0.0,
            pitch: 0.0,
        }],
        depth: DepthBuffer::new(size, size, vec![depth_m; (size * size) as usize]).unwrap(),
        intrinsics: CameraIntrinsics {
            fx: 500.0,
            fy: 500.0,
            cx: 50.0,
            cy: 50.0,
        },
        orientation: SensorOrientation::Landscape,
        mirrored: false,
    })
}

#[test]
fn centered_face_reaches_ready() {
    let caps = DeviceCapabilities::new(true, false);
    let mut verifier = Verifier::new(Tolerances::default());
    // Nose-eye offset 0.0006 m < 0.005 m: centering passes, and everything
    // else is nominal.
    let state = verifier.process_frame(&caps, &primary_frame(Point3::new(0.0, 0.0, -0.4), 0.0006));
    assert!(state.face_detected);
    assert!(state.distance_ok);
    assert!(state.centering_ok);
    assert!(state.head_aligned_ok);
    assert!(state.gaze_ok);
    assert!(state.ready());

    let d = &state.diagnostics;
    assert!((d.nose_offset_cm.unwrap() - 0.06).abs() < 1e-3);
    assert!((d.distance_cm.unwrap() - 40.0).abs() < 0.1);
}

#[test]
fn nose_offset_failure_short_circuits_downstream() {
    let caps = DeviceCapabilities::new(true, false);
    let mut verifier = Verifier::new(Tolerances::default());
    // Nose X 0.01 m: offset 0.01 ≥ 0.005, centering fails.
    let state = verifier.process_frame(&caps, &primary_frame(Point3::new(0.0, 0.0, -0.4), 0.01));
    assert!(state.face_detected);
    assert!(state.distance_ok);
    assert!(!state.centering_ok);
    // Head alignment and gaze were not evaluated and publish as false.
    assert!(!state.head_aligned_ok);
    assert!(!state.gaze_ok);
    assert!(state.diagnostics.roll_deg.is_none());
    assert!(state.diagnostics.gaze_angle_deg.is_none());
    assert!(!state.ready());
}

#[test]
fn secondary_distance_in_range_passes() {
    let caps = DeviceCapabilities::new(false, true);
    let mut verifier = Verifier::new(Tolerances::default());
    let state = verifier.process_frame(&caps, &secondary_frame(0.30));
    assert!(state.face_detected);
    assert!(state.distance_ok);
    assert!((state.diagnostics.distance_cm.unwrap() - 30.0).abs() < 0.1);
}

#[test]
fn secondary_distance_out_of_range_fails_with_diagnostic() {
    let caps = DeviceCapabilities::new(false, true);
    let mut verifier = Verifier::new(Tolerances::default());
    let state = verifier.process_frame(&caps, &secondary_frame(0.80));
    assert!(state.face_detected);
    assert!(!state.distance_ok);
    // Measured value still surfaces: 80 cm.
    assert!((state.diagnostics.distance_cm.unwrap() - 80.0).abs() < 0.1);
    assert!(!state.centering_ok);
    assert!(!state.ready());
}

#[test]
fn cascade_is_monotone() {
    let caps = DeviceCapabilities::new(true, false);
    let mut verifier = Verifier::new(Tolerances::default());
    let frames = [
        primary_frame(Point3::new(0.0, 0.0, -0.4), 0.0),    // all pass
        primary_frame(Point3::new(0.0, 0.0, -0.9), 0.0),    // distance fails
        primary_frame(Point3::new(0.02, 0.0, -0.4), 0.02),  // centering fails
        primary_frame(Point3::new(0.0, 0.0, -0.1), 0.01),   // distance fails first
        SensorFrame::Primary(PrimaryFrame {
            camera_transform: Matrix4::identity(),
            anchor: None, // detection fails
        }),
    ];

    for (i, frame) in frames.iter().enumerate() {
        let state = verifier.process_frame(&caps, frame).clone();
        let mut failed = false;
        for stage in VerificationStage::ALL {
            if failed {
                assert!(!state.stage(stage), "frame {i}: {stage:?} after a failure");
            }
            if !state.stage(stage) {
                failed = true;
            }
        }
    }
}

#[test]
fn reprocessing_the_same_frame_is_idempotent() {
    let caps = DeviceCapabilities::new(true, false);
    let mut verifier = Verifier::new(Tolerances::default());
    let frame = primary_frame(Point3::new(0.003, -0.002, -0.35), 0.004);
    let first = verifier.process_frame(&caps, &frame).clone();
    let second = verifier.process_frame(&caps, &frame).clone();
    assert_eq!(first, second);
}

#[test]
fn independent_mode_evaluates_past_failures() {
    let caps = DeviceCapabilities::new(true, false);
    let mut tolerances = Tolerances::default();
    tolerances.cascade_on_failure = false;
    let mut verifier = Verifier::new(tolerances);

    // Centering fails but head alignment and gaze are nominal.
    let state = verifier.process_frame(&caps, &primary_frame(Point3::new(0.02, 0.0, -0.4), 0.02));
    assert!(!state.centering_ok);
    assert!(state.head_aligned_ok);
    assert!(state.gaze_ok);
    assert!(state.diagnostics.roll_deg.is_some());
}

#[test]
fn incompatible_device_never_detects() {
    let caps = DeviceCapabilities::new(false, false);
    let mut verifier = Verifier::new(Tolerances::default());
    let state = verifier.process_frame(&caps, &primary_frame(Point3::new(0.0, 0.0, -0.4), 0.0));
    assert!(!state.face_detected);
    assert!(!state.ready());
}
