//! Verification state machine: the evaluator cascade and its published
//! snapshot.

use crate::checks::{
    check_alignment, check_centering, check_detection, check_distance, check_gaze,
};
use crate::geometry::{extract, FaceFrame};
use crate::pathway::{select_pathway, Pathway};
use crate::tolerances::Tolerances;
use framefit_sensor::{DeviceCapabilities, SensorFrame};
use serde::{Deserialize, Serialize};

/// Cascade stages, in evaluation order. This enum is the only source of
/// stage-ordering truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerificationStage {
    FaceDetection,
    Distance,
    Centering,
    HeadAlignment,
    Gaze,
}

impl VerificationStage {
    pub const ALL: [VerificationStage; 5] = [
        VerificationStage::FaceDetection,
        VerificationStage::Distance,
        VerificationStage::Centering,
        VerificationStage::HeadAlignment,
        VerificationStage::Gaze,
    ];
}

/// Measured values surfaced to UI/capture collaborators. A field is `None`
/// when its stage was not evaluated for the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub horizontal_offset_cm: Option<f32>,
    pub vertical_offset_cm: Option<f32>,
    pub nose_offset_cm: Option<f32>,
    pub roll_deg: Option<f32>,
    pub yaw_deg: Option<f32>,
    pub pitch_deg: Option<f32>,
    pub distance_cm: Option<f32>,
    pub gaze_angle_deg: Option<f32>,
}

/// Published per-frame snapshot: one boolean per stage plus diagnostics.
/// Immutable once published; observers never see partial updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationState {
    pub face_detected: bool,
    pub distance_ok: bool,
    pub centering_ok: bool,
    pub head_aligned_ok: bool,
    pub gaze_ok: bool,
    pub diagnostics: Diagnostics,
}

impl VerificationState {
    pub fn stage(&self, stage: VerificationStage) -> bool {
        match stage {
            VerificationStage::FaceDetection => self.face_detected,
            VerificationStage::Distance => self.distance_ok,
            VerificationStage::Centering => self.centering_ok,
            VerificationStage::HeadAlignment => self.head_aligned_ok,
            VerificationStage::Gaze => self.gaze_ok,
        }
    }

    fn set_stage(&mut self, stage: VerificationStage, passed: bool) {
        match stage {
            VerificationStage::FaceDetection => self.face_detected = passed,
            VerificationStage::Distance => self.distance_ok = passed,
            VerificationStage::Centering => self.centering_ok = passed,
            VerificationStage::HeadAlignment => self.head_aligned_ok = passed,
            VerificationStage::Gaze => self.gaze_ok = passed,
        }
    }

    /// All stages pass: the face is positioned and the photograph can be
    /// taken. Debounce, if desired, belongs to the capture collaborator.
    pub fn ready(&self) -> bool {
        VerificationStage::ALL.iter().all(|&s| self.stage(s))
    }
}

/// Drives the evaluator cascade once per incoming sensor frame.
///
/// Holds no history beyond the latest published snapshot — there is no
/// hysteresis at this layer.
pub struct Verifier {
    tolerances: Tolerances,
    state: VerificationState,
}

impl Verifier {
    pub fn new(tolerances: Tolerances) -> Self {
        Self {
            tolerances,
            state: VerificationState::default(),
        }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Latest published snapshot.
    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    /// Drop the published snapshot back to all-false, e.g. on session
    /// interruption.
    pub fn reset(&mut self) {
        self.state = VerificationState::default();
    }

    /// Run the cascade for one frame and publish the resulting snapshot.
    ///
    /// Every failure mode here is per-frame recoverable: extraction errors
    /// degrade to a face-detection failure and the frame is skipped for
    /// measurement purposes.
    pub fn process_frame(
        &mut self,
        caps: &DeviceCapabilities,
        frame: &SensorFrame,
    ) -> &VerificationState {
        let pathway = select_pathway(caps, frame);
        let mut next = VerificationState::default();

        let detected = check_detection(&pathway).passed;
        next.set_stage(VerificationStage::FaceDetection, detected);

        let face = if detected {
            match extract(&pathway) {
                Ok(face) => Some(face),
                Err(err) => {
                    // Invalid geometry is reported as a detection failure.
                    tracing::debug!(error = %err, "extraction failed, skipping frame");
                    next.set_stage(VerificationStage::FaceDetection, false);
                    None
                }
            }
        } else {
            None
        };

        if let Some(face) = face {
            self.run_stages(&mut next, &face, &pathway);
        }

        self.state = next;
        &self.state
    }

    fn run_stages(&self, next: &mut VerificationState, face: &FaceFrame, pathway: &Pathway<'_>) {
        let tol = &self.tolerances;
        for stage in VerificationStage::ALL {
            if stage == VerificationStage::FaceDetection {
                continue; // already decided
            }
            if self.tolerances.cascade_on_failure && !upstream_passed(next, stage) {
                // Short-circuit: this stage and everything after it stay
                // false in the published state.
                break;
            }

            let passed = match stage {
                VerificationStage::FaceDetection => unreachable!(),
                VerificationStage::Distance => {
                    let check = check_distance(face, tol);
                    next.diagnostics.distance_cm = Some(check.distance_m * 100.0);
                    check.passed
                }
                VerificationStage::Centering => {
                    let check = check_centering(face, tol);
                    next.diagnostics.horizontal_offset_cm = Some(check.horizontal_m * 100.0);
                    next.diagnostics.vertical_offset_cm = Some(check.vertical_m * 100.0);
                    next.diagnostics.nose_offset_cm = Some(check.nose_offset_m * 100.0);
                    check.passed
                }
                VerificationStage::HeadAlignment => {
                    let check = check_alignment(face, tol);
                    next.diagnostics.roll_deg = Some(check.angles_deg.roll);
                    next.diagnostics.yaw_deg = Some(check.angles_deg.yaw);
                    next.diagnostics.pitch_deg = Some(check.angles_deg.pitch);
                    check.passed
                }
                VerificationStage::Gaze => {
                    let check = check_gaze(face, pathway, tol);
                    next.diagnostics.gaze_angle_deg = check.angle_rad.map(f32::to_degrees);
                    check.passed
                }
            };
            next.set_stage(stage, passed);
        }
    }
}

/// All stages strictly before `stage` in cascade order passed.
fn upstream_passed(state: &VerificationState, stage: VerificationStage) -> bool {
    VerificationStage::ALL
        .iter()
        .take_while(|&&s| s != stage)
        .all(|&s| state.stage(s))
}
