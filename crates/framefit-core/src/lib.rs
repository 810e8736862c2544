//! framefit-core — Face positioning verification for eyewear fitting.
//!
//! Converts heterogeneous sensor frames (3D anchor mesh or 2D landmarks +
//! depth buffer) into a canonical camera-space [`FaceFrame`], then evaluates
//! five pass/fail geometric criteria in a cascading state machine at frame
//! rate.

pub mod checks;
pub mod euler;
pub mod geometry;
pub mod pathway;
pub mod tolerances;
pub mod verifier;

pub use geometry::{extract, ExtractError, FaceFrame, SensorKind};
pub use pathway::{select_pathway, Pathway};
pub use tolerances::Tolerances;
pub use verifier::{Diagnostics, VerificationStage, VerificationState, Verifier};
