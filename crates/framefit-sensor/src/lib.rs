//! framefit-sensor — Sensor abstraction for the face positioning pipeline.
//!
//! Owns the frame types delivered by the camera/session collaborator, the
//! bounds-checked depth sampler, and the landmark resolver that maps
//! normalized detector coordinates into pixel spaces.

pub mod capabilities;
pub mod depth;
pub mod frame;
pub mod landmarks;

pub use capabilities::DeviceCapabilities;
pub use depth::{DepthBuffer, DepthError, SensorOrientation};
pub use frame::{CameraIntrinsics, FaceAnchor, PrimaryFrame, SecondaryFrame, SensorFrame};
pub use landmarks::{best_observation, region_centroid, FaceObservation, ResolvedLandmarks};
