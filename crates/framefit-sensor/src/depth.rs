//! Depth buffer storage and bounds-checked sampling.
//!
//! Depth values are meters along the camera viewing axis. Landmark detectors
//! report points in normalized display coordinates (origin bottom-left, `v`
//! up); the buffer is stored in sensor-native landscape orientation (origin
//! top-left, row-major). The conversion between the two spaces depends on
//! device orientation and front-camera mirroring.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepthError {
    #[error("depth data length mismatch: {width}x{height} needs {expected}, got {actual}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// How the device is held relative to the sensor's native landscape frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorOrientation {
    Landscape,
    LandscapeUpsideDown,
    Portrait,
    PortraitUpsideDown,
}

/// A per-pixel depth map borrowed read-only for the duration of one
/// extraction. Construction validates the data length once so sampling can
/// stay branch-light.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, DepthError> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            tracing::warn!(
                width,
                height,
                expected,
                actual = data.len(),
                "rejecting depth buffer"
            );
            return Err(DepthError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample one depth value at a pixel coordinate.
    ///
    /// Returns `None` for any out-of-bounds coordinate and for non-finite or
    /// non-positive readings (sensor noise, occlusion holes). Never reads
    /// outside the buffer.
    pub fn sample(&self, x: i32, y: i32) -> Option<f32> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let idx = (y as usize) * (self.width as usize) + x as usize;
        let value = self.data[idx];
        if value.is_finite() && value > 0.0 {
            Some(value)
        } else {
            tracing::trace!(x, y, value, "discarding invalid depth sample");
            None
        }
    }

    /// Sample at a normalized display point, converting through the
    /// orientation-aware mapping first.
    pub fn sample_normalized(
        &self,
        u: f32,
        v: f32,
        orientation: SensorOrientation,
        mirrored: bool,
    ) -> Option<f32> {
        let (x, y) = normalized_to_pixel(u, v, self.width, self.height, orientation, mirrored)?;
        self.sample(x as i32, y as i32)
    }
}

/// Map a normalized display point (origin bottom-left, `v` up) to buffer
/// unit coordinates (origin top-left, `bv` down).
fn display_to_buffer_unit(
    u: f32,
    v: f32,
    orientation: SensorOrientation,
    mirrored: bool,
) -> (f32, f32) {
    let u = if mirrored { 1.0 - u } else { u };
    match orientation {
        SensorOrientation::Landscape => (u, 1.0 - v),
        SensorOrientation::LandscapeUpsideDown => (1.0 - u, v),
        SensorOrientation::Portrait => (v, u),
        SensorOrientation::PortraitUpsideDown => (1.0 - v, 1.0 - u),
    }
}

/// Inverse of [`display_to_buffer_unit`].
fn buffer_unit_to_display(
    bu: f32,
    bv: f32,
    orientation: SensorOrientation,
    mirrored: bool,
) -> (f32, f32) {
    let (u, v) = match orientation {
        SensorOrientation::Landscape => (bu, 1.0 - bv),
        SensorOrientation::LandscapeUpsideDown => (1.0 - bu, bv),
        SensorOrientation::Portrait => (bv, bu),
        SensorOrientation::PortraitUpsideDown => (1.0 - bv, 1.0 - bu),
    };
    let u = if mirrored { 1.0 - u } else { u };
    (u, v)
}

/// Convert a normalized display point into a pixel coordinate of a
/// `width`×`height` buffer. Returns `None` when the point lies outside the
/// unit square (a detector landmark clipped at the frame edge).
pub fn normalized_to_pixel(
    u: f32,
    v: f32,
    width: u32,
    height: u32,
    orientation: SensorOrientation,
    mirrored: bool,
) -> Option<(u32, u32)> {
    if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) || width == 0 || height == 0 {
        return None;
    }
    let (bu, bv) = display_to_buffer_unit(u, v, orientation, mirrored);
    let x = (bu * (width - 1) as f32).round() as u32;
    let y = (bv * (height - 1) as f32).round() as u32;
    Some((x.min(width - 1), y.min(height - 1)))
}

/// Convert a buffer pixel coordinate back to a normalized display point.
pub fn pixel_to_normalized(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    orientation: SensorOrientation,
    mirrored: bool,
) -> Option<(f32, f32)> {
    if x >= width || y >= height || width == 0 || height == 0 {
        return None;
    }
    let bu = if width > 1 {
        x as f32 / (width - 1) as f32
    } else {
        0.0
    };
    let bv = if height > 1 {
        y as f32 / (height - 1) as f32
    } else {
        0.0
    };
    Some(buffer_unit_to_display(bu, bv, orientation, mirrored))
}
