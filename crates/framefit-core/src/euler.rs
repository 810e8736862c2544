//! Head rotation decomposition.
//!
//! Angle naming follows face conventions: pitch nods about X, yaw shakes
//! about Y, roll tilts about Z, composed as `Rz(roll) · Ry(yaw) · Rx(pitch)`.
//!
//! The quaternion decomposition is the production path: it has no gimbal
//! branch and stays continuous as yaw approaches ±90°. The rotation-matrix
//! decomposition is kept only as a cross-check reference; away from the
//! singularity both must agree.

use nalgebra::{Rotation3, UnitQuaternion, Vector3};

/// Head rotation split into per-axis angles, radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl EulerAngles {
    /// The same angles in degrees.
    pub fn degrees(&self) -> EulerAngles {
        EulerAngles {
            pitch: self.pitch.to_degrees(),
            yaw: self.yaw.to_degrees(),
            roll: self.roll.to_degrees(),
        }
    }
}

/// Decompose a unit quaternion into pitch/yaw/roll.
pub fn angles_from_quaternion(q: &UnitQuaternion<f32>) -> EulerAngles {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);
    EulerAngles {
        pitch: (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y)),
        yaw: (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin(),
        roll: (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z)),
    }
}

/// Compose pitch/yaw/roll back into a unit quaternion.
pub fn quaternion_from_angles(angles: &EulerAngles) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles.roll)
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles.yaw)
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles.pitch)
}

/// Rotation-matrix decomposition with an explicit gimbal branch.
///
/// Reference implementation only — production code uses
/// [`angles_from_quaternion`]. Near `|yaw| = 90°` the branch collapses roll
/// into pitch.
pub fn angles_from_matrix(r: &Rotation3<f32>) -> EulerAngles {
    let m = r.matrix();
    let sy = (-m[(2, 0)]).clamp(-1.0, 1.0);
    let yaw = sy.asin();

    if sy.abs() < 1.0 - 1e-6 {
        EulerAngles {
            pitch: m[(2, 1)].atan2(m[(2, 2)]),
            yaw,
            roll: m[(1, 0)].atan2(m[(0, 0)]),
        }
    } else {
        // cos(yaw) ≈ 0: pitch and roll are coupled, pin roll to zero.
        EulerAngles {
            pitch: (-m[(1, 2)]).atan2(m[(1, 1)]),
            yaw,
            roll: 0.0,
        }
    }
}
