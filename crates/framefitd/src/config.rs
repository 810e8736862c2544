use framefit_core::Tolerances;
use framefit_sensor::DeviceCapabilities;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Sensor pathways the device offers, fixed for the session.
    pub capabilities: DeviceCapabilities,
    /// Pass/fail thresholds for the verification cascade.
    pub tolerances: Tolerances,
}

impl Config {
    /// Load configuration from `FRAMEFIT_*` environment variables with
    /// defaults. Capability flags come from the device-capability
    /// collaborator at deployment time; tolerances default to the reference
    /// thresholds.
    pub fn from_env() -> Self {
        let defaults = Tolerances::default();
        Self {
            capabilities: DeviceCapabilities::new(
                env_bool("FRAMEFIT_PRIMARY_SENSOR", true),
                env_bool("FRAMEFIT_SECONDARY_SENSOR", false),
            ),
            tolerances: Tolerances {
                centering_m: env_f32("FRAMEFIT_CENTERING_M", defaults.centering_m),
                head_alignment_deg: env_f32(
                    "FRAMEFIT_HEAD_ALIGNMENT_DEG",
                    defaults.head_alignment_deg,
                ),
                min_distance_m: env_f32("FRAMEFIT_MIN_DISTANCE_M", defaults.min_distance_m),
                max_distance_m: env_f32("FRAMEFIT_MAX_DISTANCE_M", defaults.max_distance_m),
                gaze_angle_rad: env_f32("FRAMEFIT_GAZE_ANGLE_RAD", defaults.gaze_angle_rad),
                blink_limit: env_f32("FRAMEFIT_BLINK_LIMIT", defaults.blink_limit),
                pupil_deviation: env_f32("FRAMEFIT_PUPIL_DEVIATION", defaults.pupil_deviation),
                cascade_on_failure: env_bool(
                    "FRAMEFIT_CASCADE_ON_FAILURE",
                    defaults.cascade_on_failure,
                ),
            },
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key).map(|v| v != "0").unwrap_or(default)
}
