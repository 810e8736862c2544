use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use framefit_core::{Tolerances, VerificationState, Verifier};
use framefit_sensor::{
    CameraIntrinsics, DepthBuffer, DeviceCapabilities, FaceObservation, SecondaryFrame,
    SensorFrame, SensorOrientation,
};
use nalgebra::Point2;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "framefit", about = "Framefit face positioning pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded frame file through the verification cascade
    Replay {
        /// JSON file containing an array of sensor frames
        #[arg(short, long)]
        input: PathBuf,
        /// Evaluate every stage independently instead of cascading
        #[arg(long)]
        no_cascade: bool,
        /// Print the final state as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Generate a synthetic secondary-pathway approach recording
    Synth {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
        /// Number of frames to generate
        #[arg(short, long, default_value_t = 30)]
        frames: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay {
            input,
            no_cascade,
            json,
        } => replay(&input, no_cascade, json),
        Commands::Synth { output, frames } => synth(&output, frames),
    }
}

fn replay(input: &PathBuf, no_cascade: bool, json: bool) -> Result<()> {
    let data = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let frames: Vec<SensorFrame> =
        serde_json::from_str(&data).context("failed to parse frame recording")?;
    if frames.is_empty() {
        bail!("recording contains no frames");
    }

    // Replay assumes the device offers whichever pathways the recording
    // exercises.
    let caps = DeviceCapabilities::new(true, true);
    let tolerances = Tolerances {
        cascade_on_failure: !no_cascade,
        ..Tolerances::default()
    };
    let mut verifier = Verifier::new(tolerances);

    let mut last = VerificationState::default();
    for (i, frame) in frames.iter().enumerate() {
        let state = verifier.process_frame(&caps, frame);
        if !json {
            println!("frame {i:4}  {}", summarize(state));
        }
        last = state.clone();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&last)?);
    }

    if !last.ready() {
        bail!("final frame is not ready for capture");
    }
    println!("ready to capture");
    Ok(())
}

fn summarize(state: &VerificationState) -> String {
    let mark = |ok: bool| if ok { "ok" } else { "--" };
    let d = &state.diagnostics;
    format!(
        "face:{} dist:{} center:{} head:{} gaze:{}  dist={} h={} v={}",
        mark(state.face_detected),
        mark(state.distance_ok),
        mark(state.centering_ok),
        mark(state.head_aligned_ok),
        mark(state.gaze_ok),
        d.distance_cm
            .map(|v| format!("{v:.1}cm"))
            .unwrap_or_else(|| "-".into()),
        d.horizontal_offset_cm
            .map(|v| format!("{v:+.2}cm"))
            .unwrap_or_else(|| "-".into()),
        d.vertical_offset_cm
            .map(|v| format!("{v:+.2}cm"))
            .unwrap_or_else(|| "-".into()),
    )
}

/// Synthesize a centered face approaching from out of range into the
/// acceptance window.
fn synth(output: &PathBuf, count: usize) -> Result<()> {
    let size = 101u32;
    let start = 0.90f32;
    let end = 0.35f32;

    let mut frames = Vec::with_capacity(count);
    for i in 0..count {
        let t = if count > 1 {
            i as f32 / (count - 1) as f32
        } else {
            1.0
        };
        let depth = start + (end - start) * t;
        frames.push(SensorFrame::Secondary(SecondaryFrame {
            observations: vec![centered_observation()],
            depth: DepthBuffer::new(size, size, vec![depth; (size * size) as usize])
                .context("failed to build synthetic depth buffer")?,
            intrinsics: CameraIntrinsics {
                fx: 500.0,
                fy: 500.0,
                cx: 50.0,
                cy: 50.0,
            },
            orientation: SensorOrientation::Landscape,
            mirrored: false,
        }));
    }

    let json = serde_json::to_string_pretty(&frames)?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {count} frames to {}", output.display());
    Ok(())
}

fn centered_observation() -> FaceObservation {
    FaceObservation {
        confidence: 0.97,
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
    }
}
