use anyhow::{Context, Result};
use framefit_sensor::SensorFrame;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;

/// Frame ingress: newline-delimited JSON `SensorFrame`s on stdin. The
/// camera/session collaborator is external; this keeps the daemon
/// exercisable from recordings without sensor hardware.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("framefitd starting");

    let config = config::Config::from_env();
    let handle = engine::spawn_engine(config.capabilities, config.tolerances)
        .context("failed to start verification engine")?;

    // Log every published state transition.
    let mut states = handle.subscribe();
    tokio::spawn(async move {
        let mut was_ready = false;
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            tracing::debug!(
                face = state.face_detected,
                distance = state.distance_ok,
                centering = state.centering_ok,
                head = state.head_aligned_ok,
                gaze = state.gaze_ok,
                "verification state"
            );
            if state.ready() && !was_ready {
                tracing::info!(diagnostics = ?state.diagnostics, "ready to capture");
            }
            was_ready = state.ready();
        }
    });

    tracing::info!("framefitd ready, reading frames from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match serde_json::from_str::<SensorFrame>(&line) {
                        Ok(frame) => {
                            handle.submit(frame)?;
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "skipping malformed frame");
                        }
                    },
                    None => {
                        tracing::info!("frame stream ended");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("framefitd shutting down");
                break;
            }
        }
    }

    Ok(())
}
