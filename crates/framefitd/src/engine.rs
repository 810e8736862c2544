use framefit_core::{Tolerances, VerificationState, Verifier};
use framefit_sensor::{DeviceCapabilities, SensorFrame};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("device incompatible: neither sensor pathway is available")]
    DeviceIncompatible,
    #[error("engine thread exited")]
    ChannelClosed,
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Clone-safe handle to the engine thread.
///
/// Frames go in through a small bounded channel; the latest published
/// verification state comes out through a watch channel, so every observer
/// reads one coherent snapshot and never a torn update.
#[derive(Clone)]
pub struct EngineHandle {
    frame_tx: mpsc::Sender<SensorFrame>,
    state_rx: watch::Receiver<VerificationState>,
}

impl EngineHandle {
    /// Submit one sensor frame for verification. Never blocks the capture
    /// callback: when the worker is saturated the frame is dropped — a newer
    /// frame supersedes it anyway.
    pub fn submit(&self, frame: SensorFrame) -> Result<(), EngineError> {
        match self.frame_tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!("engine saturated, dropping frame");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(EngineError::ChannelClosed),
        }
    }

    /// Subscribe to published verification states.
    pub fn subscribe(&self) -> watch::Receiver<VerificationState> {
        self.state_rx.clone()
    }
}

/// Spawn the verification engine on a dedicated OS thread.
///
/// Fails fast at startup when the device offers neither sensor pathway —
/// the one fatal condition, surfaced once and never retried per frame.
pub fn spawn_engine(
    caps: DeviceCapabilities,
    tolerances: Tolerances,
) -> Result<EngineHandle, EngineError> {
    if !caps.is_supported() {
        return Err(EngineError::DeviceIncompatible);
    }

    tracing::info!(
        primary = caps.has_primary_sensor,
        secondary = caps.has_secondary_sensor,
        cascade = tolerances.cascade_on_failure,
        "starting verification engine"
    );

    let (frame_tx, mut frame_rx) = mpsc::channel::<SensorFrame>(4);
    let (state_tx, state_rx) = watch::channel(VerificationState::default());

    std::thread::Builder::new()
        .name("framefit-engine".into())
        .spawn(move || {
            let mut verifier = Verifier::new(tolerances);
            tracing::info!("engine thread started");

            while let Some(mut frame) = frame_rx.blocking_recv() {
                // Drop old, keep current: coalesce any queued frames so the
                // published state reflects the newest one.
                let mut superseded = 0usize;
                while let Ok(newer) = frame_rx.try_recv() {
                    frame = newer;
                    superseded += 1;
                }
                if superseded > 0 {
                    tracing::trace!(superseded, "coalesced stale frames");
                }

                let state = verifier.process_frame(&caps, &frame).clone();
                if state_tx.send(state).is_err() {
                    // No observers left; keep processing is pointless.
                    break;
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { frame_tx, state_rx })
}
