use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::classifier::{EmotionEngine, preprocess_frame};
use crate::decision::{StreakTracker, decide};
use crate::error::CaptureError;
use crate::types::{DecisionResult, Frame, FrameSample};

pub const COUNTDOWN_SECS: u32 = 5;
pub const CAPTURE_SECS: f64 = 4.0;

// How long one tick waits for a frame before re-checking the deadline and
// the cancellation flag.
const FRAME_WAIT: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Countdown,
    Capturing,
    Showing,
}

/// Lifecycle state for one camera-screen activation. Created on show,
/// dropped on hide; nothing about a capture attempt outlives it.
#[derive(Debug)]
pub struct CaptureSession {
    phase: CapturePhase,
    cancel: Arc<AtomicBool>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            phase: CapturePhase::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Token checked by the capture loop at every tick boundary.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Start is a no-op unless the phase is exactly idle.
    pub fn start(&mut self) -> bool {
        if self.phase != CapturePhase::Idle {
            return false;
        }
        self.cancel.store(false, Ordering::SeqCst);
        self.phase = CapturePhase::Countdown;
        true
    }

    pub fn begin_capture(&mut self) -> bool {
        if self.phase != CapturePhase::Countdown {
            return false;
        }
        self.phase = CapturePhase::Capturing;
        true
    }

    pub fn show_result(&mut self) -> bool {
        if self.phase != CapturePhase::Capturing {
            return false;
        }
        self.phase = CapturePhase::Showing;
        true
    }

    /// Retry is only offered while a result is showing.
    pub fn retry(&mut self) -> bool {
        if self.phase != CapturePhase::Showing {
            return false;
        }
        self.phase = CapturePhase::Idle;
        true
    }

    /// Home/hide from any phase: cancels an in-flight window and returns to
    /// idle. Idempotent.
    pub fn reset(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.phase = CapturePhase::Idle;
    }

    /// A window that produced nothing re-enables start.
    pub fn abort_to_idle(&mut self) {
        self.phase = CapturePhase::Idle;
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct CaptureOutcome {
    pub result: DecisionResult,
    pub locked: bool,
    pub frames: usize,
}

/// Runs one capture window: sample frames until the deadline, classify each
/// one, and either lock early on a sustained streak or fall through to the
/// windowed vote. Inference failures skip the tick; the window survives
/// them.
pub fn run_capture_window<E: EmotionEngine>(
    engine: &mut E,
    frames: &Receiver<Frame>,
    cancel: &AtomicBool,
    duration: Duration,
) -> Result<CaptureOutcome, CaptureError> {
    let started = Instant::now();
    let mut history: Vec<FrameSample> = Vec::new();
    let mut streak = StreakTracker::new();

    while started.elapsed() < duration {
        if cancel.load(Ordering::Relaxed) {
            return Err(CaptureError::Cancelled);
        }

        let frame = match frames.recv_timeout(FRAME_WAIT) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("frame source closed mid-window, deciding on what we have");
                break;
            }
        };

        let input = match preprocess_frame(&frame) {
            Ok(input) => input,
            Err(err) => {
                log::warn!("skipping unusable frame: {err}");
                continue;
            }
        };

        let prediction = match engine.classify(input) {
            Ok(prediction) => prediction,
            Err(err) => {
                log::warn!("emotion inference failed: {err:?}");
                continue;
            }
        };

        history.push(FrameSample {
            timestamp: frame.timestamp,
            label: prediction.label.clone(),
            confidence: prediction.confidence,
        });

        if streak.observe(&prediction.label, prediction.confidence) {
            log::info!(
                "lock: {} ({:.3}) after {} frames",
                prediction.label,
                prediction.confidence,
                history.len()
            );
            return Ok(CaptureOutcome {
                result: DecisionResult {
                    label: prediction.label,
                    confidence: prediction.confidence,
                },
                locked: true,
                frames: history.len(),
            });
        }
    }

    if cancel.load(Ordering::Relaxed) {
        return Err(CaptureError::Cancelled);
    }

    let frames_seen = history.len();
    let result = decide(&history).ok_or(CaptureError::NoFramesCaptured)?;
    log::info!(
        "decision: {} ({:.3}) from {} frames",
        result.label,
        result.confidence,
        frames_seen
    );

    Ok(CaptureOutcome {
        result,
        locked: false,
        frames: frames_seen,
    })
}
