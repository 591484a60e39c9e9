use thiserror::Error;

/// Failure taxonomy for the capture screen. Per-tick inference errors are
/// deliberately not here: they stay `anyhow::Error` inside the loop, which
/// logs them and drops the tick.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("frame has invalid dimensions {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },

    #[error("no frames captured during the window")]
    NoFramesCaptured,

    #[error("capture window cancelled")]
    Cancelled,

    #[error("no animation mapped for emotion {0:?}")]
    UnmappedLabel(String),

    #[error("failed to load {what}: {cause}")]
    ResourceLoad {
        what: &'static str,
        cause: anyhow::Error,
    },

    #[error("camera device unavailable: {0}")]
    DeviceChange(String),
}

impl CaptureError {
    pub fn resource(what: &'static str, cause: anyhow::Error) -> Self {
        CaptureError::ResourceLoad { what, cause }
    }
}
