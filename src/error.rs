use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An audio or input device could not be queried this tick. The caller
    /// skips the affected operation and tries again next tick.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("could not allocate {bytes} bytes for the offscreen buffer")]
    AllocationFailure { bytes: usize },

    #[error("invalid offscreen buffer dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("invalid sound configuration: {0}")]
    InvalidSoundConfig(&'static str),

    #[error("cursor {cursor} is outside the {size} byte sound buffer")]
    CursorOutOfRange { cursor: u32, size: u32 },

    #[error("could not save screenshot: {0}")]
    Screenshot(#[from] image::ImageError),

    #[error("platform failure: {0}")]
    Platform(String),
}

impl Error {
    /// Device failures are skipped for the tick, everything else is fatal
    /// for the operation that produced it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::DeviceUnavailable(_))
    }
}
