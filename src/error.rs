//! Error types for disha-gnss

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Daemon error types
///
/// Frame-level problems are soft and never escalate past the decode
/// boundary; everything else here is fatal to the component that hit it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be written
    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// Frame-level decode failure (soft, absorbed by the pipeline)
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Telemetry sink failure
    #[error("Telemetry sink error: {0}")]
    Telemetry(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Recoverable framing failures from the UBX decoder
///
/// These are classifications, not faults: the decoder keeps running and the
/// pipeline converts them into `Unrecognized` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Checksum mismatch
    #[error("checksum mismatch: expected {expected:02X?}, got {actual:02X?}")]
    BadChecksum {
        /// Checksum computed over the frame body
        expected: [u8; 2],
        /// Checksum carried by the frame
        actual: [u8; 2],
    },

    /// Declared payload length exceeds the decoder's frame limit
    #[error("payload length {len} exceeds maximum {max}")]
    Oversized { len: usize, max: usize },

    /// Frame body could not be extracted from the buffer
    #[error("truncated frame")]
    Truncated,
}
