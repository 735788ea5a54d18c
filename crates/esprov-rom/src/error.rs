//! Error types for ROM loader sessions
//!
//! Only session-fatal conditions live here. Protocol-level anomalies
//! (mismatched or missing responses) are reported as
//! [`CommandReply::Invalid`](crate::protocol::CommandReply) and recovered
//! by the caller's retry policy.

use thiserror::Error;

/// Session-terminating errors
#[derive(Debug, Error)]
pub enum Error {
    /// The serial port could not be opened
    #[error("Failed to open port: {0}")]
    Connection(String),

    /// Serial port fault after open
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(String),

    /// SYNC retries exhausted without a valid response from the ROM loader
    #[error("Bootloader synchronization failed")]
    SyncFailed,
}

/// Result type for ROM loader operations
pub type Result<T> = core::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
