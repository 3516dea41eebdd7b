//! Error types for Infectus adapter operations

use thiserror::Error;

/// Infectus-specific errors
#[derive(Debug, Error)]
pub enum InfectusError {
    /// No adapter with the expected vendor ID was found
    #[error("no Infectus adapter found (VID 0x10C4)")]
    DeviceNotFound,

    /// Failed to open the USB device
    #[error("failed to open adapter: {0}")]
    OpenFailed(String),

    /// Failed to claim the USB interface
    #[error("failed to claim interface: {0}")]
    ClaimFailed(String),

    /// A USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// The bulk-out pipe stopped accepting data mid-frame
    #[error("short USB write ({written} of {requested} bytes)")]
    ShortWrite {
        /// Bytes accepted before the pipe stalled
        written: usize,
        /// Total frame length
        requested: usize,
    },

    /// Every reply began with the wrong sync marker
    #[error("reply out of sync after {attempts} attempts")]
    SyncLost {
        /// Exchange attempts made before giving up
        attempts: u32,
    },

    /// Status polling exhausted without seeing the ready sentinel
    #[error("chip not ready after {polls} status polls (last status 0x{status:02X})")]
    NotReady {
        /// Polls issued
        polls: u32,
        /// Last status byte observed
        status: u8,
    },

    /// A reply did not carry the expected payload bytes
    #[error("reply shorter than expected")]
    TruncatedReply,

    /// Configured chunk size outside (0, 2112]
    #[error("invalid chunk size {0} (must be 1..=2112)")]
    InvalidChunkSize(usize),

    /// Page index beyond the chip geometry
    #[error("page {0} out of range")]
    PageOutOfRange(u32),

    /// Block index beyond the chip geometry
    #[error("block {0} out of range")]
    BlockOutOfRange(u32),
}

/// Result type for Infectus operations
pub type Result<T> = std::result::Result<T, InfectusError>;
