//! Error types for rnand-core
//!
//! Adapter drivers map their transport-level failures onto this type at
//! the `NandProgrammer` boundary, so the engine and the CLI only ever see
//! one error vocabulary.

use core::fmt;

/// Core error type - small and `Copy`, suitable for trait-object seams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A USB round trip failed outright
    TransferFailed,
    /// Every reply began with the wrong sync marker; resynchronization
    /// gave up after the configured number of attempts
    SyncLost {
        /// Attempts made before giving up
        attempts: u32,
    },
    /// Status polling exhausted without observing the ready sentinel
    NotReady {
        /// Last status byte observed
        status: u8,
    },
    /// Chip ID read back as zero - no chip present or target unpowered
    ChipNotDetected,
    /// Chip ID is nonzero but not in the supported vendor list
    UnknownChip(u16),
    /// Page index beyond the chip geometry
    PageOutOfRange(u32),
    /// Block index beyond the chip geometry
    BlockOutOfRange(u32),
    /// Transfer chunk size outside (0, 2112]
    InvalidChunkSize(usize),
    /// Reply was too short to carry the expected payload
    TruncatedReply,
    /// Any other programmer-level failure
    ProgrammerError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferFailed => write!(f, "USB transfer failed"),
            Self::SyncLost { attempts } => {
                write!(f, "reply out of sync after {} attempts", attempts)
            }
            Self::NotReady { status } => {
                write!(f, "chip not ready (last status 0x{:02X})", status)
            }
            Self::ChipNotDetected => write!(
                f,
                "no flash chip detected; is the target device powered on?"
            ),
            Self::UnknownChip(id) => write!(f, "unknown flash chip ID 0x{:04X}", id),
            Self::PageOutOfRange(page) => write!(f, "page {} out of range", page),
            Self::BlockOutOfRange(block) => write!(f, "block {} out of range", block),
            Self::InvalidChunkSize(size) => {
                write!(f, "invalid chunk size {} (must be 1..=2112)", size)
            }
            Self::TruncatedReply => write!(f, "reply shorter than expected"),
            Self::ProgrammerError => write!(f, "programmer error"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
