//! rnand-infectus - Infectus USB NAND programmer adapter support
//!
//! The Infectus is a USB adapter (Silicon Labs VID 0x10C4) exposing raw
//! NAND chip primitives over a single pair of bulk endpoints. Every
//! exchange is a framed command followed by a reply whose first byte is a
//! fixed sync marker; a reply that arrives out of sync causes the whole
//! exchange to be resent.
//!
//! # Protocol Overview
//!
//! Three frame shapes travel over the bulk-out pipe:
//!
//! - **command**: `[0x4E, 0,0,0,0,0,0, argc, opcode, args...]` carrying a
//!   NAND opcode plus up to five address/data bytes,
//! - **receive**: `[0x4E, 0x02, 0,0,0,0, len_hi, len_lo]` asking the
//!   adapter to return `len` bytes from its internal buffer,
//! - **data**: `[0x4E, 0x01, 0,0,0,0, len_hi, len_lo, payload...]`
//!   pushing one chunk of page data for a program operation.
//!
//! A 2112-byte page moves as `ceil(2112 / chunk_size)` sequential
//! receive/data exchanges; the chunk size is configurable.
//!
//! # Example
//!
//! ```no_run
//! use rnand_core::NandProgrammer;
//! use rnand_infectus::{Infectus, InfectusConfig};
//!
//! let mut dev = Infectus::open(InfectusConfig::default())?;
//! let id = dev.chip_id()?;
//! println!("chip ID: 0x{:04X}", id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod device;
mod error;
mod protocol;
mod transport;

pub use device::{Infectus, InfectusConfig};
pub use error::{InfectusError, Result};
pub use transport::{Transport, UsbTransport};
