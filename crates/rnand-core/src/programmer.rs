//! The programmer seam between the engine and adapter drivers

use crate::error::Result;
use crate::geometry::PAGE_SIZE;

/// Status byte value signaling the chip has completed its last operation
pub const STATUS_READY: u8 = 0xC0;

/// A NAND programmer: the chip-level primitives the engine is built on.
///
/// Implementations block until the operation's round trips complete; the
/// engine issues one call at a time. All addressing is in whole pages or
/// whole erase blocks per the fixed geometry in [`crate::geometry`].
pub trait NandProgrammer {
    /// Read the two-byte chip ID (resets the chip first).
    ///
    /// Zero means no chip answered; see [`crate::chip::detect`].
    fn chip_id(&mut self) -> Result<u16>;

    /// Select one of the chips on a dual-NAND board (typically 0 or 1)
    fn select_chip(&mut self, chip: u8) -> Result<()>;

    /// Read the raw status byte
    fn status(&mut self) -> Result<u8>;

    /// Erase one block (all 64 pages return to 0xFF)
    fn erase_block(&mut self, block: u32) -> Result<()>;

    /// Read one page into `buf`
    fn read_page(&mut self, page: u32, buf: &mut [u8; PAGE_SIZE]) -> Result<()>;

    /// Program one page. The page must have been erased; NAND programming
    /// can only clear bits.
    fn write_page(&mut self, page: u32, data: &[u8; PAGE_SIZE]) -> Result<()>;
}
