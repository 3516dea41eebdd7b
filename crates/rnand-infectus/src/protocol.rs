//! Infectus protocol constants and frame builders
//!
//! All builders here are pure; nothing touches the adapter until a frame
//! is handed to the transport.

// ===========================================================================
// USB Device Identifiers
// ===========================================================================

/// Silicon Labs USB Vendor ID used by Infectus boards
pub const INFECTUS_VID: u16 = 0x10C4;

/// Bulk OUT endpoint address
pub const BULK_OUT_EP: u8 = 0x01;

/// Bulk IN endpoint address
pub const BULK_IN_EP: u8 = 0x81;

// ===========================================================================
// Framing
// ===========================================================================

/// First byte of every valid reply
pub const REPLY_SYNC: u8 = 0xFF;

/// Command-class tag for NAND operations
pub const CMD_NAND: u8 = 0x4E;

/// NAND sub-op: push data to the adapter's internal buffer
pub const NAND_SUB_SEND: u8 = 0x01;

/// NAND sub-op: pull data from the adapter's internal buffer
pub const NAND_SUB_RECV: u8 = 0x02;

/// Command-class tag for adapter control operations
pub const CMD_ADAPTER: u8 = 0x45;

/// Command-class tag for loader queries
pub const CMD_LOADER: u8 = 0x4C;

/// Adapter sub-op: reset
pub const ADAPTER_OP_RESET: u8 = 0x15;

/// Adapter sub-op: firmware version query
pub const ADAPTER_OP_VERSION: u8 = 0x13;

/// Adapter sub-op: select one of the wired NAND chips
pub const ADAPTER_OP_SELECT: u8 = 0x14;

/// Loader sub-op: loader version query
pub const LOADER_OP_VERSION: u8 = 0x07;

/// Loader sub-op: PLD firmware identity query
pub const LOADER_OP_PLD_ID: u8 = 0x15;

/// Default reply buffer size for command acknowledgements
pub const MAX_REPLY_LEN: usize = 128;

/// Fixed header length shared by all frame shapes
pub const CMD_HEADER_LEN: usize = 8;

/// Maximum address/data arguments in one NAND command
pub const MAX_NAND_ARGS: usize = 5;

// ===========================================================================
// NAND chip opcodes
// ===========================================================================

/// Opcodes understood by the NAND chip itself, forwarded by the adapter
pub mod nand_op {
    /// Reset the chip
    pub const RESET: u8 = 0xFF;
    /// Read the chip ID
    pub const READ_ID: u8 = 0x90;
    /// Read the status register
    pub const STATUS: u8 = 0x70;
    /// First phase of a block erase (carries the page address)
    pub const ERASE_SETUP: u8 = 0x60;
    /// Second phase of a block erase
    pub const ERASE_CONFIRM: u8 = 0xD0;
    /// First phase of a page read (carries the page address)
    pub const READ_SETUP: u8 = 0x00;
    /// Second phase of a page read
    pub const READ_CONFIRM: u8 = 0x30;
    /// First phase of a page program (carries column and page address)
    pub const PROGRAM_SETUP: u8 = 0x80;
    /// Second phase of a page program
    pub const PROGRAM_CONFIRM: u8 = 0x10;
}

// ===========================================================================
// PLD firmware identities
// ===========================================================================

/// Known PLD firmware names, indexed by the ID the loader reports
pub const PLD_NAMES: [&str; 8] = [
    "O2MOD",
    "Globe Hitachi",
    "Globe Samsung",
    "Infectus 78",
    "NAND Programmer",
    "2 NAND Programmer",
    "SPI Programmer",
    "XDowngrader",
];

/// PLD ID of the XDowngrader firmware, the only one NAND access has been
/// exercised against
pub const PLD_XDOWNGRADER: u8 = 7;

/// Look up a PLD firmware name by ID
pub fn pld_name(id: u8) -> Option<&'static str> {
    PLD_NAMES.get(id as usize).copied()
}

// ===========================================================================
// Frame builders
// ===========================================================================

/// A NAND command: one opcode plus up to five byte-wide arguments.
///
/// Logical argument values are masked to their low 8 bits at construction,
/// so callers can pass page addresses split with plain shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NandCommand {
    opcode: u8,
    args: [u8; MAX_NAND_ARGS],
    arg_count: usize,
}

impl NandCommand {
    /// Build a command. Panics if more than [`MAX_NAND_ARGS`] arguments
    /// are supplied; the chip command set never needs more than five.
    pub fn new(opcode: u8, args: &[u32]) -> Self {
        assert!(args.len() <= MAX_NAND_ARGS, "too many NAND command args");
        let mut masked = [0u8; MAX_NAND_ARGS];
        for (dst, &src) in masked.iter_mut().zip(args) {
            *dst = (src & 0xFF) as u8;
        }
        Self {
            opcode,
            args: masked,
            arg_count: args.len(),
        }
    }

    /// Serialize to a wire frame: 8-byte header, opcode, then the args
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = vec![0u8; CMD_HEADER_LEN + 1 + self.arg_count];
        frame[0] = CMD_NAND;
        frame[7] = self.arg_count as u8;
        frame[8] = self.opcode;
        frame[9..].copy_from_slice(&self.args[..self.arg_count]);
        frame
    }
}

/// Frame asking the adapter to return `len` buffered bytes
pub fn receive_frame(len: usize) -> [u8; CMD_HEADER_LEN] {
    let mut frame = [0u8; CMD_HEADER_LEN];
    frame[0] = CMD_NAND;
    frame[1] = NAND_SUB_RECV;
    frame[6] = (len >> 8) as u8;
    frame[7] = len as u8;
    frame
}

/// Expected reply length for a receive of `len` bytes (framing overhead
/// included)
pub fn receive_reply_len(len: usize) -> usize {
    len + 3
}

/// Frame pushing one chunk of page data into the adapter's buffer
pub fn data_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; CMD_HEADER_LEN + payload.len()];
    frame[0] = CMD_NAND;
    frame[1] = NAND_SUB_SEND;
    frame[6] = (payload.len() >> 8) as u8;
    frame[7] = payload.len() as u8;
    frame[CMD_HEADER_LEN..].copy_from_slice(payload);
    frame
}

/// Frame for an adapter/loader control operation
pub fn adapter_frame(class: u8, op: u8, arg: u8) -> [u8; CMD_HEADER_LEN] {
    let mut frame = [0u8; CMD_HEADER_LEN];
    frame[0] = class;
    frame[1] = op;
    frame[2] = arg;
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_frame_layout() {
        let cmd = NandCommand::new(nand_op::STATUS, &[]);
        assert_eq!(cmd.to_bytes(), [0x4E, 0, 0, 0, 0, 0, 0, 0, 0x70]);

        let cmd = NandCommand::new(nand_op::READ_ID, &[0]);
        assert_eq!(cmd.to_bytes(), [0x4E, 0, 0, 0, 0, 0, 0, 1, 0x90, 0x00]);
    }

    #[test]
    fn command_args_are_byte_masked() {
        let page: u32 = 0x0001_2345;
        let cmd = NandCommand::new(nand_op::ERASE_SETUP, &[page, page >> 8, page >> 16]);
        assert_eq!(
            cmd.to_bytes(),
            [0x4E, 0, 0, 0, 0, 0, 0, 3, 0x60, 0x45, 0x23, 0x01]
        );
    }

    #[test]
    fn read_setup_frame_carries_full_address() {
        let page: u32 = 130;
        let cmd = NandCommand::new(nand_op::READ_SETUP, &[0, 0, page, page >> 8, page >> 16]);
        assert_eq!(
            cmd.to_bytes(),
            [0x4E, 0, 0, 0, 0, 0, 0, 5, 0x00, 0x00, 0x00, 0x82, 0x00, 0x00]
        );
    }

    #[test]
    fn receive_frame_layout() {
        assert_eq!(
            receive_frame(0x2C0),
            [0x4E, 0x02, 0, 0, 0, 0, 0x02, 0xC0]
        );
        assert_eq!(receive_frame(1), [0x4E, 0x02, 0, 0, 0, 0, 0x00, 0x01]);
        assert_eq!(receive_reply_len(0x2C0), 0x2C3);
    }

    #[test]
    fn data_frame_layout() {
        let payload = [0xAA, 0xBB, 0xCC];
        let frame = data_frame(&payload);
        assert_eq!(&frame[..8], &[0x4E, 0x01, 0, 0, 0, 0, 0x00, 0x03]);
        assert_eq!(&frame[8..], &payload);

        let big = vec![0x55u8; 0x2C0];
        let frame = data_frame(&big);
        assert_eq!(frame[6], 0x02);
        assert_eq!(frame[7], 0xC0);
        assert_eq!(frame.len(), 8 + 0x2C0);
    }

    #[test]
    fn adapter_frames() {
        assert_eq!(
            adapter_frame(CMD_ADAPTER, ADAPTER_OP_RESET, 0),
            [0x45, 0x15, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            adapter_frame(CMD_ADAPTER, ADAPTER_OP_SELECT, 1),
            [0x45, 0x14, 1, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            adapter_frame(CMD_LOADER, LOADER_OP_PLD_ID, 0),
            [0x4C, 0x15, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn pld_lookup() {
        assert_eq!(pld_name(PLD_XDOWNGRADER), Some("XDowngrader"));
        assert_eq!(pld_name(0), Some("O2MOD"));
        assert_eq!(pld_name(8), None);
    }
}
