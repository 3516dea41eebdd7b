//! Infectus device implementation
//!
//! `Infectus` owns a transport and implements the framed exchange (send a
//! frame, read the reply, require the sync marker, resend on violation)
//! plus the chip-level operations the engine needs.

use rnand_core::error::{Error as CoreError, Result as CoreResult};
use rnand_core::geometry::{
    block_first_page, DEFAULT_CHUNK_SIZE, BLOCK_COUNT, PAGE_COUNT, PAGE_SIZE,
};
use rnand_core::programmer::{NandProgrammer, STATUS_READY};

use crate::error::{InfectusError, Result};
use crate::protocol::*;
use crate::transport::{Transport, UsbTransport};

/// Configuration options for opening an Infectus adapter
#[derive(Debug, Clone)]
pub struct InfectusConfig {
    /// Device index (when multiple adapters are connected)
    pub device_index: usize,
    /// Which NAND chip to select on dual-NAND boards (0 or 1)
    pub chip_select: u8,
    /// Transfer chunk size for page payloads, in (0, 2112]
    pub chunk_size: usize,
    /// Skip erase and program operations, reporting success instead
    pub dry_run: bool,
    /// Poll chip status after each erase and each program chunk
    pub wait_ready: bool,
    /// Exchange attempts before a desynchronized adapter is given up on.
    /// Each attempt resends the frame; a healthy adapter needs one.
    pub max_resync_attempts: u32,
    /// Status polls before `wait_ready` gives up
    pub max_status_polls: u32,
}

impl Default for InfectusConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            chip_select: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            dry_run: false,
            wait_ready: false,
            max_resync_attempts: 64,
            max_status_polls: 100_000,
        }
    }
}

/// Infectus USB NAND programmer
pub struct Infectus<T: Transport> {
    transport: T,
    config: InfectusConfig,
}

impl Infectus<UsbTransport> {
    /// Open the adapter over USB and bring it to a usable state
    pub fn open(config: InfectusConfig) -> Result<Self> {
        let transport = UsbTransport::open(config.device_index)?;
        Self::new(transport, config)
    }
}

impl<T: Transport> Infectus<T> {
    /// Initialize the adapter on an already-open transport.
    ///
    /// Resets the adapter, logs its firmware identity, and selects the
    /// configured NAND chip.
    pub fn new(transport: T, config: InfectusConfig) -> Result<Self> {
        if config.chunk_size == 0 || config.chunk_size > PAGE_SIZE {
            return Err(InfectusError::InvalidChunkSize(config.chunk_size));
        }

        let mut dev = Self { transport, config };

        dev.adapter_reset()?;

        let version = dev.adapter_version()?;
        let (loader_major, loader_minor) = dev.loader_version()?;
        log::info!(
            "Infectus adapter version 0x{:02X}, loader {}.{}",
            version,
            loader_major,
            loader_minor
        );

        let pld = dev.pld_id()?;
        match pld_name(pld) {
            Some(name) => log::info!("PLD firmware: {}", name),
            None => log::warn!("unknown PLD ID {}", pld),
        }
        if pld != PLD_XDOWNGRADER {
            log::warn!("NAND access has only been exercised with the XDowngrader PLD firmware");
        }

        dev.select(dev.config.chip_select)?;

        Ok(dev)
    }

    // -----------------------------------------------------------------------
    // Framed exchange
    // -----------------------------------------------------------------------

    /// Send a frame and return the reply payload (sync marker stripped).
    ///
    /// A reply that does not begin with the sync marker restarts the whole
    /// exchange, up to `max_resync_attempts` times.
    fn exchange(&mut self, frame: &[u8], max_reply: usize) -> Result<Vec<u8>> {
        for _ in 0..self.config.max_resync_attempts {
            self.send_frame(frame)?;

            let mut reply = vec![0u8; max_reply];
            let n = self.transport.read(&mut reply)?;

            if n == 0 || reply[0] != REPLY_SYNC {
                log::warn!(
                    "reply began with 0x{:02X}, expected 0x{:02X}; resending",
                    reply.first().copied().unwrap_or(0),
                    REPLY_SYNC
                );
                continue;
            }

            reply.truncate(n);
            reply.remove(0);
            return Ok(reply);
        }

        Err(InfectusError::SyncLost {
            attempts: self.config.max_resync_attempts,
        })
    }

    /// Write a frame in full, resuming after short writes
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < frame.len() {
            let n = self.transport.write(&frame[written..])?;
            if n == 0 {
                return Err(InfectusError::ShortWrite {
                    written,
                    requested: frame.len(),
                });
            }
            written += n;
            if written < frame.len() {
                log::warn!("short write ({} of {} bytes), resuming", written, frame.len());
            }
        }
        Ok(())
    }

    fn nand_command(&mut self, cmd: &NandCommand) -> Result<Vec<u8>> {
        self.exchange(&cmd.to_bytes(), MAX_REPLY_LEN)
    }

    fn nand_receive(&mut self, len: usize) -> Result<Vec<u8>> {
        self.exchange(&receive_frame(len), receive_reply_len(len))
    }

    // -----------------------------------------------------------------------
    // Adapter control
    // -----------------------------------------------------------------------

    /// Reset the adapter, reissuing the command until it answers
    fn adapter_reset(&mut self) -> Result<()> {
        let frame = adapter_frame(CMD_ADAPTER, ADAPTER_OP_RESET, 0);
        for _ in 0..self.config.max_resync_attempts {
            match self.exchange(&frame, MAX_REPLY_LEN) {
                Ok(_) => return Ok(()),
                Err(InfectusError::SyncLost { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(InfectusError::SyncLost {
            attempts: self.config.max_resync_attempts,
        })
    }

    /// Query the adapter firmware version byte
    pub fn adapter_version(&mut self) -> Result<u8> {
        let reply = self.exchange(
            &adapter_frame(CMD_ADAPTER, ADAPTER_OP_VERSION, 1),
            MAX_REPLY_LEN,
        )?;
        reply.first().copied().ok_or(InfectusError::TruncatedReply)
    }

    /// Query the loader version as (major, minor)
    pub fn loader_version(&mut self) -> Result<(u8, u8)> {
        let reply = self.exchange(
            &adapter_frame(CMD_LOADER, LOADER_OP_VERSION, 0),
            MAX_REPLY_LEN,
        )?;
        match reply[..] {
            [major, minor, ..] => Ok((major, minor)),
            _ => Err(InfectusError::TruncatedReply),
        }
    }

    /// Query the PLD firmware ID
    pub fn pld_id(&mut self) -> Result<u8> {
        let reply = self.exchange(
            &adapter_frame(CMD_LOADER, LOADER_OP_PLD_ID, 0),
            MAX_REPLY_LEN,
        )?;
        reply.first().copied().ok_or(InfectusError::TruncatedReply)
    }

    fn select(&mut self, chip: u8) -> Result<()> {
        self.exchange(
            &adapter_frame(CMD_ADAPTER, ADAPTER_OP_SELECT, chip),
            MAX_REPLY_LEN,
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // NAND chip operations
    // -----------------------------------------------------------------------

    fn nand_reset(&mut self) -> Result<()> {
        self.nand_command(&NandCommand::new(nand_op::RESET, &[]))?;
        Ok(())
    }

    fn read_id(&mut self) -> Result<u16> {
        self.nand_reset()?;
        self.nand_command(&NandCommand::new(nand_op::READ_ID, &[0]))?;
        let reply = self.nand_receive(2)?;
        match reply[..] {
            [hi, lo, ..] => Ok(u16::from_be_bytes([hi, lo])),
            _ => Err(InfectusError::TruncatedReply),
        }
    }

    fn read_status(&mut self) -> Result<u8> {
        self.nand_command(&NandCommand::new(nand_op::STATUS, &[]))?;
        let reply = self.nand_receive(1)?;
        reply.first().copied().ok_or(InfectusError::TruncatedReply)
    }

    /// Poll the status register until the ready sentinel appears
    pub fn wait_ready(&mut self) -> Result<()> {
        let mut status = 0;
        for _ in 0..self.config.max_status_polls {
            status = self.read_status()?;
            if status == STATUS_READY {
                return Ok(());
            }
            log::debug!("status = 0x{:02X}", status);
        }
        Err(InfectusError::NotReady {
            polls: self.config.max_status_polls,
            status,
        })
    }

    fn erase(&mut self, block: u32) -> Result<()> {
        if block >= BLOCK_COUNT {
            return Err(InfectusError::BlockOutOfRange(block));
        }
        if self.config.dry_run {
            log::info!("dry run: skipping erase of block {}", block);
            return Ok(());
        }

        let page = block_first_page(block);
        self.nand_command(&NandCommand::new(
            nand_op::ERASE_SETUP,
            &[page, page >> 8, page >> 16],
        ))?;
        self.nand_command(&NandCommand::new(nand_op::ERASE_CONFIRM, &[]))?;

        if self.config.wait_ready {
            self.wait_ready()?;
        }
        Ok(())
    }

    fn read(&mut self, page: u32, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if page >= PAGE_COUNT {
            return Err(InfectusError::PageOutOfRange(page));
        }

        self.nand_command(&NandCommand::new(
            nand_op::READ_SETUP,
            &[0, 0, page, page >> 8, page >> 16],
        ))?;
        self.nand_command(&NandCommand::new(nand_op::READ_CONFIRM, &[]))?;

        let mut offset = 0;
        while offset < PAGE_SIZE {
            let want = self.config.chunk_size.min(PAGE_SIZE - offset);
            let chunk = self.nand_receive(want)?;
            if chunk.len() != want {
                log::warn!(
                    "page {}: expected {}-byte chunk, got {}",
                    page,
                    want,
                    chunk.len()
                );
            }
            let n = chunk.len().min(want);
            buf[offset..offset + n].copy_from_slice(&chunk[..n]);
            offset += want;
        }
        Ok(())
    }

    fn write(&mut self, page: u32, data: &[u8; PAGE_SIZE]) -> Result<()> {
        if page >= PAGE_COUNT {
            return Err(InfectusError::PageOutOfRange(page));
        }
        if self.config.dry_run {
            log::info!("dry run: skipping program of page {}", page);
            return Ok(());
        }

        let mut offset = 0;
        while offset < PAGE_SIZE {
            let len = self.config.chunk_size.min(PAGE_SIZE - offset);
            let column = offset as u32;

            self.nand_command(&NandCommand::new(
                nand_op::PROGRAM_SETUP,
                &[column, column >> 8, page, page >> 8, page >> 16],
            ))?;
            self.exchange(&data_frame(&data[offset..offset + len]), MAX_REPLY_LEN)?;
            self.nand_command(&NandCommand::new(nand_op::PROGRAM_CONFIRM, &[]))?;

            if self.config.wait_ready {
                self.wait_ready()?;
            }
            offset += len;
        }
        Ok(())
    }
}

fn core_err(e: InfectusError) -> CoreError {
    match e {
        InfectusError::SyncLost { attempts } => CoreError::SyncLost { attempts },
        InfectusError::NotReady { status, .. } => CoreError::NotReady { status },
        InfectusError::TruncatedReply => CoreError::TruncatedReply,
        InfectusError::PageOutOfRange(page) => CoreError::PageOutOfRange(page),
        InfectusError::BlockOutOfRange(block) => CoreError::BlockOutOfRange(block),
        InfectusError::InvalidChunkSize(size) => CoreError::InvalidChunkSize(size),
        InfectusError::DeviceNotFound
        | InfectusError::OpenFailed(_)
        | InfectusError::ClaimFailed(_) => CoreError::ProgrammerError,
        InfectusError::TransferFailed(_) | InfectusError::ShortWrite { .. } => {
            CoreError::TransferFailed
        }
    }
}

impl<T: Transport> NandProgrammer for Infectus<T> {
    fn chip_id(&mut self) -> CoreResult<u16> {
        self.read_id().map_err(core_err)
    }

    fn select_chip(&mut self, chip: u8) -> CoreResult<()> {
        self.select(chip).map_err(core_err)
    }

    fn status(&mut self) -> CoreResult<u8> {
        self.read_status().map_err(core_err)
    }

    fn erase_block(&mut self, block: u32) -> CoreResult<()> {
        self.erase(block).map_err(core_err)
    }

    fn read_page(&mut self, page: u32, buf: &mut [u8; PAGE_SIZE]) -> CoreResult<()> {
        self.read(page, buf).map_err(core_err)
    }

    fn write_page(&mut self, page: u32, data: &[u8; PAGE_SIZE]) -> CoreResult<()> {
        self.write(page, data).map_err(core_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted transport: records every frame written, pops one canned
    /// reply per read
    struct MockTransport {
        sent: Vec<Vec<u8>>,
        replies: VecDeque<Vec<u8>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                replies: VecDeque::new(),
            }
        }

        fn push_reply(&mut self, reply: &[u8]) {
            self.replies.push_back(reply.to_vec());
        }

        /// A bare acknowledgement: sync marker, no payload
        fn push_ack(&mut self) {
            self.push_reply(&[REPLY_SYNC]);
        }
    }

    impl Transport for MockTransport {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            self.sent.push(data.to_vec());
            Ok(data.len())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let reply = self.replies.pop_front().expect("no scripted reply left");
            let n = reply.len().min(buf.len());
            buf[..n].copy_from_slice(&reply[..n]);
            Ok(n)
        }
    }

    /// Replies consumed by `Infectus::new`: adapter reset, version,
    /// loader version, PLD ID, chip select
    fn script_init(transport: &mut MockTransport) {
        transport.push_ack();
        transport.push_reply(&[REPLY_SYNC, 0x21]);
        transport.push_reply(&[REPLY_SYNC, 1, 2]);
        transport.push_reply(&[REPLY_SYNC, PLD_XDOWNGRADER]);
        transport.push_ack();
    }

    fn open_mock(config: InfectusConfig) -> Infectus<MockTransport> {
        let mut transport = MockTransport::new();
        script_init(&mut transport);
        Infectus::new(transport, config).unwrap()
    }

    #[test]
    fn rejects_bad_chunk_size() {
        for size in [0, PAGE_SIZE + 1] {
            let config = InfectusConfig {
                chunk_size: size,
                ..Default::default()
            };
            match Infectus::new(MockTransport::new(), config) {
                Err(InfectusError::InvalidChunkSize(s)) => assert_eq!(s, size),
                Err(e) => panic!("unexpected error: {}", e),
                Ok(_) => panic!("open accepted chunk size {}", size),
            }
        }
    }

    #[test]
    fn wrong_sync_byte_causes_exactly_one_resend() {
        let mut dev = open_mock(InfectusConfig::default());
        dev.transport.push_reply(&[0x00, 0xAA]);
        dev.transport.push_reply(&[REPLY_SYNC, 0xAA]);

        let sent_before = dev.transport.sent.len();
        let reply = dev
            .nand_command(&NandCommand::new(nand_op::STATUS, &[]))
            .unwrap();

        assert_eq!(reply, [0xAA]);
        assert_eq!(dev.transport.sent.len(), sent_before + 2);
        let frames = &dev.transport.sent[sent_before..];
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn persistent_desync_is_bounded() {
        let mut dev = open_mock(InfectusConfig {
            max_resync_attempts: 3,
            ..Default::default()
        });
        for _ in 0..3 {
            dev.transport.push_reply(&[0x00]);
        }

        let err = dev
            .nand_command(&NandCommand::new(nand_op::STATUS, &[]))
            .unwrap_err();
        assert!(matches!(err, InfectusError::SyncLost { attempts: 3 }));
        assert!(dev.transport.replies.is_empty());
    }

    #[test]
    fn chip_id_composition() {
        let mut dev = open_mock(InfectusConfig::default());
        dev.transport.push_ack(); // NAND reset
        dev.transport.push_ack(); // read-ID command
        dev.transport.push_reply(&[REPLY_SYNC, 0xAD, 0xDC]);

        assert_eq!(dev.read_id().unwrap(), 0xADDC);
        assert_eq!(dev.transport.sent.last().unwrap(), &receive_frame(2));
    }

    #[test]
    fn read_page_assembles_default_chunks() {
        let mut dev = open_mock(InfectusConfig::default());
        dev.transport.push_ack(); // read setup
        dev.transport.push_ack(); // read confirm
        for fill in [0x11u8, 0x22, 0x33] {
            let mut reply = vec![fill; DEFAULT_CHUNK_SIZE + 1];
            reply[0] = REPLY_SYNC;
            dev.transport.push_reply(&reply);
        }

        let mut buf = [0u8; PAGE_SIZE];
        dev.read(5, &mut buf).unwrap();

        assert!(buf[..704].iter().all(|&b| b == 0x11));
        assert!(buf[704..1408].iter().all(|&b| b == 0x22));
        assert!(buf[1408..].iter().all(|&b| b == 0x33));

        // three receive frames, each asking for a full chunk
        let receives: Vec<_> = dev
            .transport
            .sent
            .iter()
            .filter(|f| f.len() == 8 && f[0] == CMD_NAND && f[1] == NAND_SUB_RECV)
            .collect();
        assert_eq!(receives.len(), 3);
        assert!(receives.iter().all(|f| **f == receive_frame(704)));
    }

    #[test]
    fn read_page_requests_explicit_remainder_chunk() {
        let mut dev = open_mock(InfectusConfig {
            chunk_size: 500,
            ..Default::default()
        });
        dev.transport.push_ack();
        dev.transport.push_ack();
        for want in [500usize, 500, 500, 500, 112] {
            let mut reply = vec![0x5Au8; want + 1];
            reply[0] = REPLY_SYNC;
            dev.transport.push_reply(&reply);
        }

        let mut buf = [0u8; PAGE_SIZE];
        dev.read(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x5A));

        assert_eq!(dev.transport.sent.last().unwrap(), &receive_frame(112));
    }

    #[test]
    fn write_page_moves_exactly_one_page() {
        let mut dev = open_mock(InfectusConfig::default());
        // 3 chunks x (setup + data + confirm)
        for _ in 0..9 {
            dev.transport.push_ack();
        }

        let sent_before = dev.transport.sent.len();
        let data = [0xA5u8; PAGE_SIZE];
        dev.write(3, &data).unwrap();

        let frames = &dev.transport.sent[sent_before..];
        let payload_total: usize = frames
            .iter()
            .filter(|f| f[0] == CMD_NAND && f[1] == NAND_SUB_SEND)
            .map(|f| f.len() - 8)
            .sum();
        assert_eq!(payload_total, PAGE_SIZE);

        // program-setup frames carry the chunk's column offset
        let setups: Vec<_> = frames
            .iter()
            .filter(|f| f.len() > 8 && f[8] == nand_op::PROGRAM_SETUP)
            .collect();
        assert_eq!(setups.len(), 3);
        assert_eq!((setups[1][9], setups[1][10]), (0xC0, 0x02)); // column 0x2C0
        assert_eq!((setups[2][9], setups[2][10]), (0x80, 0x05)); // column 0x580
    }

    #[test]
    fn dry_run_issues_no_traffic() {
        let mut dev = open_mock(InfectusConfig {
            dry_run: true,
            ..Default::default()
        });
        let sent_before = dev.transport.sent.len();

        dev.erase(7).unwrap();
        dev.write(7 * 64, &[0u8; PAGE_SIZE]).unwrap();

        assert_eq!(dev.transport.sent.len(), sent_before);
    }

    #[test]
    fn erase_encodes_block_start_page() {
        let mut dev = open_mock(InfectusConfig::default());
        dev.transport.push_ack();
        dev.transport.push_ack();

        let sent_before = dev.transport.sent.len();
        dev.erase(2).unwrap();

        // block 2 starts at page 128 = 0x000080
        let setup = &dev.transport.sent[sent_before];
        assert_eq!(&setup[..], &[0x4E, 0, 0, 0, 0, 0, 0, 3, 0x60, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn wait_ready_polls_until_sentinel() {
        let mut dev = open_mock(InfectusConfig::default());
        for status in [0x80u8, 0x80, STATUS_READY] {
            dev.transport.push_ack(); // status command
            dev.transport.push_reply(&[REPLY_SYNC, status]);
        }

        dev.wait_ready().unwrap();
        assert!(dev.transport.replies.is_empty());
    }

    #[test]
    fn wait_ready_exhaustion_is_an_error() {
        let mut dev = open_mock(InfectusConfig {
            max_status_polls: 2,
            ..Default::default()
        });
        for _ in 0..2 {
            dev.transport.push_ack();
            dev.transport.push_reply(&[REPLY_SYNC, 0x80]);
        }

        let err = dev.wait_ready().unwrap_err();
        assert!(matches!(
            err,
            InfectusError::NotReady {
                polls: 2,
                status: 0x80
            }
        ));
    }

    #[test]
    fn out_of_range_addresses_are_rejected() {
        let mut dev = open_mock(InfectusConfig::default());
        let mut buf = [0u8; PAGE_SIZE];

        assert!(matches!(
            dev.read(PAGE_COUNT, &mut buf),
            Err(InfectusError::PageOutOfRange(_))
        ));
        assert!(matches!(
            dev.erase(BLOCK_COUNT),
            Err(InfectusError::BlockOutOfRange(_))
        ));
    }
}
