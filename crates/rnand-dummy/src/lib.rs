//! rnand-dummy - In-memory NAND emulator
//!
//! Emulates a full 4096-block NAND chip in memory with real NAND write
//! semantics (programming only clears bits; erasing a block restores
//! 0xFF). Useful for testing and for rehearsing the program logic without
//! hardware. Pages are stored sparsely, so an idle 512 MiB chip costs
//! nothing.

#![warn(missing_docs)]

use std::collections::HashMap;

use rnand_core::error::{Error, Result};
use rnand_core::geometry::{block_pages, BLOCK_COUNT, PAGE_COUNT, PAGE_SIZE};
use rnand_core::programmer::{NandProgrammer, STATUS_READY};

/// In-memory NAND chip.
///
/// Every erase and program operation is appended to a log, so tests can
/// assert not just the final contents but exactly which operations were
/// issued (the program engine's whole point is issuing as few as
/// possible).
pub struct DummyNand {
    id: u16,
    pages: HashMap<u32, Box<[u8; PAGE_SIZE]>>,
    erase_log: Vec<u32>,
    write_log: Vec<u32>,
}

impl DummyNand {
    /// Create a blank chip reporting the Hynix 512 MiB chip ID
    pub fn new() -> Self {
        Self::with_id(0xADDC)
    }

    /// Create a blank chip reporting an arbitrary chip ID
    pub fn with_id(id: u16) -> Self {
        Self {
            id,
            pages: HashMap::new(),
            erase_log: Vec::new(),
            write_log: Vec::new(),
        }
    }

    /// Set a page's content directly, bypassing NAND semantics and the
    /// operation log (test fixture setup)
    pub fn fill_page(&mut self, page: u32, data: &[u8; PAGE_SIZE]) {
        self.pages.insert(page, Box::new(*data));
    }

    /// Copy of a page's current content (0xFF if never written)
    pub fn page(&self, page: u32) -> [u8; PAGE_SIZE] {
        match self.pages.get(&page) {
            Some(data) => **data,
            None => [0xFF; PAGE_SIZE],
        }
    }

    /// Blocks erased so far, in order
    pub fn erase_log(&self) -> &[u32] {
        &self.erase_log
    }

    /// Pages programmed so far, in order
    pub fn write_log(&self) -> &[u32] {
        &self.write_log
    }

    /// Forget the operation logs (chip contents are kept)
    pub fn clear_logs(&mut self) {
        self.erase_log.clear();
        self.write_log.clear();
    }
}

impl Default for DummyNand {
    fn default() -> Self {
        Self::new()
    }
}

impl NandProgrammer for DummyNand {
    fn chip_id(&mut self) -> Result<u16> {
        Ok(self.id)
    }

    fn select_chip(&mut self, _chip: u8) -> Result<()> {
        Ok(())
    }

    fn status(&mut self) -> Result<u8> {
        Ok(STATUS_READY)
    }

    fn erase_block(&mut self, block: u32) -> Result<()> {
        if block >= BLOCK_COUNT {
            return Err(Error::BlockOutOfRange(block));
        }
        for page in block_pages(block) {
            self.pages.remove(&page);
        }
        self.erase_log.push(block);
        Ok(())
    }

    fn read_page(&mut self, page: u32, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if page >= PAGE_COUNT {
            return Err(Error::PageOutOfRange(page));
        }
        *buf = self.page(page);
        Ok(())
    }

    fn write_page(&mut self, page: u32, data: &[u8; PAGE_SIZE]) -> Result<()> {
        if page >= PAGE_COUNT {
            return Err(Error::PageOutOfRange(page));
        }
        let current = self
            .pages
            .entry(page)
            .or_insert_with(|| Box::new([0xFF; PAGE_SIZE]));
        // Programming can only clear bits
        for (cur, &new) in current.iter_mut().zip(data.iter()) {
            *cur &= new;
        }
        self.write_log.push(page);
        Ok(())
    }
}
