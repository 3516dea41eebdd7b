//! Whole-chip dump and program operations
//!
//! `dump` reads every page into a flat image file (one 2112-byte record
//! per page, in ascending page order). `program` is the write-minimizing
//! counterpart: it compares each block against the image and only erases
//! and rewrites blocks that actually differ, skipping pages that are
//! blank in the image. Programming the same image twice therefore leaves
//! the chip untouched on the second pass.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::ecc::{EccCheck, PageEcc};
use crate::error::Error;
use crate::geometry::{
    block_first_page, block_pages, page_offset, BLOCK_COUNT, PAGES_PER_BLOCK, PAGE_SIZE,
};
use crate::programmer::NandProgrammer;
use crate::progress::ProgressSink;

/// The erased value for NAND flash (all bits set)
const ERASED_VALUE: u8 = 0xFF;

/// Options for [`program`]
#[derive(Debug, Clone, Copy)]
pub struct ProgramOptions {
    /// Read back and compare every page after writing it
    pub verify: bool,
    /// Sample every 4th page (starting at page 2) when scanning a block,
    /// stopping at the first mismatch, instead of comparing all 64 pages
    pub fast: bool,
    /// First block to process; earlier blocks are skipped entirely
    pub start_block: u32,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            verify: true,
            fast: false,
            start_block: 0,
        }
    }
}

/// Options for [`dump`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpOptions {
    /// First block to dump; file offsets stay absolute, so a resumed dump
    /// writes into the same positions a full dump would
    pub start_block: u32,
}

/// Counters reported by [`program`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramStats {
    /// Blocks compared against the image
    pub blocks_scanned: u32,
    /// Blocks that already matched and were left untouched
    pub blocks_matched: u32,
    /// Blocks erased and rewritten
    pub blocks_reprogrammed: u32,
    /// Pages actually written
    pub pages_written: u32,
    /// Pages skipped because the image content was all 0xFF
    pub pages_skipped_blank: u32,
    /// Pages whose read-back did not match what was written
    pub verify_failures: u32,
}

/// Counters reported by [`dump`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpStats {
    /// Blocks traversed
    pub blocks_dumped: u32,
    /// Pages read and written to the image
    pub pages_dumped: u32,
    /// Pages that could not be read; their file records are left unwritten
    pub read_failures: u32,
}

/// Errors from engine operations: a programmer fault or image-file I/O
#[derive(Debug)]
pub enum EngineError {
    /// The programmer reported a failure
    Nand(Error),
    /// Reading or writing the image file failed
    Io(io::Error),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nand(e) => write!(f, "programmer error: {}", e),
            Self::Io(e) => write!(f, "image file error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Nand(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<Error> for EngineError {
    fn from(e: Error) -> Self {
        Self::Nand(e)
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// True if every byte of `page` is the erased value
pub fn page_is_blank(page: &[u8]) -> bool {
    page.iter().all(|&b| b == ERASED_VALUE)
}

fn read_file_page<F: Read + Seek>(
    image: &mut F,
    page: u32,
    buf: &mut [u8; PAGE_SIZE],
) -> io::Result<()> {
    image.seek(SeekFrom::Start(page_offset(page)))?;
    image.read_exact(buf)
}

/// Read the whole chip into `image`, one 2112-byte record per page.
///
/// A page that fails to read is logged and counted in
/// [`DumpStats::read_failures`]; the traversal continues with the next
/// page and that page's file record is left unwritten.
pub fn dump<P, F, S>(
    programmer: &mut P,
    image: &mut F,
    opts: &DumpOptions,
    ecc: Option<&dyn PageEcc>,
    progress: &mut S,
) -> Result<DumpStats, EngineError>
where
    P: NandProgrammer + ?Sized,
    F: Write + Seek,
    S: ProgressSink,
{
    let mut stats = DumpStats::default();
    let mut buf = [0u8; PAGE_SIZE];

    for block in opts.start_block..BLOCK_COUNT {
        progress.block_started(block);

        for page in block_pages(block) {
            match programmer.read_page(page, &mut buf) {
                Ok(()) => {
                    if let Some(ecc) = ecc {
                        match ecc.check(&buf) {
                            EccCheck::Wrong | EccCheck::Invalid => {
                                log::warn!("page {}: ECC check failed", page);
                            }
                            EccCheck::Ok | EccCheck::Blank => {}
                        }
                    }
                    image.seek(SeekFrom::Start(page_offset(page)))?;
                    image.write_all(&buf)?;
                    stats.pages_dumped += 1;
                    progress.page_dumped(page);
                }
                Err(e) => {
                    log::warn!("page {}: read failed: {}", page, e);
                    stats.read_failures += 1;
                }
            }
        }

        stats.blocks_dumped += 1;
        progress.block_finished(block);
    }

    Ok(stats)
}

/// Reprogram the chip to match `image`, touching only blocks that differ.
///
/// The image length is floored to whole pages and whole blocks; a partial
/// trailing block is never compared or programmed, so an erase can never
/// destroy chip content the image does not cover.
pub fn program<P, F, S>(
    programmer: &mut P,
    image: &mut F,
    opts: &ProgramOptions,
    ecc: Option<&dyn PageEcc>,
    progress: &mut S,
) -> Result<ProgramStats, EngineError>
where
    P: NandProgrammer + ?Sized,
    F: Read + Seek,
    S: ProgressSink,
{
    let file_len = image.seek(SeekFrom::End(0))?;
    let num_pages = file_len / PAGE_SIZE as u64;
    let num_blocks = ((num_pages / PAGES_PER_BLOCK as u64) as u32).min(BLOCK_COUNT);

    let mut stats = ProgramStats::default();
    let mut file_buf = [0u8; PAGE_SIZE];
    let mut flash_buf = [0u8; PAGE_SIZE];

    for block in opts.start_block..num_blocks {
        progress.block_started(block);
        stats.blocks_scanned += 1;

        let mismatches = scan_block(
            programmer,
            image,
            block,
            opts.fast,
            &mut file_buf,
            &mut flash_buf,
            progress,
        )?;

        if mismatches == 0 {
            stats.blocks_matched += 1;
            progress.block_clean(block);
            progress.block_finished(block);
            continue;
        }

        log::debug!("block {}: {} page(s) differ, erasing", block, mismatches);
        programmer.erase_block(block)?;
        progress.block_erased(block);
        stats.blocks_reprogrammed += 1;

        for page in block_pages(block) {
            read_file_page(image, page, &mut file_buf)?;

            if page_is_blank(&file_buf) {
                stats.pages_skipped_blank += 1;
                progress.page_skipped(page);
                continue;
            }

            if let Some(ecc) = ecc {
                ecc.generate(&mut file_buf);
            }

            programmer.write_page(page, &file_buf)?;
            stats.pages_written += 1;
            progress.page_written(page);

            if opts.verify {
                programmer.read_page(page, &mut flash_buf)?;
                if flash_buf != file_buf {
                    log::warn!("page {}: read-back does not match written data", page);
                    stats.verify_failures += 1;
                    progress.verify_failed(page);
                }
            }
        }

        progress.block_finished(block);
    }

    Ok(stats)
}

/// Count pages of `block` that differ between the image and the chip.
///
/// Fast mode samples pages 2, 6, 10, ... and stops at the first mismatch;
/// it trades certainty for a 16x cheaper scan of already-matching chips.
fn scan_block<P, F, S>(
    programmer: &mut P,
    image: &mut F,
    block: u32,
    fast: bool,
    file_buf: &mut [u8; PAGE_SIZE],
    flash_buf: &mut [u8; PAGE_SIZE],
    progress: &mut S,
) -> Result<u32, EngineError>
where
    P: NandProgrammer + ?Sized,
    F: Read + Seek,
    S: ProgressSink,
{
    let first = block_first_page(block);
    let mut mismatches = 0;

    if fast {
        let mut offset = 2;
        while offset < PAGES_PER_BLOCK {
            let page = first + offset;
            let matched = pages_match(programmer, image, page, file_buf, flash_buf)?;
            progress.page_compared(page, matched);
            if !matched {
                mismatches += 1;
                break;
            }
            offset += 4;
        }
    } else {
        for page in block_pages(block) {
            let matched = pages_match(programmer, image, page, file_buf, flash_buf)?;
            progress.page_compared(page, matched);
            if !matched {
                mismatches += 1;
            }
        }
    }

    Ok(mismatches)
}

fn pages_match<P, F>(
    programmer: &mut P,
    image: &mut F,
    page: u32,
    file_buf: &mut [u8; PAGE_SIZE],
    flash_buf: &mut [u8; PAGE_SIZE],
) -> Result<bool, EngineError>
where
    P: NandProgrammer + ?Sized,
    F: Read + Seek,
{
    read_file_page(image, page, file_buf)?;
    programmer.read_page(page, flash_buf)?;
    Ok(file_buf == flash_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::progress::NoProgress;
    use std::io::Cursor;

    #[test]
    fn blank_detection() {
        let mut page = [0xFFu8; PAGE_SIZE];
        assert!(page_is_blank(&page));
        page[PAGE_SIZE - 1] = 0xFE;
        assert!(!page_is_blank(&page));
    }

    /// A programmer that fails the test if any operation reaches it
    struct NoHardware;

    impl NandProgrammer for NoHardware {
        fn chip_id(&mut self) -> Result<u16> {
            panic!("chip_id issued");
        }
        fn select_chip(&mut self, _chip: u8) -> Result<()> {
            panic!("select_chip issued");
        }
        fn status(&mut self) -> Result<u8> {
            panic!("status issued");
        }
        fn erase_block(&mut self, _block: u32) -> Result<()> {
            panic!("erase issued");
        }
        fn read_page(&mut self, _page: u32, _buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
            panic!("read issued");
        }
        fn write_page(&mut self, _page: u32, _data: &[u8; PAGE_SIZE]) -> Result<()> {
            panic!("write issued");
        }
    }

    #[test]
    fn empty_image_touches_nothing() {
        let mut image = Cursor::new(Vec::new());
        let stats = program(
            &mut NoHardware,
            &mut image,
            &ProgramOptions::default(),
            None,
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(stats, ProgramStats::default());
    }

    #[test]
    fn image_smaller_than_one_block_touches_nothing() {
        // 63 pages: floors to zero whole blocks
        let mut image = Cursor::new(vec![0u8; PAGE_SIZE * 63]);
        let stats = program(
            &mut NoHardware,
            &mut image,
            &ProgramOptions::default(),
            None,
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(stats.blocks_scanned, 0);
    }
}
