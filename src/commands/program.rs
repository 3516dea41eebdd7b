//! Program command: reprogram the chip to match an image file

use std::fs::File;
use std::path::Path;

use rnand_core::chip;
use rnand_core::engine::{self, ProgramOptions};
use rnand_core::geometry::{PAGES_PER_BLOCK, PAGE_SIZE};

use crate::cli::ProgrammerArgs;
use crate::commands::BlockProgress;
use crate::programmers::open_programmer;

pub fn run(
    args: &ProgrammerArgs,
    file: &Path,
    start_block: u32,
    verify: bool,
    fast: bool,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // The image must be readable before any hardware is touched
    let mut image = File::open(file)
        .map_err(|e| format!("couldn't open {}: {}", file.display(), e))?;
    let file_len = image.metadata()?.len();
    let num_pages = file_len / PAGE_SIZE as u64;
    let num_blocks = num_pages / PAGES_PER_BLOCK as u64;
    println!(
        "File size: {} bytes / {} pages / {} blocks",
        file_len, num_pages, num_blocks
    );

    if start_block as u64 >= num_blocks {
        return Err(format!(
            "start block {} is beyond the image ({} whole blocks)",
            start_block, num_blocks
        )
        .into());
    }

    let mut programmer = open_programmer(args, dry_run)?;
    let model = chip::detect(programmer.as_mut())?;
    println!("Detected {}", model);
    println!("Programming {} into flash", file.display());
    if dry_run {
        println!("Dry run: comparing only, no erase or program will be issued");
    }

    let mut progress = BlockProgress::new(num_blocks - start_block as u64, "Programming")?;
    let opts = ProgramOptions {
        verify,
        fast,
        start_block,
    };
    let stats = engine::program(programmer.as_mut(), &mut image, &opts, None, &mut progress)?;
    progress.finish("Program complete");

    println!(
        "{} blocks scanned: {} already matched, {} reprogrammed",
        stats.blocks_scanned, stats.blocks_matched, stats.blocks_reprogrammed
    );
    println!(
        "{} pages written, {} blank pages skipped",
        stats.pages_written, stats.pages_skipped_blank
    );
    if stats.verify_failures > 0 {
        println!(
            "WARNING: {} pages failed read-back verification",
            stats.verify_failures
        );
    }

    Ok(())
}
