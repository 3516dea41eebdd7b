//! Dump command: read the whole chip into an image file

use std::fs::File;
use std::path::Path;

use rnand_core::chip;
use rnand_core::engine::{self, DumpOptions};
use rnand_core::geometry::{block_first_page, page_offset, BLOCK_COUNT, TOTAL_SIZE};

use crate::cli::ProgrammerArgs;
use crate::commands::BlockProgress;
use crate::programmers::open_programmer;

pub fn run(
    args: &ProgrammerArgs,
    file: &Path,
    start_block: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if start_block >= BLOCK_COUNT {
        return Err(format!("start block {} out of range", start_block).into());
    }

    let mut programmer = open_programmer(args, false)?;
    let model = chip::detect(programmer.as_mut())?;
    println!("Detected {}", model);

    let start_offset = page_offset(block_first_page(start_block));
    println!(
        "Dumping flash @ 0x{:x} (0x{:x} bytes) into {}",
        start_offset,
        TOTAL_SIZE - start_offset,
        file.display()
    );

    let mut image = File::create(file)?;

    let mut progress = BlockProgress::new((BLOCK_COUNT - start_block) as u64, "Dumping")?;
    let opts = DumpOptions { start_block };
    let stats = engine::dump(programmer.as_mut(), &mut image, &opts, None, &mut progress)?;
    progress.finish("Dump complete");

    println!(
        "Dumped {} pages across {} blocks to {}",
        stats.pages_dumped,
        stats.blocks_dumped,
        file.display()
    );
    if stats.read_failures > 0 {
        println!(
            "WARNING: {} pages could not be read; their records are unwritten",
            stats.read_failures
        );
    }

    Ok(())
}
