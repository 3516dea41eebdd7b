//! Command implementations

pub mod dump;
pub mod probe;
pub mod program;

use indicatif::{ProgressBar, ProgressStyle};
use rnand_core::progress::ProgressSink;

/// Create the standard per-block progress bar
fn create_block_bar(
    total_blocks: u64,
    phase: &str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total_blocks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} blocks ({{per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Progress reporter driving an indicatif bar, one tick per block
pub struct BlockProgress {
    bar: ProgressBar,
}

impl BlockProgress {
    pub fn new(total_blocks: u64, phase: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            bar: create_block_bar(total_blocks, phase)?,
        })
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ProgressSink for BlockProgress {
    fn block_started(&mut self, block: u32) {
        self.bar.set_message(format!("block {:#06x}", block));
    }

    fn page_compared(&mut self, _page: u32, _matched: bool) {}

    fn block_clean(&mut self, _block: u32) {}

    fn block_erased(&mut self, block: u32) {
        self.bar
            .set_message(format!("block {:#06x}: reprogramming", block));
    }

    fn page_written(&mut self, _page: u32) {}

    fn page_skipped(&mut self, _page: u32) {}

    fn verify_failed(&mut self, page: u32) {
        self.bar
            .println(format!("page {}: verification mismatch", page));
    }

    fn page_dumped(&mut self, _page: u32) {}

    fn block_finished(&mut self, _block: u32) {
        self.bar.inc(1);
    }
}
