//! Progress reporting for whole-chip operations

/// Callbacks invoked by the engine as it walks the chip.
///
/// Implementations drive terminal progress bars; everything is advisory
/// and must not fail.
pub trait ProgressSink {
    /// A block's traversal has begun
    fn block_started(&mut self, block: u32);

    /// One page was compared against the image (`matched` = byte-identical)
    fn page_compared(&mut self, page: u32, matched: bool);

    /// The block matched the image and will not be touched
    fn block_clean(&mut self, block: u32);

    /// The block was erased prior to reprogramming
    fn block_erased(&mut self, block: u32);

    /// One page was programmed
    fn page_written(&mut self, page: u32);

    /// One all-0xFF page was skipped without a write
    fn page_skipped(&mut self, page: u32);

    /// A written page read back different from what was written
    fn verify_failed(&mut self, page: u32);

    /// One page was read and appended to the dump image
    fn page_dumped(&mut self, page: u32);

    /// A block's traversal is complete
    fn block_finished(&mut self, block: u32);
}

/// A no-op progress sink
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn block_started(&mut self, _block: u32) {}
    fn page_compared(&mut self, _page: u32, _matched: bool) {}
    fn block_clean(&mut self, _block: u32) {}
    fn block_erased(&mut self, _block: u32) {}
    fn page_written(&mut self, _page: u32) {}
    fn page_skipped(&mut self, _page: u32) {}
    fn verify_failed(&mut self, _page: u32) {}
    fn page_dumped(&mut self, _page: u32) {}
    fn block_finished(&mut self, _block: u32) {}
}
