//! Optional per-page ECC hook
//!
//! The out-of-band area of each page carries an error-correcting code
//! whose exact layout depends on the consumer device. This crate does not
//! implement any ECC algorithm; it only defines the seam. When a hook is
//! supplied, the engine validates every page read from flash and
//! regenerates the code for every page it is about to write.

use crate::geometry::PAGE_SIZE;

/// Outcome of checking a page against its stored ECC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccCheck {
    /// Data and code agree
    Ok,
    /// Data does not match the stored code
    Wrong,
    /// The stored code itself is not a valid codeword
    Invalid,
    /// The page is erased (all 0xFF), so there is no code to check
    Blank,
}

/// Per-page ECC generator/validator
pub trait PageEcc {
    /// Recompute the code for `page` and store it in the out-of-band area
    fn generate(&self, page: &mut [u8; PAGE_SIZE]);

    /// Check `page` against its stored code
    fn check(&self, page: &[u8; PAGE_SIZE]) -> EccCheck;
}
