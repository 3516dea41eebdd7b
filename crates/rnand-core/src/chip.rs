//! Supported chip models and detection
//!
//! The vendor list is deliberately closed: only the three 512 MiB parts
//! this tool has been used with are accepted. An unknown nonzero ID is a
//! hard error rather than a guess at geometry.

use core::fmt;

use crate::error::{Error, Result};
use crate::geometry::{PAGE_COUNT, PAGE_DATA_SIZE, TOTAL_SIZE};
use crate::programmer::NandProgrammer;

/// A recognized NAND chip model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipModel {
    /// Hynix 512 MiB (ID 0xADDC)
    Hynix512,
    /// Samsung 512 MiB (ID 0xECDC)
    Samsung512,
    /// Toshiba 512 MiB (ID 0x98DC)
    Toshiba512,
}

impl ChipModel {
    /// Map a chip ID to a model, if it is in the supported list
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0xADDC => Some(Self::Hynix512),
            0xECDC => Some(Self::Samsung512),
            0x98DC => Some(Self::Toshiba512),
            _ => None,
        }
    }

    /// The canonical two-byte chip ID
    pub fn id(&self) -> u16 {
        match self {
            Self::Hynix512 => 0xADDC,
            Self::Samsung512 => 0xECDC,
            Self::Toshiba512 => 0x98DC,
        }
    }

    /// Vendor name
    pub fn vendor(&self) -> &'static str {
        match self {
            Self::Hynix512 => "Hynix",
            Self::Samsung512 => "Samsung",
            Self::Toshiba512 => "Toshiba",
        }
    }

    /// Usable data bytes (excluding the out-of-band areas)
    pub fn data_size(&self) -> u64 {
        PAGE_COUNT as u64 * PAGE_DATA_SIZE as u64
    }

    /// Raw size including out-of-band areas, i.e. the image file size
    pub fn raw_size(&self) -> u64 {
        TOTAL_SIZE
    }
}

impl fmt::Display for ChipModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} MiB NAND",
            self.vendor(),
            self.data_size() / (1024 * 1024)
        )
    }
}

/// Identify the attached chip before any erase/read/write traffic.
///
/// A zero ID (no chip answered) and an unrecognized ID are both fatal;
/// callers are expected to stop rather than guess at geometry.
pub fn detect<P: NandProgrammer + ?Sized>(programmer: &mut P) -> Result<ChipModel> {
    let id = programmer.chip_id()?;
    log::debug!("chip ID = 0x{:04X}", id);

    if id == 0 {
        return Err(Error::ChipNotDetected);
    }

    ChipModel::from_id(id).ok_or(Error::UnknownChip(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_map_to_models() {
        assert_eq!(ChipModel::from_id(0xADDC), Some(ChipModel::Hynix512));
        assert_eq!(ChipModel::from_id(0xECDC), Some(ChipModel::Samsung512));
        assert_eq!(ChipModel::from_id(0x98DC), Some(ChipModel::Toshiba512));
        assert_eq!(ChipModel::from_id(0x1234), None);
        assert_eq!(ChipModel::from_id(0), None);
    }

    #[test]
    fn sizes() {
        let model = ChipModel::Hynix512;
        assert_eq!(model.data_size(), 512 * 1024 * 1024);
        assert_eq!(model.raw_size(), 553_648_128);
        assert_eq!(model.to_string(), "Hynix 512 MiB NAND");
    }
}
