//! Programmer backend selection

use rnand_core::NandProgrammer;
use rnand_dummy::DummyNand;
use rnand_infectus::{Infectus, InfectusConfig};

use crate::cli::{ProgrammerArgs, ProgrammerKind};

/// Open the selected programmer backend.
///
/// `dry_run` only applies to real hardware; the dummy backend has nothing
/// to protect.
pub fn open_programmer(
    args: &ProgrammerArgs,
    dry_run: bool,
) -> Result<Box<dyn NandProgrammer>, Box<dyn std::error::Error>> {
    match args.programmer {
        ProgrammerKind::Infectus => {
            let config = InfectusConfig {
                device_index: args.device,
                chip_select: args.chip,
                chunk_size: args.chunk_size,
                dry_run,
                wait_ready: args.wait_status,
                ..Default::default()
            };
            Ok(Box::new(Infectus::open(config)?))
        }
        ProgrammerKind::Dummy => {
            if dry_run {
                log::warn!("dummy backend ignores --dry-run");
            }
            Ok(Box::new(DummyNand::new()))
        }
    }
}
