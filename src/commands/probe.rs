//! Probe command: identify the adapter and the attached chip

use rnand_core::{chip, NandProgrammer, STATUS_READY};

use crate::cli::ProgrammerArgs;
use crate::programmers::open_programmer;

pub fn run(args: &ProgrammerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut programmer = open_programmer(args, false)?;

    let model = chip::detect(programmer.as_mut())?;
    let status = programmer.status()?;

    println!("Chip ID:  0x{:04X}", model.id());
    println!("Detected: {}", model);
    println!(
        "          {} bytes raw ({} bytes data + out-of-band)",
        model.raw_size(),
        model.data_size()
    );
    println!(
        "Status:   0x{:02X}{}",
        status,
        if status == STATUS_READY { " (ready)" } else { "" }
    );

    Ok(())
}
