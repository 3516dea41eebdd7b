//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex (0x-prefixed) or decimal u32
fn parse_num_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex (0x-prefixed) or decimal usize
fn parse_num_usize(s: &str) -> Result<usize, String> {
    parse_num_u32(s).map(|v| v as usize)
}

#[derive(Parser)]
#[command(name = "rnand")]
#[command(author, version, about = "NAND flash programmer for Infectus-class USB adapters", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Programmer backend selection
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProgrammerKind {
    /// Infectus USB adapter (the default)
    Infectus,
    /// In-memory chip emulator, for rehearsal without hardware
    Dummy,
}

/// Adapter options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct ProgrammerArgs {
    /// Programmer backend
    #[arg(long, value_enum, default_value = "infectus")]
    pub programmer: ProgrammerKind,

    /// USB device index when several adapters are connected
    #[arg(long, default_value_t = 0)]
    pub device: usize,

    /// Which NAND chip to select on dual-NAND boards (0 or 1)
    #[arg(long, default_value_t = 0)]
    pub chip: u8,

    /// Transfer chunk size in bytes (hex or decimal)
    #[arg(short = 'b', long, value_parser = parse_num_usize, default_value = "0x2c0")]
    pub chunk_size: usize,

    /// Poll chip status after each erase/program operation
    #[arg(short = 'w', long)]
    pub wait_status: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the adapter and report the attached NAND chip
    Probe {
        #[command(flatten)]
        programmer: ProgrammerArgs,
    },

    /// Read the whole flash chip into an image file
    Dump {
        #[command(flatten)]
        programmer: ProgrammerArgs,

        /// Output image file
        #[arg(short, long)]
        file: PathBuf,

        /// First block to dump (hex or decimal); earlier blocks are skipped
        #[arg(short = 's', long, value_parser = parse_num_u32, default_value = "0")]
        start_block: u32,
    },

    /// Compare an image file to the flash contents and reprogram the
    /// blocks that differ
    Program {
        #[command(flatten)]
        programmer: ProgrammerArgs,

        /// Input image file
        #[arg(short, long)]
        file: PathBuf,

        /// First block to program (hex or decimal)
        #[arg(short = 's', long, value_parser = parse_num_u32, default_value = "0")]
        start_block: u32,

        /// Skip the read-back check after each written page
        #[arg(long)]
        no_verify: bool,

        /// Sample every 4th page when scanning blocks for differences
        #[arg(short = 'q', long)]
        fast: bool,

        /// Compare only; report what would change without erasing or
        /// writing
        #[arg(short = 't', long)]
        dry_run: bool,
    },
}
