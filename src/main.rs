//! rnand - NAND flash programmer for Infectus-class USB adapters
//!
//! Dumps a raw NAND chip to a flat image file (one 2112-byte record per
//! page) and reprograms a chip to match an image while erasing and
//! writing only the blocks that differ, to spare erase cycles.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Probe { programmer } => commands::probe::run(&programmer),
        Commands::Dump {
            programmer,
            file,
            start_block,
        } => commands::dump::run(&programmer, &file, start_block),
        Commands::Program {
            programmer,
            file,
            start_block,
            no_verify,
            fast,
            dry_run,
        } => commands::program::run(&programmer, &file, start_block, !no_verify, fast, dry_run),
    }
}
