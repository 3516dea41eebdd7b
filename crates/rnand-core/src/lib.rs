//! rnand-core - Core library for NAND flash programming
//!
//! This crate provides the hardware-independent half of rnand: the fixed
//! chip geometry, the `NandProgrammer` trait that adapter drivers
//! implement, chip identification, and the dump/program engine that
//! traverses the whole chip while touching only the blocks that differ
//! from the target image.
//!
//! # Example
//!
//! ```ignore
//! use rnand_core::{chip, engine, progress::NoProgress};
//!
//! fn reprogram<P: rnand_core::NandProgrammer>(
//!     programmer: &mut P,
//!     image: &mut std::fs::File,
//! ) -> Result<(), engine::EngineError> {
//!     let model = chip::detect(programmer)?;
//!     log::info!("found {}", model);
//!     let opts = engine::ProgramOptions::default();
//!     let stats = engine::program(programmer, image, &opts, None, &mut NoProgress)?;
//!     log::info!("{} blocks reprogrammed", stats.blocks_reprogrammed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chip;
pub mod ecc;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod programmer;
pub mod progress;

pub use error::{Error, Result};
pub use programmer::{NandProgrammer, STATUS_READY};
