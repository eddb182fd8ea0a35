//! GNU ld Map File Library.
//!
//! This library reconstructs a program's binary layout from the memory map a
//! linker prints with `--print-map`. It is organized into several modules:
//! - `config`: CLI and segment (text/data/bss) configuration.
//! - `classify`: Recognizers for section, module, symbol and fill lines.
//! - `segment`: Per-segment scans of input section contributions.
//! - `builder`: Section / module / symbol tree construction.
//! - `aggregate`: Per-module size table and consistency check.
//! - `parser`: The main parsing orchestration.
//! - `layout` / `symbol`: The resulting model.
//! - `report`: Plain-text summary output.

pub mod aggregate;
pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod layout;
pub mod parser;
pub mod report;
pub mod segment;
pub mod symbol;
pub mod utils;

pub use config::{Segment, SegmentConfig};
pub use error::{MapError, Result};
pub use parser::{MapModel, MapParser};
