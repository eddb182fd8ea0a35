//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Marker line that opens the memory map in a GNU ld `--print-map` report.
pub const MEMORY_MAP_HEADER: &str = "Linker script and memory map";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("couldn't find \"{}\" in map file", MEMORY_MAP_HEADER)]
    MissingHeader,

    #[error("line {line}: expected a hexadecimal number, found {token:?}")]
    InvalidHex { token: String, line: usize },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid section configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MapError>;
