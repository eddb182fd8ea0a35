//! Line classification.
//!
//! Each recognizer looks at one raw line of the memory map and extracts its
//! fields. They are independent of each other; the builder decides which to
//! try based on where it is in the map. A module line can look like a symbol
//! line, so callers must try `module_line` before `symbol_line`.
//!
//! Examples of the shapes recognized:
//!
//! ```text
//! .text           0x00000000     0x5a48                     section
//!  .text.myputc   0x00000464       0x18 ./Demo/main.o       module
//!                 0x0000047c       0x10 ./Demo/main.o       module (wrapped)
//!                 0x00000464                myputc          symbol
//!  *fill*         0x00803425        0x3                     fill
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::SegmentConfig;
use crate::error::Result;
use crate::symbol::Symbol;
use crate::utils::{ends_with_object, is_hex, parse_hex, rest_after_field};

/// All fill bytes are identified by this marker in a map file.
pub const FILL_MARKER: &str = "*fill*";

// Characters that appear in linker script expressions (`_end = .`,
// `PROVIDE (__stack = ...)`) but never in a C identifier.
static NOT_AN_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s=+.#()]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: String,
    pub address: u64,
    pub size: u64,
}

/// A well-formed section header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionLine {
    /// The name is one of the configured text/data/bss sections.
    Tracked(SectionHeader),
    /// Some other section (`.debug_info`, `.comment`, ...).
    Untracked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLine {
    pub path: String,
    pub size: u64,
}

/// `<name> <hex address> <hex size> ...` with the name in column 0.
pub fn section_line(line: &str, lineno: usize, config: &SegmentConfig) -> Result<Option<SectionLine>> {
    if line.is_empty() || line.starts_with(char::is_whitespace) {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 || !is_hex(fields[1]) || !is_hex(fields[2]) {
        return Ok(None);
    }
    if !config.all().any(|id| id == fields[0]) {
        tracing::trace!("Skipping untracked section {}", fields[0]);
        return Ok(Some(SectionLine::Untracked));
    }
    let header = SectionHeader {
        name: fields[0].to_string(),
        address: parse_hex(fields[1], lineno)?,
        size: parse_hex(fields[2], lineno)?,
    };
    tracing::debug!("Found section {} at {:#x} ({:#x} bytes)", header.name, header.address, header.size);
    Ok(Some(SectionLine::Tracked(header)))
}

/// A line ending in `.o` / `.o)` carrying a size and a module path.
///
/// Either `<input section> <addr> <size> <path>` or, when the input section
/// name was too long and wrapped, `<addr> <size> <path>`.
pub fn module_line(line: &str, lineno: usize) -> Result<Option<ModuleLine>> {
    if !ends_with_object(line) {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    let size_field = if fields.len() >= 3 && is_hex(fields[0]) {
        1
    } else if fields.len() >= 4 && is_hex(fields[1]) {
        2
    } else {
        return Ok(None);
    };
    let module = ModuleLine {
        path: rest_after_field(line, size_field).trim_end().to_string(),
        size: parse_hex(fields[size_field], lineno)?,
    };
    tracing::debug!("Found module {} ({:#x} bytes)", module.path, module.size);
    Ok(Some(module))
}

/// `<hex address> <name>`, where the name is a plain identifier.
pub fn symbol_line(line: &str, lineno: usize) -> Result<Option<Symbol>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    // `<addr> <size> linker stubs` is an input section without an object file
    if fields.len() < 2 || !is_hex(fields[0]) || is_hex(fields[1]) {
        return Ok(None);
    }
    let name = fields[1..].concat();
    if NOT_AN_IDENTIFIER.is_match(&name) {
        return Ok(None);
    }
    let address = parse_hex(fields[0], lineno)?;
    tracing::debug!("Found symbol {} at {:#x}", name, address);
    Ok(Some(Symbol::new(name, address)))
}

/// `*fill* <hex address> [<hex size>]`; returns the fill size.
pub fn fill_line(line: &str, lineno: usize) -> Result<Option<u64>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 || !fields[0].contains(FILL_MARKER) || !is_hex(fields[1]) {
        return Ok(None);
    }
    let size = match fields.get(2) {
        Some(size) => parse_hex(size, lineno)?,
        None => 0,
    };
    tracing::debug!("Found fill at {} ({:#x} bytes)", fields[1], size);
    Ok(Some(size))
}
