//! Symbols recovered from the memory map.
//!
//! GNU ld only prints an address and a name for each symbol; the size is
//! inferred later by the builder from the address of the next symbol.

use once_cell::sync::Lazy;
use regex::Regex;

/// Build prefix newlib puts on its archive members (`libc.a(lib_a-rget.o)`).
const NEWLIB_MEMBER_PREFIX: &str = "lib_a-";

static SOURCE_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^/\\(]+\.[oc]$").unwrap());

/// How far a symbol is visible outside its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Listed by the linker, so visible to the whole program.
    #[default]
    Global,
    /// File-local.
    Static,
    /// Global but with hidden ELF visibility.
    Hidden,
}

/// A named entity at a load address inside one module's contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Path of the module (object file or archive member) defining the symbol.
    pub module: String,
    /// Source file derived from `module`, e.g. `rget.o` for `libc.a(lib_a-rget.o)`.
    pub file_name: String,
    pub address: u64,
    /// Inferred size in bytes.
    pub size: u64,
    pub section: String,
    pub visibility: Visibility,
}

impl Symbol {
    /// Creates a symbol that is not yet attached to a section or module.
    pub fn new(name: impl Into<String>, address: u64) -> Self {
        Self {
            name: name.into(),
            module: String::new(),
            file_name: String::new(),
            address,
            size: 0,
            section: String::new(),
            visibility: Visibility::Global,
        }
    }

    /// Records the owning section and module.
    pub fn attach(&mut self, section: &str, module: &str) {
        self.section = section.to_string();
        self.module = module.to_string();
        self.file_name = source_file_name(module);
    }
}

/// Derives the source file name from a module path.
///
/// Strips the newlib archive member prefix, then keeps the trailing path
/// component ending in `.o` or `.c`. Returns an empty string when there is none.
pub fn source_file_name(module: &str) -> String {
    let module = module.replace(NEWLIB_MEMBER_PREFIX, "");
    let module = module.strip_suffix(')').unwrap_or(&module);
    SOURCE_FILE
        .find(module)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
