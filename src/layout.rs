//! Layout model.
//!
//! This module defines the structures reconstructed from the memory map:
//! output `Section`s, the `Module`s (object files) contributing to each, and
//! the flat per-module size table built from the segment scans.

use crate::symbol::Symbol;

/// One object file's contribution to a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Object file path, or `archive(member.o)`.
    pub path: String,
    /// Declared size, summed over every header line naming this module in the section.
    pub size: u64,
    /// Symbols in address order.
    pub symbols: Vec<Symbol>,
}

impl Module {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            symbols: Vec::new(),
        }
    }

    /// Sum of the inferred sizes of this module's symbols.
    pub fn symbol_bytes(&self) -> u64 {
        self.symbols.iter().map(|s| s.size).sum()
    }
}

/// Position of a symbol inside a section: module index, then symbol index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRef {
    pub module: usize,
    pub symbol: usize,
}

/// A named, addressed region of the linked output.
///
/// Every header line starts a new `Section`, even when the name repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub address: u64,
    /// Size reported by the linker on the header line.
    pub size: u64,
    pub modules: Vec<Module>,
    /// Order in which symbols appeared across all modules.
    pub symbol_order: Vec<SymbolRef>,
    /// Symbols that appeared before any module in this section.
    pub orphans: Vec<Symbol>,
    /// Linker padding (`*fill*`) inside the section.
    pub fill_bytes: u64,
}

impl Section {
    pub fn new(name: impl Into<String>, address: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            address,
            size,
            modules: Vec::new(),
            symbol_order: Vec::new(),
            orphans: Vec::new(),
            fill_bytes: 0,
        }
    }

    pub fn module_index(&self, path: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.path == path)
    }

    /// Symbols of every module, in the order they appeared in the map.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbol_order
            .iter()
            .filter_map(|r| self.modules.get(r.module)?.symbols.get(r.symbol))
    }

    pub fn symbol_bytes(&self) -> u64 {
        self.modules.iter().map(Module::symbol_bytes).sum()
    }

    /// Declared bytes not covered by symbols or fill.
    pub fn unattributed(&self) -> u64 {
        self.size
            .saturating_sub(self.symbol_bytes())
            .saturating_sub(self.fill_bytes)
    }
}

/// Sizes one module contributes to each segment class, summed across sections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleSizes {
    pub path: String,
    pub text: u64,
    pub bss: u64,
    pub data: u64,
}

impl ModuleSizes {
    pub fn total(&self) -> u64 {
        self.text + self.data + self.bss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_symbol_order() {
        let mut section = Section::new(".text", 0, 0x40);
        let mut a = Module::new("a.o", 0x20);
        let mut b = Module::new("b.o", 0x10);
        a.symbols.push(Symbol { size: 0x8, ..Symbol::new("a1", 0x0) });
        b.symbols.push(Symbol { size: 0x10, ..Symbol::new("b1", 0x20) });
        a.symbols.push(Symbol { size: 0x18, ..Symbol::new("a2", 0x8) });
        section.modules = vec![a, b];
        section.symbol_order = vec![
            SymbolRef { module: 0, symbol: 0 },
            SymbolRef { module: 1, symbol: 0 },
            SymbolRef { module: 0, symbol: 1 },
        ];
        section.fill_bytes = 0x4;

        let names: Vec<_> = section.symbols().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a1", "b1", "a2"]);
        assert_eq!(section.symbol_bytes(), 0x30);
        assert_eq!(section.unattributed(), 0xc);
        assert_eq!(section.module_index("b.o"), Some(1));
        assert_eq!(section.module_index("c.o"), None);
    }
}
