//! Section / module / symbol tree construction.
//!
//! A single pass over the memory map. Section header lines open a new
//! `Section`; module lines inside a tracked section add or grow a `Module`;
//! symbol lines attach to the current module; fill lines add to the section's
//! padding.
//!
//! The map only gives symbol addresses, so each symbol's size is the distance
//! to the next symbol in the same module. Each module holds its most recent
//! symbol back in a pending slot until that distance is known, or until the
//! section closes and it takes whatever is left of the module's declared size.

use crate::classify::{self, SectionLine};
use crate::config::SegmentConfig;
use crate::error::Result;
use crate::layout::{Module, Section, SymbolRef};
use crate::symbol::Symbol;

/// Size inference state for one module of the open section.
#[derive(Default)]
struct OpenModule {
    /// Bytes already given to this module's committed symbols.
    accounted: u64,
    pending: Option<Symbol>,
}

impl OpenModule {
    /// Commits the pending symbol, sized by `next_address` when it fits
    /// within the module, otherwise by the remainder of the module.
    fn commit(&mut self, module: &mut Module, next_address: Option<u64>) {
        let Some(mut symbol) = self.pending.take() else {
            return;
        };
        let remainder = module.size.saturating_sub(self.accounted);
        symbol.size = match next_address.and_then(|next| next.checked_sub(symbol.address)) {
            Some(delta) if delta <= remainder => delta,
            _ => remainder,
        };
        self.accounted += symbol.size;
        module.symbols.push(symbol);
    }
}

pub struct Builder<'a> {
    config: &'a SegmentConfig,
    sections: Vec<Section>,
    /// Parallel to the last section's modules.
    open: Vec<OpenModule>,
    current_module: Option<usize>,
    in_section: bool,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a SegmentConfig) -> Self {
        Self {
            config,
            sections: Vec::new(),
            open: Vec::new(),
            current_module: None,
            in_section: false,
        }
    }

    /// Feeds one line of the memory map; `lineno` is 1-based, for errors.
    pub fn line(&mut self, line: &str, lineno: usize) -> Result<()> {
        // A blank line ends the section body.
        if line.is_empty() {
            self.in_section = false;
            return Ok(());
        }

        match classify::section_line(line, lineno, self.config)? {
            Some(SectionLine::Tracked(header)) => {
                self.close_section();
                self.sections.push(Section::new(header.name, header.address, header.size));
                self.in_section = true;
                return Ok(());
            }
            Some(SectionLine::Untracked) => {
                self.in_section = false;
                return Ok(());
            }
            None => {}
        }

        if !self.in_section {
            return Ok(());
        }
        let Some(section) = self.sections.last_mut() else {
            return Ok(());
        };

        if let Some(found) = classify::module_line(line, lineno)? {
            let index = match section.module_index(&found.path) {
                Some(index) => {
                    section.modules[index].size += found.size;
                    index
                }
                None => {
                    section.modules.push(Module::new(found.path, found.size));
                    self.open.push(OpenModule::default());
                    section.modules.len() - 1
                }
            };
            self.current_module = Some(index);
            return Ok(());
        }

        if let Some(mut symbol) = classify::symbol_line(line, lineno)? {
            let Some(index) = self.current_module else {
                tracing::warn!(
                    "line {}: symbol {} in {} appears before any module; not attributed",
                    lineno,
                    symbol.name,
                    section.name
                );
                symbol.attach(&section.name, "");
                section.orphans.push(symbol);
                return Ok(());
            };
            let module = &mut section.modules[index];
            let open = &mut self.open[index];
            symbol.attach(&section.name, &module.path);
            open.commit(module, Some(symbol.address));
            section.symbol_order.push(SymbolRef {
                module: index,
                symbol: module.symbols.len(),
            });
            open.pending = Some(symbol);
            return Ok(());
        }

        if let Some(fill) = classify::fill_line(line, lineno)? {
            section.fill_bytes += fill;
        }
        Ok(())
    }

    /// Flushes pending symbols and returns the sections in order of appearance.
    pub fn finish(mut self) -> Vec<Section> {
        self.close_section();
        self.sections
    }

    fn close_section(&mut self) {
        if let Some(section) = self.sections.last_mut() {
            for (module, open) in section.modules.iter_mut().zip(self.open.iter_mut()) {
                open.commit(module, None);
            }
        }
        self.open.clear();
        self.current_module = None;
    }
}
