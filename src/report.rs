//! Plain-text summary of a parsed map.

use std::io::{self, Write};

use crate::config::Segment;
use crate::parser::MapModel;

/// Writes sections, the per-module size table, the consistency outcome and,
/// if `with_symbols`, every symbol.
pub fn write_summary<W: Write>(out: &mut W, model: &MapModel, with_symbols: bool) -> io::Result<()> {
    writeln!(out, "Sections")?;
    writeln!(
        out,
        "  {:<16} {:>12} {:>10} {:>8} {:>8} {:>8}",
        "name", "address", "size", "modules", "symbols", "fill"
    )?;
    for section in &model.sections {
        writeln!(
            out,
            "  {:<16} {:#012x} {:#10x} {:>8} {:>8} {:#8x}",
            section.name,
            section.address,
            section.size,
            section.modules.len(),
            section.symbol_order.len(),
            section.fill_bytes
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Modules")?;
    writeln!(out, "  {:>10} {:>10} {:>10}  {}", "text", "data", "bss", "module")?;
    for module in &model.modules {
        writeln!(
            out,
            "  {:#10x} {:#10x} {:#10x}  {}",
            module.text, module.data, module.bss, module.path
        )?;
    }
    writeln!(
        out,
        "  {:#10x} {:#10x} {:#10x}  (linker total)",
        model.text_size, model.data_size, model.bss_size
    )?;

    writeln!(out)?;
    writeln!(out, "Consistency")?;
    for check in &model.consistency.checks {
        writeln!(
            out,
            "  {:<5} linker {:#x}, modules {:#x}, entries {:#x}: {}",
            segment_name(check.segment),
            check.reported,
            check.module_sum,
            check.entry_sum,
            if check.is_consistent() { "ok" } else { "MISMATCH" }
        )?;
    }

    if with_symbols {
        writeln!(out)?;
        writeln!(out, "Symbols")?;
        for symbol in model.symbols() {
            writeln!(
                out,
                "  {:#012x} {:#8x} {:<16} {:<20} {}",
                symbol.address, symbol.size, symbol.section, symbol.file_name, symbol.name
            )?;
        }
    }
    Ok(())
}

fn segment_name(segment: Segment) -> &'static str {
    match segment {
        Segment::Text => "text",
        Segment::Data => "data",
        Segment::Bss => "bss",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MapParser;

    const MAP: &str = "\
Linker script and memory map

.text           0x00000000       0x10
 .text          0x00000000       0x10 ./main.o
                0x00000000                main
";

    #[test]
    fn test_summary() {
        let model = MapParser::default().parse_str(MAP, None).unwrap();
        let mut out = Vec::new();
        write_summary(&mut out, &model, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("./main.o"));
        assert!(text.contains("text  linker 0x10, modules 0x10, entries 0x10: ok"));
        assert!(text.lines().last().unwrap().ends_with("main.o               main"));
    }

    #[test]
    fn test_summary_without_symbols() {
        let model = MapParser::default().parse_str(MAP, None).unwrap();
        let mut out = Vec::new();
        write_summary(&mut out, &model, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Symbols"));
        assert!(!text.contains("MISMATCH"));
    }
}
