//! Map file parsing.
//!
//! `MapParser` orchestrates the whole reconstruction:
//! 1. Input Loading: maps the file and finds the memory map header.
//! 2. Segment Scans: one pass per segment class (text, data, bss) collecting
//!    the linker's totals and every input section contribution.
//! 3. Tree Building: one pass building sections, modules and symbols.
//! 4. Aggregation: per-module text/data/bss sizes from the segment scans.
//! 5. Consistency: cross-checks the linker's totals against the aggregates.
//!
//! All passes run one after another over the same text. A parser holds only
//! its configuration, so it can be shared freely; every call builds a fresh
//! `MapModel`.

use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use crate::aggregate::{self, ConsistencyReport};
use crate::builder::Builder;
use crate::config::{Segment, SegmentConfig};
use crate::error::{MapError, Result, MEMORY_MAP_HEADER};
use crate::layout::{ModuleSizes, Section};
use crate::segment::{self, SegmentScan};
use crate::symbol::Symbol;

/// Progress notification: `false` once per line processed, `true` once when done.
pub type Progress<'a> = Option<&'a mut dyn FnMut(bool)>;

/// Everything recovered from one map file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapModel {
    /// Tracked sections in order of appearance.
    pub sections: Vec<Section>,
    /// Sizes reported by the linker for each segment class.
    pub text_size: u64,
    pub data_size: u64,
    pub bss_size: u64,
    /// Per-module sizes built from the segment scans.
    pub modules: Vec<ModuleSizes>,
    pub consistency: ConsistencyReport,
}

impl MapModel {
    /// Every symbol, section by section, module by module.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.modules.iter().flat_map(|m| m.symbols.iter()))
    }

    pub fn module(&self, path: &str) -> Option<&ModuleSizes> {
        self.modules.iter().find(|m| m.path == path)
    }

    pub fn reported(&self, segment: Segment) -> u64 {
        match segment {
            Segment::Text => self.text_size,
            Segment::Data => self.data_size,
            Segment::Bss => self.bss_size,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapParser {
    config: SegmentConfig,
}

impl MapParser {
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Parses the map file at `path`.
    ///
    /// `progress` receives `true` exactly once at the end, whether or not
    /// parsing succeeded.
    pub fn parse_file(&self, path: &Path, mut progress: Progress<'_>) -> Result<MapModel> {
        let result = load(path).and_then(|text| self.parse_lines(&text, &mut progress));
        notify(&mut progress, true);
        result
    }

    /// Parses map text already in memory.
    pub fn parse_str(&self, text: &str, mut progress: Progress<'_>) -> Result<MapModel> {
        let result = self.parse_lines(text, &mut progress);
        notify(&mut progress, true);
        result
    }

    fn parse_lines(&self, text: &str, progress: &mut Progress<'_>) -> Result<MapModel> {
        let lines: Vec<&str> = text.lines().collect();
        let start = lines
            .iter()
            .position(|l| *l == MEMORY_MAP_HEADER)
            .ok_or(MapError::MissingHeader)?;
        tracing::debug!("Found memory map at line {}", start + 1);
        let body = &lines[start..];
        let first_line = start + 1;

        let scans = Segment::ALL
            .into_iter()
            .map(|seg| segment::scan(body, first_line, seg, self.config.ids(seg)))
            .collect::<Result<Vec<SegmentScan>>>()?;

        let mut builder = Builder::new(&self.config);
        for (i, line) in body.iter().enumerate() {
            notify(progress, false);
            builder.line(line, first_line + i)?;
        }
        let sections = builder.finish();

        let modules = aggregate::module_sizes(&scans);
        let consistency = aggregate::check(&scans, &modules);
        let reported = |seg: Segment| consistency.get(seg).map_or(0, |c| c.reported);
        let (text_size, data_size, bss_size) =
            (reported(Segment::Text), reported(Segment::Data), reported(Segment::Bss));

        tracing::info!(
            "Parsed {} sections, {} modules, {} symbols",
            sections.len(),
            modules.len(),
            sections.iter().map(|s| s.symbol_order.len()).sum::<usize>()
        );
        if consistency.is_consistent() {
            tracing::info!("All size calculations match");
        }
        for failed in consistency.failures() {
            tracing::warn!(
                "{:?} sizes don't reconcile: linker {:#x}, module sum {:#x}, entry sum {:#x}",
                failed.segment,
                failed.reported,
                failed.module_sum,
                failed.entry_sum
            );
        }

        Ok(MapModel {
            text_size,
            data_size,
            bss_size,
            sections,
            modules,
            consistency,
        })
    }
}

fn notify(progress: &mut Progress<'_>, done: bool) {
    if let Some(callback) = progress {
        callback(done);
    }
}

fn load(path: &Path) -> Result<String> {
    let io_err = |source: std::io::Error| MapError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    if file.metadata().map_err(io_err)?.len() == 0 {
        return Ok(String::new());
    }
    let mmap = unsafe { Mmap::map(&file).map_err(io_err)? };
    Ok(String::from_utf8_lossy(&mmap).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "\
Archive member included to satisfy reference by file (symbol)

Linker script and memory map

LOAD ./main.o
.text           0x00000000       0x20
 .text          0x00000000       0x20 ./main.o
                0x00000000                main
                0x00000008                tick

.bss            0x00800000        0x4
 .bss           0x00800000        0x4 ./main.o
                0x00800000                counter
";

    #[test]
    fn test_parse_str() {
        let parser = MapParser::default();
        let model = parser.parse_str(MAP, None).unwrap();
        assert_eq!(model.sections.len(), 2);
        assert_eq!(model.text_size, 0x20);
        assert_eq!(model.bss_size, 0x4);
        assert_eq!(model.data_size, 0);
        assert!(model.consistency.is_consistent());
        let names: Vec<_> = model.symbols().map(|s| (s.name.as_str(), s.size)).collect();
        assert_eq!(names, [("main", 0x8), ("tick", 0x18), ("counter", 0x4)]);
        assert_eq!(
            model.module("./main.o"),
            Some(&ModuleSizes { path: "./main.o".into(), text: 0x20, bss: 0x4, data: 0 })
        );
    }

    #[test]
    fn test_progress_calls() {
        let mut calls = Vec::new();
        let mut record = |done: bool| calls.push(done);
        MapParser::default().parse_str(MAP, Some(&mut record)).unwrap();
        let body_lines = MAP.lines().count() - 2;
        assert_eq!(calls.len(), body_lines + 1);
        assert_eq!(calls.iter().filter(|d| **d).count(), 1);
        assert_eq!(calls.last(), Some(&true));
    }

    #[test]
    fn test_missing_header_still_reports_done() {
        let mut calls = Vec::new();
        let mut record = |done: bool| calls.push(done);
        let result = MapParser::default().parse_str("Memory Configuration\n", Some(&mut record));
        assert!(matches!(result, Err(MapError::MissingHeader)));
        assert_eq!(calls, [true]);
    }
}
