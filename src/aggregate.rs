//! Per-module aggregation and the size consistency check.
//!
//! The per-module table is built only from the segment scans, independently
//! of the section tree, and serves as the baseline the linker's own totals
//! are compared against.

use indexmap::IndexMap;

use crate::config::Segment;
use crate::layout::ModuleSizes;
use crate::segment::SegmentScan;

/// Sums each module's contributions per segment class.
///
/// Modules are listed in order of first appearance, scanning text, then bss,
/// then data.
pub fn module_sizes(scans: &[SegmentScan]) -> Vec<ModuleSizes> {
    let mut modules: IndexMap<&str, ModuleSizes> = IndexMap::new();
    for segment in [Segment::Text, Segment::Bss, Segment::Data] {
        for scan in scans.iter().filter(|s| s.segment == segment) {
            for contribution in &scan.contributions {
                let entry = modules
                    .entry(contribution.module.as_str())
                    .or_insert_with(|| ModuleSizes {
                        path: contribution.module.clone(),
                        ..Default::default()
                    });
                *entry.get_mut(segment) += contribution.size;
            }
        }
    }
    modules.into_values().collect()
}

impl ModuleSizes {
    pub fn get(&self, segment: Segment) -> u64 {
        match segment {
            Segment::Text => self.text,
            Segment::Data => self.data,
            Segment::Bss => self.bss,
        }
    }

    fn get_mut(&mut self, segment: Segment) -> &mut u64 {
        match segment {
            Segment::Text => &mut self.text,
            Segment::Data => &mut self.data,
            Segment::Bss => &mut self.bss,
        }
    }
}

/// The three totals for one segment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentCheck {
    pub segment: Segment,
    /// What the linker printed on the output section header lines.
    pub reported: u64,
    /// Sum over the per-module table.
    pub module_sum: u64,
    /// Sum over every scanned contribution.
    pub entry_sum: u64,
}

impl SegmentCheck {
    pub fn is_consistent(&self) -> bool {
        self.reported == self.module_sum && self.reported == self.entry_sum
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub checks: Vec<SegmentCheck>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.checks.iter().all(SegmentCheck::is_consistent)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SegmentCheck> {
        self.checks.iter().filter(|c| !c.is_consistent())
    }

    pub fn get(&self, segment: Segment) -> Option<&SegmentCheck> {
        self.checks.iter().find(|c| c.segment == segment)
    }
}

/// Compares the linker's totals against the module table and the raw contributions.
pub fn check(scans: &[SegmentScan], modules: &[ModuleSizes]) -> ConsistencyReport {
    let checks = Segment::ALL
        .into_iter()
        .map(|segment| {
            let matching = || scans.iter().filter(move |s| s.segment == segment);
            SegmentCheck {
                segment,
                reported: matching().map(|s| s.reported).sum(),
                module_sum: modules.iter().map(|m| m.get(segment)).sum(),
                entry_sum: matching().map(SegmentScan::entry_sum).sum(),
            }
        })
        .collect();
    ConsistencyReport { checks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Contribution;

    fn scan(segment: Segment, reported: u64, entries: &[(&str, u64)]) -> SegmentScan {
        SegmentScan {
            segment,
            reported,
            contributions: entries
                .iter()
                .map(|&(module, size)| Contribution {
                    section: String::new(),
                    address: 0,
                    size,
                    module: module.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_module_sizes() {
        let scans = vec![
            scan(Segment::Text, 0x30, &[("a.o", 0x10), ("b.o", 0x8), ("a.o", 0x18)]),
            scan(Segment::Data, 0x4, &[("c.o", 0x4)]),
            scan(Segment::Bss, 0x8, &[("b.o", 0x8)]),
        ];
        let modules = module_sizes(&scans);
        assert_eq!(
            modules,
            vec![
                ModuleSizes { path: "a.o".into(), text: 0x28, bss: 0, data: 0 },
                ModuleSizes { path: "b.o".into(), text: 0x8, bss: 0x8, data: 0 },
                ModuleSizes { path: "c.o".into(), text: 0, bss: 0, data: 0x4 },
            ]
        );
        assert!(check(&scans, &modules).is_consistent());
    }

    #[test]
    fn test_check_reports_each_segment() {
        let scans = vec![
            scan(Segment::Text, 0x10, &[("a.o", 0x10)]),
            scan(Segment::Data, 0x0, &[]),
            scan(Segment::Bss, 0x10, &[("a.o", 0x8)]),
        ];
        let modules = module_sizes(&scans);
        let report = check(&scans, &modules);
        assert!(!report.is_consistent());
        let failed: Vec<_> = report.failures().map(|c| c.segment).collect();
        assert_eq!(failed, [Segment::Bss]);
        assert_eq!(
            report.get(Segment::Bss),
            Some(&SegmentCheck { segment: Segment::Bss, reported: 0x10, module_sum: 0x8, entry_sum: 0x8 })
        );
    }
}
