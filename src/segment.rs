//! Per-segment scanning.
//!
//! For one segment class (text, data or bss) this walks the whole memory map
//! once per configured section name and collects:
//! - the size the linker reports on each output section header line, and
//! - every input section contribution (address, size, module path).
//!
//! These are kept apart from the section tree so the two can be cross-checked.

use crate::config::Segment;
use crate::error::Result;
use crate::utils::{ends_with_object, parse_hex, rest_after_field};

/// One input section placed into an output section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    /// The configured section name that matched.
    pub section: String,
    pub address: u64,
    pub size: u64,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentScan {
    pub segment: Segment,
    /// Sum of the sizes on the output section header lines.
    pub reported: u64,
    pub contributions: Vec<Contribution>,
}

impl SegmentScan {
    pub fn entry_sum(&self) -> u64 {
        self.contributions.iter().map(|c| c.size).sum()
    }
}

/// Scans `body` for every name in `ids`.
///
/// `first_line` is the 1-based line number of `body[0]` in the file.
pub fn scan(body: &[&str], first_line: usize, segment: Segment, ids: &[String]) -> Result<SegmentScan> {
    let mut result = SegmentScan {
        segment,
        reported: 0,
        contributions: Vec::new(),
    };

    for id in ids {
        let mut i = 0;
        while i < body.len() {
            let line = body[i];
            let lineno = first_line + i;
            let fields: Vec<&str> = line.split_whitespace().collect();

            // Output section header, e.g. `.text           0x00000000     0x5a48`
            if !line.starts_with(char::is_whitespace) && fields.first() == Some(&id.as_str()) {
                if fields.len() >= 3 {
                    result.reported += parse_hex(fields[2], lineno)?;
                }
                i += 1;
                continue;
            }

            // Input section, e.g. ` .text.myputc   0x00000464       0x18 ./main.o`
            if line.len() > id.len() && after_first_char(line).starts_with(id.as_str()) {
                if fields.len() >= 4 {
                    result.contributions.push(Contribution {
                        section: id.clone(),
                        address: parse_hex(fields[1], lineno)?,
                        size: parse_hex(fields[2], lineno)?,
                        module: rest_after_field(line, 2).trim_end().to_string(),
                    });
                } else if let Some(next) = body.get(i + 1).filter(|next| ends_with_object(next)) {
                    // The input section name was too long; the rest wrapped onto the next line.
                    let next_fields: Vec<&str> = next.split_whitespace().collect();
                    if next_fields.len() >= 3 {
                        result.contributions.push(Contribution {
                            section: id.clone(),
                            address: parse_hex(next_fields[0], lineno + 1)?,
                            size: parse_hex(next_fields[1], lineno + 1)?,
                            module: rest_after_field(next, 1).trim_end().to_string(),
                        });
                        i += 1;
                    }
                }
            }
            i += 1;
        }
    }

    tracing::debug!(
        "{:?}: linker reports {:#x} bytes, {} contributions totalling {:#x}",
        segment,
        result.reported,
        result.contributions.len(),
        result.entry_sum()
    );
    Ok(result)
}

fn after_first_char(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;

    const MAP: &str = "\
Linker script and memory map

.text           0x00000000      0x8c
 *(.text*)
 .text          0x00000000       0x5c ./crt0.o
                0x00000000                _start
 .text.myputc   0x0000005c       0x18 ./Demo/main.o
                0x0000005c                myputc
 .text.watchdog_handler
                0x00000074       0x18 ./Demo/main.o
                0x00000074                watchdog_handler

.bss            0x00800000       0x10
 COMMON         0x00800000       0x10 /opt/My Libs/libc.a(lib_a-rget.o)
";

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_text() {
        let body: Vec<&str> = MAP.lines().collect();
        let scan = scan(&body, 1, Segment::Text, &ids(&[".text"])).unwrap();
        assert_eq!(scan.reported, 0x8c);
        assert_eq!(scan.entry_sum(), 0x8c);
        let modules: Vec<_> = scan.contributions.iter().map(|c| (c.module.as_str(), c.size)).collect();
        assert_eq!(
            modules,
            [("./crt0.o", 0x5c), ("./Demo/main.o", 0x18), ("./Demo/main.o", 0x18)]
        );
        assert_eq!(scan.contributions[2].address, 0x74);
    }

    #[test]
    fn test_scan_bss_common() {
        let body: Vec<&str> = MAP.lines().collect();
        let scan = scan(&body, 1, Segment::Bss, &ids(&[".bss", "COMMON"])).unwrap();
        assert_eq!(scan.reported, 0x10);
        assert_eq!(scan.contributions.len(), 1);
        assert_eq!(scan.contributions[0].section, "COMMON");
        assert_eq!(scan.contributions[0].module, "/opt/My Libs/libc.a(lib_a-rget.o)");
    }

    #[test]
    fn test_wrapped_line_at_end_of_input() {
        let body = vec![".text 0x0 0x0", " .text.orphaned"];
        let scan = scan(&body, 1, Segment::Text, &ids(&[".text"])).unwrap();
        assert!(scan.contributions.is_empty());
    }

    #[test]
    fn test_bad_size_is_fatal() {
        let body = vec![".data 0x0 0xZZ"];
        assert!(matches!(
            scan(&body, 40, Segment::Data, &ids(&[".data"])),
            Err(MapError::InvalidHex { line: 40, .. })
        ));
    }
}
