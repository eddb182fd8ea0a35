//! Configuration module.
//!
//! This module defines the command-line interface (CLI) using `clap`, and the
//! segment configuration that tells the parser which output sections count as
//! text, data or bss.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{MapError, Result};

/// Reconstructs the section / module / symbol layout from a GNU ld map file.
///
/// Produce the map with `-Wl,--print-map > app.map` (or `-Map=app.map`).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Map file to analyse
    pub map_file: PathBuf,

    /// TOML file listing the text/data/bss section names
    #[arg(long, help = "Section-to-segment configuration (TOML)")]
    pub sections: Option<PathBuf>,

    /// Also list every symbol
    #[arg(long)]
    pub symbols: bool,

    /// Exit with status 2 when the size totals don't reconcile
    #[arg(long)]
    pub strict: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

/// The three coarse memory classes a section can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Text,
    Data,
    Bss,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Text, Segment::Data, Segment::Bss];
}

/// Section names belonging to each segment class.
///
/// Loaded from TOML:
///
/// ```toml
/// text = [".text"]
/// data = [".data", ".rodata"]
/// bss = [".bss", "COMMON"]
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SegmentConfig {
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub bss: Vec<String>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self::new(
            [".text"],
            [".data", ".rodata", ".strings", "._pm"],
            [".bss", "COMMON"],
        )
    }
}

impl SegmentConfig {
    pub fn new<S: Into<String>>(
        text: impl IntoIterator<Item = S>,
        data: impl IntoIterator<Item = S>,
        bss: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            text: text.into_iter().map(Into::into).collect(),
            data: data.into_iter().map(Into::into).collect(),
            bss: bss.into_iter().map(Into::into).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| MapError::Config(e.to_string()))?;
        if config.all().next().is_none() {
            return Err(MapError::Config("no section names given".to_string()));
        }
        Ok(config)
    }

    /// Section names configured for one segment class.
    pub fn ids(&self, segment: Segment) -> &[String] {
        match segment {
            Segment::Text => &self.text,
            Segment::Data => &self.data,
            Segment::Bss => &self.bss,
        }
    }

    /// Every configured name, text first, then data, then bss.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.text
            .iter()
            .chain(&self.data)
            .chain(&self.bss)
            .map(String::as_str)
    }

    /// The segment class a section name is assigned to, if any.
    pub fn segment_of(&self, name: &str) -> Option<Segment> {
        Segment::ALL
            .into_iter()
            .find(|&seg| self.ids(seg).iter().any(|id| id == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml() {
        let config = SegmentConfig::from_toml(
            r#"
            text = [".text"]
            data = [".data", ".rodata"]
            bss = [".bss", "COMMON"]
            "#,
        )
        .unwrap();
        assert_eq!(config, SegmentConfig::new([".text"], [".data", ".rodata"], [".bss", "COMMON"]));
        assert_eq!(config.segment_of("COMMON"), Some(Segment::Bss));
        assert_eq!(config.segment_of(".rodata"), Some(Segment::Data));
        assert_eq!(config.segment_of(".debug_info"), None);
    }

    #[test]
    fn test_rejects_empty_and_unknown_keys() {
        assert!(matches!(SegmentConfig::from_toml(""), Err(MapError::Config(_))));
        assert!(matches!(
            SegmentConfig::from_toml("text = [\".text\"]\nrom = [\".x\"]"),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn test_default_order() {
        let config = SegmentConfig::default();
        let all: Vec<_> = config.all().collect();
        assert_eq!(all.first(), Some(&".text"));
        assert_eq!(all.last(), Some(&"COMMON"));
    }
}
