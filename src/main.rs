//! Entry point for the ldmap tool.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Set up logging with `tracing-subscriber`.
//! 3. Load the segment configuration (defaults, or a TOML file).
//! 4. Parse the map file and print the summary.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ldmap::config::{Config, SegmentConfig};
use ldmap::parser::MapParser;
use ldmap::report;

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let segments = match &config.sections {
        Some(path) => SegmentConfig::load(path)
            .with_context(|| format!("failed to load section configuration {}", path.display()))?,
        None => SegmentConfig::default(),
    };

    let mut lines = 0usize;
    let mut count_lines = |done: bool| {
        if done {
            tracing::debug!("Processed {} lines", lines);
        } else {
            lines += 1;
        }
    };

    let parser = MapParser::new(segments);
    let model = parser
        .parse_file(&config.map_file, Some(&mut count_lines))
        .context("could not parse map file")?;

    let stdout = std::io::stdout();
    report::write_summary(&mut stdout.lock(), &model, config.symbols)?;

    if !model.consistency.is_consistent() {
        eprintln!("warning: size totals don't reconcile; the map may use an unsupported layout");
        if config.strict {
            std::process::exit(2);
        }
    }
    Ok(())
}
