//! Utility functions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MapError, Result};

static HEX_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F]+$").unwrap());

/// Whether `token` is a `0x`-prefixed hexadecimal literal.
pub fn is_hex(token: &str) -> bool {
    HEX_LITERAL.is_match(token)
}

/// Parses a hexadecimal token, with or without the `0x` prefix.
///
/// `line` is the 1-based line number reported on failure.
pub fn parse_hex(token: &str, line: usize) -> Result<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).map_err(|_| MapError::InvalidHex {
        token: token.to_string(),
        line,
    })
}

/// Returns everything after the `n`th whitespace-delimited field, left-trimmed.
///
/// Paths may contain spaces, so the tail is sliced from the original line
/// instead of being re-joined from fields.
pub fn rest_after_field(line: &str, n: usize) -> &str {
    let mut rest = line;
    for _ in 0..=n {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    rest.trim_start()
}

/// Whether a line names an object file, i.e. ends in `.o` or `.o)`.
pub fn ends_with_object(line: &str) -> bool {
    let line = line.trim_end();
    line.ends_with(".o") || line.ends_with(".o)")
}
