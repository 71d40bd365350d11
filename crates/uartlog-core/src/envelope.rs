//! Structured log envelope parser.
//!
//! Firmware log macros print every line as
//! `[<remote_ts>:<load>:<level>:<file>:<line>] <message>`. Lines that do not
//! have this shape (boot banners, raw `printf` output) pass through untouched.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{LogLevel, LogRecord, ParsedLine};

/// Matches the log envelope anywhere in a line.
/// Captures: 1=prefix, 2=remote_ts, 3=load, 4=level, 5=file, 6=line, 7=message
///
/// Every field but `file` is numeric. `file` is non-greedy so paths
/// containing `:` (drive letters) still anchor on the trailing `:<line>] `.
static ENVELOPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\[(\d+):(\d+):(\d):(.+?):(\d+)\] (.*)$")
        .expect("Invalid ENVELOPE_REGEX")
});

/// Parse a decoded, right-trimmed line.
pub fn parse_line(line: &str) -> ParsedLine {
    match parse_record(line) {
        Some(record) => ParsedLine::Record(record),
        None => ParsedLine::Passthrough(line.to_string()),
    }
}

/// Extract a [`LogRecord`] if the envelope matches.
///
/// Numeric fields that overflow are treated as a mismatch.
pub fn parse_record(line: &str) -> Option<LogRecord> {
    let caps = ENVELOPE_REGEX.captures(line)?;

    let load = caps[3].parse::<u32>().ok()?;
    let level = caps[4].parse::<u8>().ok()?;
    let source_line = caps[6].parse::<u32>().ok()?;

    Some(LogRecord {
        prefix: caps[1].to_string(),
        remote_timestamp: caps[2].to_string(),
        load,
        level: LogLevel::from_digit(level),
        source_file: caps[5].to_string(),
        source_line,
        message: caps[7].to_string(),
    })
}
