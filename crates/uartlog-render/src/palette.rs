//! Console color palette.
//!
//! The classic 8-color ANSI set, so output looks the same in any terminal and
//! in `less -R`.

use crossterm::style::{Attribute, Color, ContentStyle};
use uartlog_core::{LoadBand, LogLevel};

// --- Timestamps ---
pub const TIMESTAMP: Color = Color::DarkBlue;

// --- Load bands ---
pub const LOAD_HIGH: Color = Color::DarkRed;
pub const LOAD_MEDIUM: Color = Color::DarkYellow;
pub const LOAD_LOW: Color = Color::Grey;

// --- Source location ---
pub const SOURCE_FILE: Color = Color::DarkCyan;
pub const SOURCE_LINE: Color = Color::DarkMagenta;

// --- Log level colors ---
pub const LEVEL_VERBOSE: Color = Color::DarkGreen;
pub const LEVEL_WARNING: Color = Color::DarkYellow;
pub const LEVEL_ERROR: Color = Color::DarkRed;

/// Foreground-only style
pub fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

fn bold(mut style: ContentStyle) -> ContentStyle {
    style.attributes.set(Attribute::Bold);
    style
}

pub fn timestamp() -> ContentStyle {
    fg(TIMESTAMP)
}

/// Delta suffix after a timestamp
pub fn timestamp_delta() -> ContentStyle {
    bold(fg(TIMESTAMP))
}

pub fn load(band: LoadBand) -> ContentStyle {
    match band {
        LoadBand::High => fg(LOAD_HIGH),
        LoadBand::Medium => fg(LOAD_MEDIUM),
        LoadBand::Low => fg(LOAD_LOW),
    }
}

pub fn source_file() -> ContentStyle {
    fg(SOURCE_FILE)
}

pub fn source_line() -> ContentStyle {
    fg(SOURCE_LINE)
}

/// Message style for a level. Info and unknown levels use the terminal default.
pub fn level(level: LogLevel) -> ContentStyle {
    match level {
        LogLevel::Verbose => fg(LEVEL_VERBOSE),
        LogLevel::Info => ContentStyle::default(),
        LogLevel::Warning => fg(LEVEL_WARNING),
        LogLevel::Error => fg(LEVEL_ERROR),
        LogLevel::Fatal => bold(fg(LEVEL_ERROR)),
        LogLevel::Other(_) => ContentStyle::default(),
    }
}
