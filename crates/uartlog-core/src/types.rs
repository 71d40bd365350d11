//! Core domain types for firmware log records

// ─────────────────────────────────────────────────────────────────────────────
// LogLevel
// ─────────────────────────────────────────────────────────────────────────────

/// Severity digit carried in the log envelope.
///
/// The firmware emits `0`..`4`; any other digit is kept as [`LogLevel::Other`]
/// so it still renders, with the default color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Verbose,
    Info,
    Warning,
    Error,
    Fatal,
    Other(u8),
}

impl LogLevel {
    /// Map an envelope level digit to a level
    pub fn from_digit(digit: u8) -> Self {
        match digit {
            0 => LogLevel::Verbose,
            1 => LogLevel::Info,
            2 => LogLevel::Warning,
            3 => LogLevel::Error,
            4 => LogLevel::Fatal,
            other => LogLevel::Other(other),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoadBand
// ─────────────────────────────────────────────────────────────────────────────

/// Color band for the scheduler-load field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBand {
    /// `load <= 2`
    Low,
    /// `2 < load <= 5`
    Medium,
    /// `load > 5`
    High,
}

impl LoadBand {
    pub fn for_load(load: u32) -> Self {
        if load > 5 {
            LoadBand::High
        } else if load > 2 {
            LoadBand::Medium
        } else {
            LoadBand::Low
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LogRecord
// ─────────────────────────────────────────────────────────────────────────────

/// A structured log line extracted from the envelope
/// `[<remote_ts>:<load>:<level>:<file>:<line>] <message>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Text received before the opening `[` (usually empty)
    pub prefix: String,

    /// Device-side timestamp field, may embed epoch timestamps
    pub remote_timestamp: String,

    /// Scheduler queue utilization reported by the firmware
    pub load: u32,

    pub level: LogLevel,

    /// Source file as compiled into the firmware (`__FILE__`)
    pub source_file: String,

    pub source_line: u32,

    /// Free-text message, may embed epoch timestamps
    pub message: String,
}

impl LogRecord {
    pub fn load_band(&self) -> LoadBand {
        LoadBand::for_load(self.load)
    }
}

/// Outcome of running a decoded line through the envelope parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// The envelope matched
    Record(LogRecord),

    /// Anything else, kept verbatim
    Passthrough(String),
}
