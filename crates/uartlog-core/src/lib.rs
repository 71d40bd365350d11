//! # uartlog-core - Core Domain Types
//!
//! Foundation crate for uartlog. Provides domain types, error handling,
//! configuration, logging setup, and the two text passes applied to every
//! firmware log line.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, regex, tracing, toml).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`LogRecord`] - Fields extracted from a log envelope
//! - [`LogLevel`] - Envelope severity digit
//! - [`LoadBand`] - Color band of the scheduler-load field
//! - [`ParsedLine`] - Record or verbatim pass-through
//!
//! ### Envelope Parsing (`envelope`)
//! - [`parse_line()`] - Match `[ts:load:level:file:line] message`
//!
//! ### Timestamps (`timestamp`)
//! - [`TimestampAnnotator`] - Append host-clock deltas to 10-digit epochs
//! - [`Piece`] - Literal, epoch and delta pieces handed to a painter
//!
//! ### Configuration (`config`)
//! - [`Config`] - Immutable session configuration
//! - [`Settings`] - `uartlog.toml` contents
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with fatal classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context

pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod timestamp;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::{load_settings, load_settings_from, Config, Settings, DEFAULT_BAUD_RATE};
pub use envelope::{parse_line, parse_record};
pub use error::{Error, Result, ResultExt};
pub use timestamp::{Piece, TimestampAnnotator};
pub use types::{LoadBand, LogLevel, LogRecord, ParsedLine};
