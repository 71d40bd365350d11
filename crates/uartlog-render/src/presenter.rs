//! Console line composition
//!
//! A record renders as
//! `<local time> [<remote ts>:<load>:<file>:<line>] <message>`; lines that are
//! not records are printed exactly as received.

use std::borrow::Cow;
use std::fmt::Display;

use chrono::{DateTime, Local};
use crossterm::style::ContentStyle;
use uartlog_core::{Config, LogRecord, ParsedLine, Piece, TimestampAnnotator};

use crate::palette;

const FULL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const SHORT_TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Renders parsed lines for the console
#[derive(Debug, Clone)]
pub struct Presenter {
    full: bool,
    color: bool,
    strip_prefix: String,
    annotator: TimestampAnnotator,
}

impl Presenter {
    pub fn new(config: &Config) -> Self {
        Self {
            full: config.full,
            color: config.color,
            strip_prefix: config.strip_prefix.clone(),
            annotator: TimestampAnnotator::new(config.full),
        }
    }

    /// `now` is the host time the line was received; it is used for the
    /// local time column and for every timestamp delta on the line.
    pub fn render(&self, line: &ParsedLine, now: &DateTime<Local>) -> String {
        match line {
            ParsedLine::Record(record) => self.render_record(record, now),
            ParsedLine::Passthrough(text) => text.clone(),
        }
    }

    pub fn render_record(&self, record: &LogRecord, now: &DateTime<Local>) -> String {
        let remote = self.render_span(&record.remote_timestamp, palette::timestamp(), now);
        let load = self.paint(record.load, palette::load(record.load_band()));
        let file = self.paint(self.display_path(&record.source_file), palette::source_file());
        let line = self.paint(record.source_line, palette::source_line());
        let message = self.render_span(&record.message, palette::level(record.level), now);

        format!(
            "{}{} [{}:{}:{}:{}] {}",
            record.prefix,
            self.local_time(now),
            remote,
            load,
            file,
            line,
            message
        )
    }

    /// Host time column: full date in full mode, time of day otherwise
    pub fn local_time(&self, now: &DateTime<Local>) -> String {
        let format = if self.full {
            FULL_TIME_FORMAT
        } else {
            SHORT_TIME_FORMAT
        };
        now.format(format).to_string()
    }

    /// Source path as displayed; the build's relative prefix is dropped
    /// outside full mode
    pub fn display_path<'a>(&self, file: &'a str) -> Cow<'a, str> {
        if self.full || self.strip_prefix.is_empty() || !file.contains(&self.strip_prefix) {
            Cow::Borrowed(file)
        } else {
            Cow::Owned(file.replace(&self.strip_prefix, ""))
        }
    }

    /// Paint a text span in `base`, with embedded epoch timestamps
    /// highlighted and annotated
    fn render_span(&self, text: &str, base: ContentStyle, now: &DateTime<Local>) -> String {
        self.annotator.render_with(text, now, |out, piece| {
            let style = match piece {
                Piece::Literal(_) => base,
                Piece::Epoch(_) => palette::timestamp(),
                Piece::Delta(_) => palette::timestamp_delta(),
            };
            out.push_str(&self.paint(piece.text(), style));
        })
    }

    fn paint<D: Display>(&self, value: D, style: ContentStyle) -> String {
        if self.color {
            style.apply(value).to_string()
        } else {
            value.to_string()
        }
    }
}
