//! Embedded epoch timestamp detection and annotation.
//!
//! The firmware prints its clock as a zero-padded 10-digit Unix time. Any such
//! run, in the envelope's timestamp field or inside a message, gets the
//! difference to the host clock appended so drift and event ages are visible
//! at a glance.
//!
//! Annotation is done in two passes: [`segments`] splits a span into literal
//! text and epoch runs, then [`TimestampAnnotator::render_with`] hands each
//! resulting [`Piece`] to a painter. Plain and colored output share that path.

use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::LazyLock;

/// Width of an epoch-seconds timestamp on the wire
pub const EPOCH_DIGITS: usize = 10;

/// Maximal runs of ASCII digits. Only runs of exactly [`EPOCH_DIGITS`] are
/// timestamps; `\d` is avoided so non-ASCII digits never match.
static DIGIT_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("Invalid DIGIT_RUN_REGEX"));

/// A piece of a scanned text span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text to copy as-is
    Literal(&'a str),

    /// An epoch timestamp; `digits` is the original text
    Epoch { digits: &'a str, epoch: i64 },
}

/// Lazy iterator over the segments of a text span
pub struct Segments<'a> {
    text: &'a str,
    matches: regex::Matches<'static, 'a>,
    cursor: usize,
    pending: Option<regex::Match<'a>>,
}

/// Split `text` into literal and epoch segments.
///
/// Concatenating the `Literal` text and the `Epoch` digits always yields
/// `text` back.
pub fn segments(text: &str) -> Segments<'_> {
    Segments {
        text,
        matches: DIGIT_RUN_REGEX.find_iter(text),
        cursor: 0,
        pending: None,
    }
}

impl<'a> Segments<'a> {
    fn epoch_segment(&mut self, m: regex::Match<'a>) -> Segment<'a> {
        self.cursor = m.end();
        let digits = m.as_str();
        match digits.parse::<i64>() {
            Ok(epoch) => Segment::Epoch { digits, epoch },
            Err(_) => Segment::Literal(digits),
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(m) = self.pending.take() {
            return Some(self.epoch_segment(m));
        }

        loop {
            match self.matches.next() {
                Some(m) if m.len() == EPOCH_DIGITS => {
                    if m.start() > self.cursor {
                        let literal = &self.text[self.cursor..m.start()];
                        self.cursor = m.start();
                        self.pending = Some(m);
                        return Some(Segment::Literal(literal));
                    }
                    return Some(self.epoch_segment(m));
                }
                // Shorter or longer runs stay inside the surrounding literal
                Some(_) => continue,
                None => {
                    if self.cursor < self.text.len() {
                        let literal = &self.text[self.cursor..];
                        self.cursor = self.text.len();
                        return Some(Segment::Literal(literal));
                    }
                    return None;
                }
            }
        }
    }
}

/// Seconds from `now` to `epoch` (negative when the timestamp is in the past)
pub fn delta_seconds(epoch: i64, now: &DateTime<Local>) -> f64 {
    epoch as f64 - now.timestamp_millis() as f64 / 1000.0
}

/// Render a delta as `( 1.250s)` or `(-1.250s)`.
///
/// The leading space on non-negative values keeps columns aligned with the
/// negative form.
pub fn format_delta(delta: f64) -> String {
    // Avoid printing "-0.000" for an exact match
    let delta = if delta == 0.0 { 0.0 } else { delta };
    if delta >= 0.0 {
        format!("( {:.3}s)", delta)
    } else {
        format!("({:.3}s)", delta)
    }
}

/// A rendered piece of an annotated span, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    Literal(&'a str),
    /// The epoch digits as received
    Epoch(&'a str),
    /// `( x.xxxs)` following an epoch, full mode only
    Delta(&'a str),
}

impl<'a> Piece<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Piece::Literal(text) | Piece::Epoch(text) | Piece::Delta(text) => text,
        }
    }
}

/// Timestamp annotation.
///
/// In full mode every epoch run is followed by its delta to `now`; otherwise
/// the text is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampAnnotator {
    full: bool,
}

impl TimestampAnnotator {
    pub fn new(full: bool) -> Self {
        Self { full }
    }

    fn delta_suffix(&self, epoch: i64, now: &DateTime<Local>) -> Option<String> {
        self.full.then(|| format_delta(delta_seconds(epoch, now)))
    }

    /// Annotate `text` without styling
    pub fn annotate(&self, text: &str, now: &DateTime<Local>) -> String {
        self.render_with(text, now, |out, piece| out.push_str(piece.text()))
    }

    /// Annotate `text`, letting `paint` append each piece to the output
    pub fn render_with<F>(&self, text: &str, now: &DateTime<Local>, mut paint: F) -> String
    where
        F: FnMut(&mut String, Piece<'_>),
    {
        let mut out = String::with_capacity(text.len() + 16);
        for segment in segments(text) {
            match segment {
                Segment::Literal(literal) => paint(&mut out, Piece::Literal(literal)),
                Segment::Epoch { digits, epoch } => {
                    paint(&mut out, Piece::Epoch(digits));
                    if let Some(suffix) = self.delta_suffix(epoch, now) {
                        paint(&mut out, Piece::Delta(&suffix));
                    }
                }
            }
        }
        out
    }
}
