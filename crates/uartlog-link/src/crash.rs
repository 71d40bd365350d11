//! Crash dump capture.
//!
//! When the firmware faults, its crash handler prints `###CRASH###`, a hex
//! dump of registers and RAM, then `###END###`, all on the same UART as the
//! normal log. [`CrashCapture`] is a line-by-line state machine that pulls the
//! dump out of the stream so it never reaches the log parser.

use std::path::{Path, PathBuf};

use uartlog_core::prelude::*;

/// Start-of-dump marker
pub const CRASH_START_MARKER: &[u8] = b"###CRASH###";

/// End-of-dump marker
pub const CRASH_END_MARKER: &[u8] = b"###END###";

/// Bytes to buffer before giving up on an end marker. A full RAM dump of the
/// supported parts is a few hundred KiB of hex.
pub const MAX_DUMP_BYTES: usize = 16 * 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// How a crash episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpEnd {
    /// `###END###` was received
    Marker,

    /// The link closed while capturing
    StreamEnded,

    /// [`MAX_DUMP_BYTES`] was exceeded without an end marker
    SizeLimit,
}

/// A captured crash dump, ready to be written to its destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashDump {
    /// Fixed destination, overwritten by every episode
    pub path: PathBuf,

    /// Every line between the markers, delimiters included
    pub bytes: Vec<u8>,

    pub line_count: usize,

    pub end: DumpEnd,
}

impl CrashDump {
    pub fn is_complete(&self) -> bool {
        self.end == DumpEnd::Marker
    }

    /// Write the dump to [`CrashDump::path`], replacing any previous dump
    pub fn write(&self) -> Result<()> {
        std::fs::write(&self.path, &self.bytes)
            .map_err(|e| Error::dump_write(&self.path, e.to_string()))?;
        info!(
            "Wrote {} byte crash dump ({} lines) to {}",
            self.bytes.len(),
            self.line_count,
            self.path.display()
        );
        Ok(())
    }
}

/// Result of feeding a line to the capture state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResult {
    /// Not part of a crash episode; the caller handles it as a log line
    NotConsumed,

    /// The start marker was consumed and capturing began
    Started,

    /// The line was appended to the dump
    Buffered,

    /// A start marker arrived while a dump was already open; it was dropped
    Rejected,

    /// The episode ended
    Complete(CrashDump),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Normal,
    Capturing,
}

// ─────────────────────────────────────────────────────────────────────────────
// State machine
// ─────────────────────────────────────────────────────────────────────────────

/// Line-by-line crash dump capture.
///
/// Capture is opt-in: without a symbol file nothing could decode the dump, so
/// the start marker is then treated as an ordinary line.
#[derive(Debug)]
pub struct CrashCapture {
    state: CaptureState,
    enabled: bool,
    dump_path: PathBuf,
    buffer: Vec<u8>,
    line_count: usize,
}

impl CrashCapture {
    pub fn new(enabled: bool, dump_path: impl Into<PathBuf>) -> Self {
        Self {
            state: CaptureState::Normal,
            enabled,
            dump_path: dump_path.into(),
            buffer: Vec::new(),
            line_count: 0,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    pub fn dump_path(&self) -> &Path {
        &self.dump_path
    }

    /// Feed one raw line (delimiter included)
    pub fn feed(&mut self, line: &[u8]) -> FeedResult {
        match self.state {
            CaptureState::Normal => self.handle_normal(line),
            CaptureState::Capturing => self.handle_capturing(line),
        }
    }

    /// Close an open episode because the stream ended.
    ///
    /// Returns the partial dump, if any, so the bytes received so far can
    /// still be persisted.
    pub fn finish(&mut self) -> Option<CrashDump> {
        if !self.is_capturing() {
            return None;
        }
        warn!(
            "Stream ended while capturing a crash dump ({} lines buffered)",
            self.line_count
        );
        Some(self.take_dump(DumpEnd::StreamEnded))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State Handlers
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_normal(&mut self, line: &[u8]) -> FeedResult {
        if !contains_marker(line, CRASH_START_MARKER) {
            return FeedResult::NotConsumed;
        }

        if !self.enabled {
            debug!("Crash marker seen but no symbol file configured, ignoring");
            return FeedResult::NotConsumed;
        }

        info!("Crash marker detected, capturing dump");
        self.state = CaptureState::Capturing;
        self.buffer.clear();
        self.line_count = 0;
        FeedResult::Started
    }

    fn handle_capturing(&mut self, line: &[u8]) -> FeedResult {
        if contains_marker(line, CRASH_END_MARKER) {
            info!("End marker received after {} dump lines", self.line_count);
            return FeedResult::Complete(self.take_dump(DumpEnd::Marker));
        }

        if contains_marker(line, CRASH_START_MARKER) {
            warn!("Second crash marker while a dump is open, dropping it");
            return FeedResult::Rejected;
        }

        self.buffer.extend_from_slice(line);
        self.line_count += 1;

        if self.buffer.len() > MAX_DUMP_BYTES {
            warn!(
                "Crash dump exceeded {} bytes without an end marker, closing it",
                MAX_DUMP_BYTES
            );
            return FeedResult::Complete(self.take_dump(DumpEnd::SizeLimit));
        }

        FeedResult::Buffered
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn take_dump(&mut self, end: DumpEnd) -> CrashDump {
        let dump = CrashDump {
            path: self.dump_path.clone(),
            bytes: std::mem::take(&mut self.buffer),
            line_count: self.line_count,
            end,
        };
        self.state = CaptureState::Normal;
        self.line_count = 0;
        dump
    }
}

/// Check whether the whitespace-trimmed line contains `marker`
fn contains_marker(line: &[u8], marker: &[u8]) -> bool {
    line.trim_ascii()
        .windows(marker.len())
        .any(|window| window == marker)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
