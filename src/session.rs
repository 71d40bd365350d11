//! Receive loop
//!
//! A [`Session`] owns everything downstream of the framer: crash capture,
//! parsing and rendering. It writes finished console lines to any
//! [`Write`] sink, so the same code drives stdout and in-memory buffers.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use uartlog_core::prelude::*;
use uartlog_core::{parse_line, Config};
use uartlog_link::{BacktraceTool, CrashCapture, CrashDump, DumpEnd, FeedResult, Framer};
use uartlog_render::Presenter;

/// Printed when a dump is closed by end of stream instead of its end marker
pub const INCOMPLETE_DUMP_WARNING: &str =
    "Crash dump incomplete: stream ended before end marker";

/// Printed after the backtrace output
pub const CRASH_SEPARATOR: &str = "---------";

/// Counters reported when the receive loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Lines rendered to the console (records and pass-through)
    pub lines: usize,
    /// Lines dropped because they were not UTF-8
    pub decode_errors: usize,
    /// Crash episodes closed, complete or not
    pub crashes: usize,
}

/// One receive loop over a link
pub struct Session<T, W> {
    capture: CrashCapture,
    presenter: Presenter,
    tool: Option<T>,
    console: W,
    stats: SessionStats,
}

impl<T: BacktraceTool, W: Write> Session<T, W> {
    /// `tool` decodes completed dumps; `None` still captures and writes them.
    pub fn new(config: &Config, tool: Option<T>, console: W) -> Self {
        Self {
            capture: CrashCapture::new(config.crash_capture_enabled(), config.dump_file.clone()),
            presenter: Presenter::new(config),
            tool,
            console,
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn into_console(self) -> W {
        self.console
    }

    /// Drive the session until the framer reaches end of stream.
    ///
    /// A read error ends the loop like end of stream does; an open dump is
    /// still flushed before the error is returned.
    pub fn run<R: Read>(&mut self, framer: &mut Framer<R>) -> Result<SessionStats> {
        info!("Receive loop started");
        let mut outcome = Ok(());
        for raw in framer.by_ref() {
            match raw {
                Ok(raw) => self.handle_line(&raw, Local::now())?,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        self.finish()?;
        info!(
            "Receive loop stopped ({} lines, {} decode errors, {} crashes)",
            self.stats.lines, self.stats.decode_errors, self.stats.crashes
        );
        outcome.map(|()| self.stats())
    }

    /// Process one raw line received at `now`.
    ///
    /// Only console write failures are returned; everything else is reported
    /// on the console and the loop goes on.
    pub fn handle_line(&mut self, raw: &[u8], now: DateTime<Local>) -> Result<()> {
        match self.capture.feed(raw) {
            FeedResult::NotConsumed => self.present(raw, &now),
            FeedResult::Started => {
                writeln!(self.console, "Crash detected, retrieving crash info...")?;
                if let Some(tool) = &self.tool {
                    let command = tool.command_line(self.capture.dump_path());
                    writeln!(self.console, "{}", command)?;
                }
                Ok(())
            }
            FeedResult::Buffered => Ok(()),
            FeedResult::Rejected => {
                writeln!(
                    self.console,
                    "WARNING: crash marker received while a dump is open, ignored"
                )?;
                Ok(())
            }
            FeedResult::Complete(dump) => self.complete_dump(dump),
        }
    }

    /// Close an episode left open by end of stream
    pub fn finish(&mut self) -> Result<()> {
        match self.capture.finish() {
            Some(dump) => self.complete_dump(dump),
            None => Ok(()),
        }
    }

    fn present(&mut self, raw: &[u8], now: &DateTime<Local>) -> Result<()> {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => {
                self.stats.decode_errors += 1;
                let err = Error::decode(e.to_string());
                warn!("Dropping line: {}", err);
                writeln!(self.console, "ERROR: {}", err)?;
                return Ok(());
            }
        };

        let line = parse_line(text.trim_end());
        trace!("{:?}", line);
        writeln!(self.console, "{}", self.presenter.render(&line, now))?;
        self.stats.lines += 1;
        Ok(())
    }

    fn complete_dump(&mut self, dump: CrashDump) -> Result<()> {
        self.stats.crashes += 1;

        if let Err(e) = dump.write().context("Saving crash dump") {
            writeln!(self.console, "ERROR: {}", e)?;
            return Ok(());
        }

        if dump.is_complete() {
            return self.print_backtrace(&dump.path);
        }

        if dump.end == DumpEnd::SizeLimit {
            writeln!(
                self.console,
                "Crash dump incomplete: no end marker after {} bytes, saved to {}",
                dump.bytes.len(),
                dump.path.display()
            )?;
        } else {
            writeln!(self.console, "{}", INCOMPLETE_DUMP_WARNING)?;
        }
        Ok(())
    }

    fn print_backtrace(&mut self, dump_path: &Path) -> Result<()> {
        let Some(tool) = &self.tool else {
            writeln!(self.console, "Crash dump saved to {}", dump_path.display())?;
            return Ok(());
        };

        writeln!(self.console, "Crash info retrieved.")?;
        match tool.backtrace(dump_path) {
            Ok(output) => {
                write!(self.console, "{}", output.stdout)?;
                if !output.stdout.is_empty() && !output.stdout.ends_with('\n') {
                    writeln!(self.console)?;
                }
            }
            Err(e) => {
                warn!("{}", e);
                writeln!(self.console, "ERROR: {}", e)?;
            }
        }
        writeln!(self.console, "{}", CRASH_SEPARATOR)?;
        self.console.flush()?;
        Ok(())
    }
}
