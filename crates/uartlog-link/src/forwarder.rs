//! Operator input forwarding
//!
//! Lines typed by the operator are written to the link as-is, without the
//! line terminator, so the firmware sees exactly what was typed.

use std::io::{self, BufRead, ErrorKind, Write};
use std::thread::{self, JoinHandle};

use uartlog_core::prelude::*;

/// Counters reported when the forwarder stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwarderStats {
    pub sent: usize,
    pub failed: usize,
}

/// Relays lines from `input` to the write side of the link
pub struct InputForwarder<R, W> {
    input: R,
    link: W,
    stats: ForwarderStats,
}

impl<R: BufRead, W: Write> InputForwarder<R, W> {
    pub fn new(input: R, link: W) -> Self {
        Self {
            input,
            link,
            stats: ForwarderStats::default(),
        }
    }

    /// Forward until the input closes.
    ///
    /// A failed write is reported through `report` and forwarding continues
    /// with the next line.
    pub fn run(mut self, mut report: impl FnMut(&Error)) -> ForwarderStats {
        let mut line = String::new();
        loop {
            line.clear();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    info!("Operator input closed");
                    break;
                }
                Ok(_) => {
                    let command = line.trim_end_matches(['\r', '\n']);
                    match self.send(command) {
                        Ok(()) => self.stats.sent += 1,
                        Err(e) => {
                            self.stats.failed += 1;
                            report(&e);
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    warn!("Skipping operator input that is not UTF-8");
                    report(&Error::decode(e.to_string()));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Failed to read operator input: {}", e);
                    break;
                }
            }
        }
        self.stats
    }

    fn send(&mut self, command: &str) -> Result<()> {
        debug!("Forwarding {} bytes to link", command.len());
        self.link.write_all(command.as_bytes())?;
        self.link.flush()?;
        Ok(())
    }
}

/// Forward the process's stdin to `link` on a dedicated thread.
///
/// Write errors are printed to stderr. `on_exit` runs on the forwarder thread
/// once stdin closes.
pub fn spawn_stdin_forwarder<W, F>(link: W, on_exit: F) -> io::Result<JoinHandle<()>>
where
    W: Write + Send + 'static,
    F: FnOnce(ForwarderStats) + Send + 'static,
{
    thread::Builder::new()
        .name("input-forwarder".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            let forwarder = InputForwarder::new(stdin.lock(), link);
            let stats = forwarder.run(|e| {
                warn!("Input forwarding failed: {}", e);
                eprintln!("{}", e);
            });
            info!(
                "Input forwarder exiting ({} sent, {} failed)",
                stats.sent, stats.failed
            );
            on_exit(stats);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Link that fails the writes whose index is listed
    struct FlakyLink {
        written: Vec<u8>,
        writes: usize,
        fail_on: Vec<usize>,
    }

    impl FlakyLink {
        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                written: Vec::new(),
                writes: 0,
                fail_on,
            }
        }
    }

    impl Write for FlakyLink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let index = self.writes;
            self.writes += 1;
            if self.fail_on.contains(&index) {
                return Err(io::Error::new(ErrorKind::TimedOut, "write timed out"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_forwards_lines_without_terminator() {
        let input = Cursor::new(b"reboot\r\nstatus\n".to_vec());
        let mut link = Vec::new();
        let stats = InputForwarder::new(input, &mut link).run(|e| panic!("unexpected {e}"));

        assert_eq!(link, b"rebootstatus");
        assert_eq!(stats, ForwarderStats { sent: 2, failed: 0 });
    }

    #[test]
    fn test_write_failure_is_reported_and_forwarding_continues() {
        let input = Cursor::new(b"first\nsecond\nthird\n".to_vec());
        let mut link = FlakyLink::failing_on(vec![1]);
        let mut reported = Vec::new();

        let stats = InputForwarder::new(input, &mut link).run(|e| reported.push(e.to_string()));

        assert_eq!(link.written, b"firstthird");
        assert_eq!(stats, ForwarderStats { sent: 2, failed: 1 });
        assert_eq!(reported.len(), 1);
        assert!(reported[0].contains("write timed out"));
    }

    #[test]
    fn test_invalid_utf8_input_is_skipped() {
        let input = Cursor::new(vec![0xff, b'\n', b'o', b'k', b'\n']);
        let mut link = Vec::new();
        let mut reported = 0;

        let stats = InputForwarder::new(input, &mut link).run(|_| reported += 1);

        assert_eq!(link, b"ok");
        assert_eq!(stats.sent, 1);
        assert_eq!(reported, 1);
    }

    #[test]
    fn test_empty_input_stops_immediately() {
        let mut link = Vec::new();
        let stats = InputForwarder::new(Cursor::new(Vec::new()), &mut link).run(|_| {});
        assert_eq!(stats, ForwarderStats::default());
        assert!(link.is_empty());
    }
}
