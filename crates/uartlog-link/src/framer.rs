//! Newline framing over a raw byte stream

use std::io::{BufRead, BufReader, ErrorKind, Read};

use uartlog_core::prelude::*;

/// One line as received, delimiter included. May not be valid UTF-8.
pub type RawLine = Vec<u8>;

/// Splits a blocking byte stream into `\n`-terminated lines.
///
/// The framer is lazy and single-pass. Once the stream reports end of data
/// (a read of zero bytes) or a hard error, every later call returns
/// `Ok(None)`.
///
/// Serial ports report an idle line as a read timeout. Timeouts are not the
/// end of the stream: bytes of a partially received line are kept and the
/// read is retried.
pub struct Framer<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    finished: bool,
}

impl<R: Read> Framer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
            finished: false,
        }
    }

    /// Block until the next complete line or the end of the stream.
    ///
    /// A final line without a delimiter is returned once before end of
    /// stream is signalled.
    pub fn next_line(&mut self) -> Result<Option<RawLine>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) => {
                    self.finished = true;
                    if self.pending.is_empty() {
                        debug!("Link closed");
                        return Ok(None);
                    }
                    debug!("Link closed mid-line, flushing {} bytes", self.pending.len());
                    return Ok(Some(std::mem::take(&mut self.pending)));
                }
                Ok(_) => {
                    if self.pending.last() == Some(&b'\n') {
                        return Ok(Some(std::mem::take(&mut self.pending)));
                    }
                    // Hit end of data without a delimiter; the next read
                    // returns 0 and flushes what we have.
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) =>
                {
                    trace!("Idle link ({}), {} bytes pending", e.kind(), self.pending.len());
                }
                Err(e) => {
                    self.finished = true;
                    error!("Link read failed: {}", e);
                    return Err(Error::serial(format!("read failed: {}", e)));
                }
            }
        }
    }
}

impl<R: Read> Iterator for Framer<R> {
    type Item = Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
