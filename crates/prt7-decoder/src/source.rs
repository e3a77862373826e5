//! Line sources feeding a decoding session.
//!
//! The session pulls one line at a time through [`LineSource`]. A source
//! returns `Ok(None)` once it has nothing more to give; an `Err` is a
//! terminal failure of the transport.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use prt7_protocol::LineCodec;

use crate::error::SourceError;

/// Size of the scratch buffer used for each read call.
const READ_CHUNK: usize = 64;

/// How often a [`StoppableLineSource`] rechecks its stop flag while waiting.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A blocking supplier of raw frame lines.
pub trait LineSource {
    /// Block until the next line is available.
    ///
    /// Returns `Ok(None)` at end of input.
    fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        (**self).next_line()
    }
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        (**self).next_line()
    }
}

/// Lines from an in-memory iterator (test harnesses, replayed captures).
#[derive(Debug, Clone)]
pub struct IterLineSource<I> {
    lines: I,
}

impl<I, S> IterLineSource<I>
where
    I: Iterator<Item = S>,
    S: Into<String>,
{
    /// Wrap anything iterable as a line source.
    pub fn new(lines: impl IntoIterator<IntoIter = I, Item = S>) -> Self {
        IterLineSource {
            lines: lines.into_iter(),
        }
    }
}

impl<I, S> LineSource for IterLineSource<I>
where
    I: Iterator<Item = S>,
    S: Into<String>,
{
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        Ok(self.lines.next().map(Into::into))
    }
}

/// Lines reassembled from a byte stream (device file, stdin, TCP socket).
#[derive(Debug)]
pub struct ReaderLineSource<R> {
    reader: R,
    codec: LineCodec,
    eof: bool,
}

impl<R: Read> ReaderLineSource<R> {
    /// Read lines with the default line limit.
    pub fn new(reader: R) -> Self {
        Self::with_codec(reader, LineCodec::new())
    }

    /// Read lines using a pre-configured codec.
    pub fn with_codec(reader: R, codec: LineCodec) -> Self {
        ReaderLineSource {
            reader,
            codec,
            eof: false,
        }
    }

    /// Lines cut short at the codec's length limit so far.
    pub fn truncated_lines(&self) -> u64 {
        self.codec.truncated_lines()
    }

    /// Get the underlying reader back.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> LineSource for ReaderLineSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.codec.decode_line() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(self.codec.finish());
            }

            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    tracing::debug!("line source reached end of stream");
                    self.eof = true;
                }
                Ok(n) => self.codec.push(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Err(SourceError::Timeout);
                }
                Err(e) => return Err(SourceError::Io(e)),
            }
        }
    }
}

/// Runs a blocking source on a reader thread so a stop flag can end the wait.
///
/// A blocked `read` on a tty or pipe is not woken by Ctrl-C once a signal
/// handler is installed, so the waiting side polls the flag instead. When the
/// flag is raised, [`next_line`](LineSource::next_line) returns
/// [`SourceError::Stopped`] and the reader thread is left blocked; it exits on
/// its own once the inner source returns or the process ends.
///
/// The channel holds at most one line, so the reader never runs more than one
/// line ahead of the session.
#[derive(Debug)]
pub struct StoppableLineSource {
    lines: Receiver<Result<Option<String>, SourceError>>,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
    finished: bool,
}

impl StoppableLineSource {
    /// Move `source` onto a reader thread.
    pub fn spawn<S>(source: S, stop: Arc<AtomicBool>) -> Result<Self, SourceError>
    where
        S: LineSource + Send + 'static,
    {
        Self::spawn_with_interval(source, stop, STOP_POLL_INTERVAL)
    }

    /// Like [`spawn`](Self::spawn) with a custom flag polling interval.
    pub fn spawn_with_interval<S>(
        mut source: S,
        stop: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Result<Self, SourceError>
    where
        S: LineSource + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name("prt7-reader".to_string())
            .spawn(move || loop {
                let next = source.next_line();
                let last = !matches!(next, Ok(Some(_)));
                if tx.send(next).is_err() || last {
                    break;
                }
            })?;

        Ok(StoppableLineSource {
            lines: rx,
            stop,
            poll_interval,
            finished: false,
        })
    }
}

impl LineSource for StoppableLineSource {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            if self.stop.load(Ordering::Relaxed) {
                tracing::debug!("stop requested while waiting for a line");
                return Err(SourceError::Stopped);
            }
            match self.lines.recv_timeout(self.poll_interval) {
                Ok(next) => {
                    self.finished = !matches!(next, Ok(Some(_)));
                    return next;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.finished = true;
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader handing out one byte per call, like a slow serial line.
    struct Trickle<'a> {
        data: &'a [u8],
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.split_first() {
                Some((&b, rest)) if !buf.is_empty() => {
                    buf[0] = b;
                    self.data = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "device unplugged"))
        }
    }

    #[test]
    fn test_iter_source() {
        let mut source = IterLineSource::new(["L,A", "M,1"]);
        assert_eq!(source.next_line().unwrap(), Some("L,A".to_string()));
        assert_eq!(source.next_line().unwrap(), Some("M,1".to_string()));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_reader_source_lines() {
        let mut source = ReaderLineSource::new(Cursor::new(b"L,H\r\n\r\nM,2\r\nL,A".to_vec()));
        assert_eq!(source.next_line().unwrap(), Some("L,H".to_string()));
        assert_eq!(source.next_line().unwrap(), Some("M,2".to_string()));
        assert_eq!(source.next_line().unwrap(), Some("L,A".to_string()));
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_reader_source_trickle() {
        let mut source = ReaderLineSource::new(Trickle {
            data: b"M,-2\r\nL,W\r\n",
        });
        assert_eq!(source.next_line().unwrap(), Some("M,-2".to_string()));
        assert_eq!(source.next_line().unwrap(), Some("L,W".to_string()));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_reader_source_error() {
        let mut source = ReaderLineSource::new(Failing);
        assert!(matches!(source.next_line(), Err(SourceError::Io(_))));
    }

    /// Reader that hands out its bytes and then blocks until released.
    struct Stalled {
        data: Cursor<Vec<u8>>,
        release: Receiver<()>,
    }

    impl Read for Stalled {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.read(buf)? {
                0 => {
                    let _ = self.release.recv();
                    Ok(0)
                }
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_stoppable_source_passes_lines_through() {
        let stop = Arc::new(AtomicBool::new(false));
        let inner = ReaderLineSource::new(Cursor::new(b"L,H\r\nM,2\r\n".to_vec()));
        let mut source = StoppableLineSource::spawn(inner, stop).unwrap();
        assert_eq!(source.next_line().unwrap(), Some("L,H".to_string()));
        assert_eq!(source.next_line().unwrap(), Some("M,2".to_string()));
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_stoppable_source_forwards_errors() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = StoppableLineSource::spawn(ReaderLineSource::new(Failing), stop).unwrap();
        assert!(matches!(source.next_line(), Err(SourceError::Io(_))));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_stop_flag_ends_blocked_read() {
        let (release_tx, release_rx) = crossbeam_channel::bounded(1);
        let inner = ReaderLineSource::new(Stalled {
            data: Cursor::new(b"L,O\r\n".to_vec()),
            release: release_rx,
        });
        let stop = Arc::new(AtomicBool::new(false));
        let mut source =
            StoppableLineSource::spawn_with_interval(inner, stop.clone(), Duration::from_millis(5))
                .unwrap();

        assert_eq!(source.next_line().unwrap(), Some("L,O".to_string()));

        let raiser = {
            let stop = stop.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                stop.store(true, Ordering::Relaxed);
            })
        };
        assert!(matches!(source.next_line(), Err(SourceError::Stopped)));
        raiser.join().unwrap();

        release_tx.send(()).unwrap();
    }

    #[test]
    fn test_reader_source_truncation() {
        let codec = LineCodec::with_max_line_length(3);
        let mut source = ReaderLineSource::with_codec(Cursor::new(b"L,Space\n".to_vec()), codec);
        assert_eq!(source.next_line().unwrap(), Some("L,S".to_string()));
        assert_eq!(source.truncated_lines(), 1);
    }
}
