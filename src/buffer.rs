use crate::constants::{self, LineEnding};
use bytes::{Bytes, BytesMut};
use std::io::{self, Read};

/// One line read from the source, without its line break.
#[derive(Debug)]
pub(crate) struct Line {
    pub(crate) content: Bytes,
    pub(crate) ending: LineEnding,
}

/// Splits a byte source into lines while never buffering more than one line
/// (plus whatever a single read returned past it).
pub(crate) struct LineScanner<R> {
    eof: bool,
    buf: BytesMut,
    scratch: Box<[u8]>,
    // Prefix of `buf` already known to hold no line feed.
    scanned: usize,
    reader: R,
    max_line_size: usize,
    whole_stream_size_limit: u64,
    stream_size_counter: u64,
}

impl<R: Read> LineScanner<R> {
    pub fn new(reader: R, max_line_size: usize, whole_stream_size_limit: u64) -> Self {
        LineScanner {
            eof: false,
            buf: BytesMut::new(),
            scratch: vec![0; constants::READ_CHUNK_SIZE].into_boxed_slice(),
            scanned: 0,
            reader,
            max_line_size,
            whole_stream_size_limit,
            stream_size_counter: 0,
        }
    }

    /// Returns the next line, or `None` once the source is exhausted between
    /// two lines.
    pub fn read_line(&mut self) -> crate::Result<Option<Line>> {
        loop {
            if let Some(pos) = memchr::memchr(constants::LF, &self.buf[self.scanned..]) {
                let end = self.scanned + pos + 1;
                if end > self.max_line_size {
                    return Err(crate::Error::LineSizeExceeded {
                        limit: self.max_line_size,
                    });
                }

                self.scanned = 0;

                let mut content = self.buf.split_to(end);
                content.truncate(end - 1);

                let ending = if content.last() == Some(&constants::CR) {
                    content.truncate(end - 2);
                    LineEnding::CrLf
                } else {
                    LineEnding::Lf
                };

                return Ok(Some(Line {
                    content: content.freeze(),
                    ending,
                }));
            }

            self.scanned = self.buf.len();

            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }

                self.scanned = 0;

                return Ok(Some(Line {
                    content: self.buf.split().freeze(),
                    ending: LineEnding::Eof,
                }));
            }

            // A full buffer without a line feed cannot end within the limit.
            if self.buf.len() >= self.max_line_size {
                return Err(crate::Error::LineSizeExceeded {
                    limit: self.max_line_size,
                });
            }

            self.fill()?;
        }
    }

    fn fill(&mut self) -> crate::Result<()> {
        // Never buffer more than the line limit.
        let room = self
            .max_line_size
            .saturating_sub(self.buf.len())
            .clamp(1, self.scratch.len());

        loop {
            match self.reader.read(&mut self.scratch[..room]) {
                Ok(0) => {
                    trace!("source exhausted after {} bytes", self.stream_size_counter);
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.stream_size_counter += n as u64;

                    if self.stream_size_counter > self.whole_stream_size_limit {
                        return Err(crate::Error::StreamSizeExceeded {
                            limit: self.whole_stream_size_limit,
                        });
                    }

                    self.buf.extend_from_slice(&self.scratch[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}
