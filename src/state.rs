use crate::boundary::{BoundaryMatcher, Delimiter};
use crate::buffer::LineScanner;
use crate::constants::{self, LineEnding};
use crate::helpers;
use bytes::{Bytes, BytesMut};
use http::header::HeaderMap;
use std::io::Read;

pub(crate) struct MultipartState<R> {
    pub(crate) scanner: LineScanner<R>,
    pub(crate) matcher: BoundaryMatcher,
    pub(crate) stage: StreamingStage,
    pub(crate) next_part_idx: usize,
    pub(crate) curr_part_idx: Option<usize>,
    pub(crate) curr_part_name: Option<String>,
    pub(crate) curr_part_size_limit: u64,
    pub(crate) curr_part_size_counter: u64,
    // Line break of the last body line, emitted only if the next line is not a delimiter.
    pub(crate) pending: Option<LineEnding>,
    pub(crate) error: Option<crate::Error>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    FindingFirstBoundary,
    ReadingPartHeaders,
    ReadingPartData,
    /// The closing delimiter was seen.
    Terminal,
    /// The source ended before any delimiter.
    Exhausted,
    Failed,
}

impl<R: Read> MultipartState<R> {
    /// Records `err` as the terminal error of the session.
    pub(crate) fn fail(&mut self, err: crate::Error) -> crate::Error {
        debug!("multipart parsing failed: {}", err);
        self.stage = StreamingStage::Failed;
        self.error = Some(err.clone());
        err
    }

    /// Skips the preamble. Returns `false` when no part follows.
    pub(crate) fn find_first_boundary(&mut self) -> crate::Result<bool> {
        loop {
            let line = match self.scanner.read_line()? {
                Some(line) => line,
                None => {
                    self.stage = StreamingStage::Exhausted;
                    return Ok(false);
                }
            };

            match self.matcher.classify(&line.content) {
                Some(Delimiter::Next) => {
                    trace!("first boundary found");
                    self.stage = StreamingStage::ReadingPartHeaders;
                    return Ok(true);
                }
                Some(Delimiter::Close) => {
                    trace!("closing boundary found before any part");
                    self.stage = StreamingStage::Terminal;
                    return Ok(false);
                }
                _ if line.ending == LineEnding::Eof => {
                    self.stage = StreamingStage::Exhausted;
                    return Ok(false);
                }
                _ => {}
            }
        }
    }

    pub(crate) fn read_part_headers(&mut self) -> crate::Result<HeaderMap> {
        let mut block = BytesMut::new();
        let mut count = 0;

        loop {
            let line = match self.scanner.read_line()? {
                Some(line) if line.ending != LineEnding::Eof => line,
                _ => return Err(crate::Error::IncompleteHeaders),
            };

            if line.content.is_empty() {
                break;
            }

            count += 1;
            if count > constants::MAX_HEADERS {
                return Err(crate::Error::ReadHeaderFailed(httparse::Error::TooManyHeaders));
            }

            block.extend_from_slice(&line.content);
            block.extend_from_slice(constants::CRLF.as_bytes());
        }

        block.extend_from_slice(constants::CRLF.as_bytes());

        let headers = helpers::parse_header_block(&block)?;
        self.stage = StreamingStage::ReadingPartData;
        self.pending = None;

        Ok(headers)
    }

    /// Returns the next chunk of the current part's body, or `None` once its
    /// delimiter line has been consumed.
    pub(crate) fn read_part_data(&mut self) -> crate::Result<Option<Bytes>> {
        loop {
            let line = match self.scanner.read_line()? {
                Some(line) => line,
                None => return Err(self.incomplete_part_data()),
            };

            if let Some(delimiter) = self.matcher.classify(&line.content) {
                // The held back line break belongs to the delimiter.
                self.pending = None;
                self.stage = match delimiter {
                    Delimiter::Next => StreamingStage::ReadingPartHeaders,
                    Delimiter::Close => StreamingStage::Terminal,
                };

                trace!("part {:?} done, next stage: {:?}", self.curr_part_idx, self.stage);
                return Ok(None);
            }

            if line.ending == LineEnding::Eof {
                return Err(self.incomplete_part_data());
            }

            let chunk = match self.pending.replace(line.ending) {
                Some(ending) => {
                    let ending = ending.as_bytes();
                    let mut chunk = BytesMut::with_capacity(ending.len() + line.content.len());
                    chunk.extend_from_slice(ending);
                    chunk.extend_from_slice(&line.content);
                    chunk.freeze()
                }
                None => line.content,
            };

            if chunk.is_empty() {
                continue;
            }

            self.curr_part_size_counter += chunk.len() as u64;
            if self.curr_part_size_counter > self.curr_part_size_limit {
                return Err(crate::Error::FieldSizeExceeded {
                    limit: self.curr_part_size_limit,
                    field_name: self.curr_part_name.clone(),
                });
            }

            return Ok(Some(chunk));
        }
    }

    /// Discards the rest of the current part's body.
    pub(crate) fn drain_part_data(&mut self) -> crate::Result<()> {
        while self.read_part_data()?.is_some() {}
        Ok(())
    }

    fn incomplete_part_data(&self) -> crate::Error {
        crate::Error::IncompleteFieldData {
            field_name: self.curr_part_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state(data: &'static str) -> MultipartState<&'static [u8]> {
        MultipartState {
            scanner: LineScanner::new(data.as_bytes(), 1024, u64::MAX),
            matcher: BoundaryMatcher::new("B"),
            stage: StreamingStage::FindingFirstBoundary,
            next_part_idx: 0,
            curr_part_idx: None,
            curr_part_name: None,
            curr_part_size_limit: u64::MAX,
            curr_part_size_counter: 0,
            pending: None,
            error: None,
        }
    }

    fn body(state: &mut MultipartState<&'static [u8]>) -> crate::Result<Vec<u8>> {
        let mut body = Vec::new();
        while let Some(chunk) = state.read_part_data()? {
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    #[test]
    fn test_find_first_boundary_skips_preamble() {
        let mut state = new_state("ignored\r\n--B-not-it\r\n--B\r\n");

        assert!(state.find_first_boundary().unwrap());
        assert_eq!(state.stage, StreamingStage::ReadingPartHeaders);
    }

    #[test]
    fn test_find_first_boundary_without_delimiter() {
        let mut state = new_state("just some text\r\nwithout a boundary");

        assert!(!state.find_first_boundary().unwrap());
        assert_eq!(state.stage, StreamingStage::Exhausted);

        let mut state = new_state("");
        assert!(!state.find_first_boundary().unwrap());
        assert_eq!(state.stage, StreamingStage::Exhausted);
    }

    #[test]
    fn test_find_first_boundary_close_delimiter() {
        let mut state = new_state("--B--");

        assert!(!state.find_first_boundary().unwrap());
        assert_eq!(state.stage, StreamingStage::Terminal);
    }

    #[test]
    fn test_find_first_boundary_delimiter_at_eof() {
        let mut state = new_state("preamble\r\n--B");

        assert!(state.find_first_boundary().unwrap());
        assert_eq!(state.stage, StreamingStage::ReadingPartHeaders);
        assert_eq!(state.read_part_headers().unwrap_err(), crate::Error::IncompleteHeaders);
    }

    #[test]
    fn test_read_part_headers() {
        let mut state = new_state("A: 1\nb: 2\r\n\nbody");

        let headers = state.read_part_headers().unwrap();
        assert_eq!(headers.get("a").unwrap(), "1");
        assert_eq!(headers.get("B").unwrap(), "2");
        assert_eq!(state.stage, StreamingStage::ReadingPartData);
    }

    #[test]
    fn test_read_part_headers_incomplete() {
        let mut state = new_state("A: 1\r\nB: 2");
        assert_eq!(state.read_part_headers().unwrap_err(), crate::Error::IncompleteHeaders);
    }

    #[test]
    fn test_read_part_headers_too_many() {
        let block = "X: y\r\n".repeat(constants::MAX_HEADERS + 1) + "\r\n";
        let mut state = new_state(Box::leak(block.into_boxed_str()));

        assert_eq!(
            state.read_part_headers().unwrap_err(),
            crate::Error::ReadHeaderFailed(httparse::Error::TooManyHeaders)
        );
    }

    #[test]
    fn test_read_part_data_holds_back_line_break() {
        let mut state = new_state("one\r\ntwo\n\r\n--B\r\nafter");

        assert_eq!(body(&mut state).unwrap(), b"one\r\ntwo\n");
        assert_eq!(state.stage, StreamingStage::ReadingPartHeaders);
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_read_part_data_empty_body() {
        let mut state = new_state("--B--\r\n");

        assert!(body(&mut state).unwrap().is_empty());
        assert_eq!(state.stage, StreamingStage::Terminal);
    }

    #[test]
    fn test_read_part_data_truncated() {
        let mut state = new_state("partial\r\n");
        assert_eq!(state.read_part_data().unwrap().as_deref(), Some(&b"partial"[..]));
        assert_eq!(
            state.read_part_data().unwrap_err(),
            crate::Error::IncompleteFieldData { field_name: None }
        );

        let mut state = new_state("no line break");
        assert!(state.read_part_data().is_err());
    }

    #[test]
    fn test_read_part_data_size_limit() {
        let mut state = new_state("0123456789\r\n--B--\r\n");
        state.curr_part_size_limit = 4;
        state.curr_part_name = Some("small".to_owned());

        assert_eq!(
            state.read_part_data().unwrap_err(),
            crate::Error::FieldSizeExceeded {
                limit: 4,
                field_name: Some("small".to_owned()),
            }
        );
    }
}
