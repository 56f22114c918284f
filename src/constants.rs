pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_LINE_SIZE_LIMIT: usize = 1 << 20;

pub(crate) const READ_CHUNK_SIZE: usize = 8 * 1024;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';
pub(crate) const CRLF: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineEnding {
    CrLf,
    Lf,
    /// The stream ended before a line break.
    Eof,
}

impl LineEnding {
    pub(crate) fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::CrLf => CRLF.as_bytes(),
            LineEnding::Lf => &CRLF.as_bytes()[1..],
            LineEnding::Eof => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ending_bytes() {
        assert_eq!(LineEnding::CrLf.as_bytes(), b"\r\n");
        assert_eq!(LineEnding::Lf.as_bytes(), b"\n");
        assert!(LineEnding::Eof.as_bytes().is_empty());
    }
}
