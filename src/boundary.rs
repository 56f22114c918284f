use crate::constants;

/// The kind of a delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    /// `--boundary`, another part follows.
    Next,
    /// `--boundary--`, the last part has been read.
    Close,
}

/// Recognizes delimiter lines for a single boundary token.
#[derive(Debug, Clone)]
pub(crate) struct BoundaryMatcher {
    dash_boundary: Vec<u8>,
}

impl BoundaryMatcher {
    pub fn new(boundary: &str) -> Self {
        let mut dash_boundary = Vec::with_capacity(constants::BOUNDARY_EXT.len() + boundary.len());
        dash_boundary.extend_from_slice(constants::BOUNDARY_EXT.as_bytes());
        dash_boundary.extend_from_slice(boundary.as_bytes());

        BoundaryMatcher { dash_boundary }
    }

    /// Classifies a line whose line break has already been stripped.
    ///
    /// The comparison is byte-exact. After `--boundary` and an optional `--`,
    /// only spaces and tabs may follow.
    pub fn classify(&self, line: &[u8]) -> Option<Delimiter> {
        let rest = line.strip_prefix(&self.dash_boundary[..])?;

        let (kind, rest) = match rest.strip_prefix(constants::BOUNDARY_EXT.as_bytes()) {
            Some(rest) => (Delimiter::Close, rest),
            None => (Delimiter::Next, rest),
        };

        if only_horizontal_whitespace(rest) {
            Some(kind)
        } else {
            None
        }
    }
}

fn only_horizontal_whitespace(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| *b == b' ' || *b == b'\t')
}
