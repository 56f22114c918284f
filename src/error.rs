use std::fmt::{self, Debug, Display, Formatter};
use std::io;
use std::sync::Arc;

use thiserror::Error;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur during parsing multipart stream and in other
/// operations.
///
/// Every error raised while parsing is terminal: the [`Multipart`](crate::Multipart)
/// keeps returning a clone of it afterwards.
#[derive(Clone, Error)]
#[non_exhaustive]
pub enum Error {
    /// An unknown field is detected when multipart
    /// [`constraints`](crate::Constraints::allowed_fields) are added.
    #[error("unknown field received: {:?}", or_unknown(.field_name))]
    UnknownField { field_name: Option<String> },

    /// The stream ended before the part data reached the next boundary.
    #[error("field {:?} received with incomplete data", or_unknown(.field_name))]
    IncompleteFieldData { field_name: Option<String> },

    /// The stream ended before the part headers were complete.
    #[error("failed to read part complete headers")]
    IncompleteHeaders,

    /// Failed to read headers.
    #[error("failed to read headers")]
    ReadHeaderFailed(#[source] httparse::Error),

    /// Failed to decode the part's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[error("failed to decode part's raw header name: {name:?}")]
    DecodeHeaderName {
        name: String,
        #[source]
        cause: SharedError,
    },

    /// Failed to decode the part's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue) type.
    #[error("failed to decode part's raw header value")]
    DecodeHeaderValue {
        value: Vec<u8>,
        #[source]
        cause: SharedError,
    },

    /// A single line exceeded the maximum buffered length.
    #[error("line exceeded the maximum size limit: {limit} bytes")]
    LineSizeExceeded { limit: usize },

    /// The incoming field size exceeded the maximum limit.
    #[error("field {:?} exceeded the size limit: {} bytes", or_unknown(.field_name), .limit)]
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// The incoming stream size exceeded the maximum limit.
    #[error("stream size exceeded limit: {limit} bytes")]
    StreamSizeExceeded { limit: u64 },

    /// Reading from the underlying source failed.
    #[error("failed to read stream")]
    StreamReadFailed(#[source] Arc<io::Error>),

    /// The `Content-Type` header is not `multipart/form-data`.
    #[error("Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[error("failed to decode Content-Type")]
    DecodeContentType(#[source] Arc<mime::FromStrError>),

    /// No boundary found in `Content-Type` header.
    #[error("multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Failed to decode the part data as `JSON` in
    /// [`part.json()`](crate::Part::json) method.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    #[error("failed to decode field data as JSON")]
    DecodeJson(#[source] Arc<serde_json::Error>),
}

fn or_unknown(field_name: &Option<String>) -> &str {
    field_name.as_deref().unwrap_or("<unknown>")
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::StreamReadFailed(Arc::new(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::IncompleteFieldData { .. } | Error::IncompleteHeaders => io::ErrorKind::UnexpectedEof,
            Error::StreamReadFailed(e) => e.kind(),
            _ => io::ErrorKind::InvalidData,
        };

        io::Error::new(kind, err)
    }
}
