use crate::constants;
use bytes::BytesMut;
use http::header::{AsHeaderName, HeaderMap, HeaderName, HeaderValue};
use httparse::Header;
use std::convert::TryFrom;
use std::sync::Arc;

/// Parses a header block whose lines are already normalized to CRLF and which
/// ends with the empty line.
pub(crate) fn parse_header_block(block: &BytesMut) -> crate::Result<HeaderMap> {
    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    match httparse::parse_headers(block, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => convert_raw_headers_to_header_map(raw_headers),
        Ok(httparse::Status::Partial) => Err(crate::Error::IncompleteHeaders),
        Err(err) => Err(crate::Error::ReadHeaderFailed(err)),
    }
}

pub(crate) fn convert_raw_headers_to_header_map(raw_headers: &[Header<'_>]) -> crate::Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|err| crate::Error::DecodeHeaderName {
            name: raw_header.name.to_owned(),
            cause: Arc::new(err),
        })?;

        let value = HeaderValue::try_from(raw_header.value).map_err(|err| crate::Error::DecodeHeaderValue {
            value: raw_header.value.to_owned(),
            cause: Arc::new(err),
        })?;

        headers.append(name, value);
    }

    Ok(headers)
}

/// Joins every value of a repeated header with `", "`.
pub(crate) fn joined_header_value<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<String> {
    let mut values = headers.get_all(name).iter().peekable();
    values.peek()?;

    let joined = values
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .collect::<Vec<_>>()
        .join(", ");

    Some(joined)
}
