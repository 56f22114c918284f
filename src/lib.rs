//! A line-oriented, pull-based parser for `multipart/*` bodies.
//!
//! The parser reads any [`std::io::Read`] source one line at a time and hands
//! out the parts of the body as they are found. Only one [`Part`] is readable at
//! a time; asking for the next one discards whatever is left of the current
//! part's body.
//!
//! # Examples
//!
//! ```
//! use partreader::Multipart;
//!
//! # fn run() -> partreader::Result<()> {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
//! let mut multipart = Multipart::new(data.as_bytes(), "X-BOUNDARY");
//!
//! while let Some(part) = multipart.next_part()? {
//!     let name = part.form_name().map(|name| name.to_owned());
//!     let text = part.text()?;
//!
//!     assert_eq!(name.as_deref(), Some("my_text_field"));
//!     assert_eq!(text, "abcd");
//! }
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ## Optional features
//!
//! * `json`: adds [`Part::json`] to deserialize a part body with `serde_json`.
//! * `log`: emits parser traces through the `log` facade.

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(nightly, feature(doc_cfg))]

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (::log::trace!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($t:tt)*) => (::log::debug!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($t:tt)*) => {};
}

pub use bytes;
pub use constraints::Constraints;
pub use error::Error;
pub use field::Part;
pub use multipart::Multipart;
pub use size_limit::SizeLimit;

mod boundary;
mod buffer;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod field;
mod helpers;
mod multipart;
mod size_limit;
mod state;

/// A Result type often returned from methods that can have `partreader` errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(partreader::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(|err| Error::DecodeContentType(std::sync::Arc::new(err)))?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary() {
        let content_type = "multipart/form-data; boundary=ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("ABCDEFG".to_owned()));

        let content_type = "multipart/form-data; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("------ABCDEFG".to_owned()));

        let content_type = "boundary=------ABCDEFG";
        assert!(parse_boundary(content_type).is_err());

        let content_type = "text/plain";
        assert_eq!(parse_boundary(content_type), Err(Error::NoMultipart));

        let content_type = "text/plain; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Err(Error::NoMultipart));

        let content_type = "multipart/form-data";
        assert_eq!(parse_boundary(content_type), Err(Error::NoBoundary));
    }
}
