use crate::content_disposition::ContentDisposition;
use crate::helpers;
use crate::state::MultipartState;
use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use http::header::{self, HeaderMap};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
use spin::mutex::spin::SpinMutex as Mutex;
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read};
use std::sync::Arc;

/// A single part of a multipart stream.
///
/// The body is read lazily from the source, either chunk by chunk with
/// [`chunk`](Part::chunk), through the [`Read`] implementation, or all at
/// once with [`bytes`](Part::bytes), [`text`](Part::text) and friends.
///
/// # Stale parts
///
/// A `Part` only reads while it is the current part of its
/// [`Multipart`](crate::Multipart). Once [`next_part`](crate::Multipart::next_part)
/// has been called again the old `Part` reports end-of-data from every read; the
/// unread remainder of its body has already been discarded.
///
/// # Examples
///
/// ```
/// use partreader::Multipart;
/// use std::io::Read;
///
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let mut multipart = Multipart::new(data.as_bytes(), "X-BOUNDARY");
///
/// while let Some(mut part) = multipart.next_part()? {
///     let mut body = String::new();
///     part.read_to_string(&mut body)?;
///
///     assert_eq!(body, "abcd");
/// }
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct Part<R> {
    state: Arc<Mutex<MultipartState<R>>>,
    headers: HeaderMap,
    done: bool,
    leftover: Bytes,
    meta: PartMeta,
}

struct PartMeta {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<mime::Mime>,
    idx: usize,
}

impl<R: Read> Part<R> {
    pub(crate) fn new(
        state: Arc<Mutex<MultipartState<R>>>,
        headers: HeaderMap,
        idx: usize,
        content_disposition: ContentDisposition,
    ) -> Self {
        let content_type = Self::parse_content_type(&headers);

        Part {
            state,
            headers,
            done: false,
            leftover: Bytes::new(),
            meta: PartMeta {
                name: content_disposition.field_name,
                file_name: content_disposition.file_name,
                content_type,
                idx,
            },
        }
    }

    fn parse_content_type(headers: &HeaderMap) -> Option<mime::Mime> {
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<mime::Mime>().ok())
    }

    /// The `name` parameter of a `form-data` `Content-Disposition` header.
    ///
    /// Returns `None` when the header or the parameter is missing, and when
    /// the disposition type is anything but `form-data`.
    pub fn form_name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    /// The `filename` parameter of the `Content-Disposition` header, whatever
    /// the disposition type.
    pub fn file_name(&self) -> Option<&str> {
        self.meta.file_name.as_deref()
    }

    /// Get the content type of the part.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.meta.content_type.as_ref()
    }

    /// Get a map of headers as [`HeaderMap`].
    ///
    /// Names are case-insensitive and repeated headers keep every value.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// All values of the header `name` joined with `", "`.
    ///
    /// ```
    /// # let data = "--X\r\nAccept: a\r\naccept: b\r\n\r\n\r\n--X--\r\n";
    /// # let mut multipart = partreader::Multipart::new(data.as_bytes(), "X");
    /// let part = multipart.next_part().unwrap().unwrap();
    ///
    /// assert_eq!(part.header("ACCEPT").as_deref(), Some("a, b"));
    /// assert_eq!(part.header("missing"), None);
    /// ```
    pub fn header(&self, name: &str) -> Option<String> {
        helpers::joined_header_value(&self.headers, name)
    }

    /// Get the index of this part in order they appeared in the stream.
    pub fn index(&self) -> usize {
        self.meta.idx
    }

    /// Get the next chunk of the body, `None` once the part ends.
    ///
    /// Fails with [`Error::IncompleteFieldData`](crate::Error::IncompleteFieldData)
    /// when the source ends before the next boundary.
    pub fn chunk(&mut self) -> crate::Result<Option<Bytes>> {
        if self.done {
            return Ok(None);
        }

        let mut state = self.state.lock();

        if state.curr_part_idx != Some(self.meta.idx) {
            self.done = true;
            self.leftover = Bytes::new();
            return Ok(None);
        }

        if !self.leftover.is_empty() {
            return Ok(Some(std::mem::take(&mut self.leftover)));
        }

        if let Some(ref err) = state.error {
            return Err(err.clone());
        }

        match state.read_part_data() {
            Ok(Some(bytes)) => Ok(Some(bytes)),
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(err) => Err(state.fail(err)),
        }
    }

    /// Get the full data of the part as [`Bytes`].
    pub fn bytes(mut self) -> crate::Result<Bytes> {
        let mut buf = BytesMut::new();

        while let Some(bytes) = self.chunk()? {
            buf.extend_from_slice(&bytes);
        }

        Ok(buf.freeze())
    }

    /// Try to deserialize the part data as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<T: DeserializeOwned>(self) -> crate::Result<T> {
        serde_json::from_slice(&self.bytes()?).map_err(|err| crate::Error::DecodeJson(Arc::new(err)))
    }

    /// Get the full part data as text, decoded as UTF-8 unless the
    /// `Content-Type` says otherwise.
    pub fn text(self) -> crate::Result<String> {
        self.text_with_charset("utf-8")
    }

    /// Get the full part data as text given a specific encoding.
    ///
    /// The `charset` parameter of the part's `Content-Type` wins over
    /// `default_encoding`; unknown labels fall back to UTF-8.
    pub fn text_with_charset(self, default_encoding: &str) -> crate::Result<String> {
        let encoding_name = self
            .content_type()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str().to_owned())
            .unwrap_or_else(|| default_encoding.to_owned());

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let bytes = self.bytes()?;

        let (text, _, _) = encoding.decode(&bytes);

        Ok(text.into_owned())
    }
}

impl<R: Read> Read for Part<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut bytes = match self.chunk()? {
            Some(bytes) => bytes,
            None => return Ok(0),
        };

        let n = buf.len().min(bytes.len());
        buf[..n].copy_from_slice(&bytes.split_to(n));
        self.leftover = bytes;

        Ok(n)
    }
}

impl<R> Debug for Part<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("index", &self.meta.idx)
            .field("form_name", &self.meta.name)
            .field("file_name", &self.meta.file_name)
            .field("headers", &self.headers)
            .field("done", &self.done)
            .finish()
    }
}
