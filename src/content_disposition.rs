use http::header::{self, HeaderMap};

const FORM_DATA: &str = "form-data";
const NAME: &str = "name";
const FILE_NAME: &str = "filename";

/// The `name` and `filename` parameters of a `Content-Disposition` header.
#[derive(Debug, Default)]
pub(crate) struct ContentDisposition {
    pub(crate) field_name: Option<String>,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    pub fn parse(headers: &HeaderMap) -> ContentDisposition {
        headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|val| std::str::from_utf8(val.as_bytes()).ok())
            .map(ContentDisposition::parse_value)
            .unwrap_or_default()
    }

    /// `name` is only reported for `form-data` dispositions, `filename` for any.
    pub fn parse_value(value: &str) -> ContentDisposition {
        let (disposition, params) = match value.find(';') {
            Some(idx) => (&value[..idx], &value[idx + 1..]),
            None => (value, ""),
        };

        let is_form_data = disposition.trim().eq_ignore_ascii_case(FORM_DATA);
        let mut content_disposition = ContentDisposition::default();

        for (key, val) in Params::new(params) {
            if key.eq_ignore_ascii_case(NAME) {
                if is_form_data && content_disposition.field_name.is_none() {
                    content_disposition.field_name = Some(val);
                }
            } else if key.eq_ignore_ascii_case(FILE_NAME) && content_disposition.file_name.is_none() {
                content_disposition.file_name = Some(val);
            }
        }

        content_disposition
    }
}

/// Iterates over `key=value` pairs separated by `;`. Values may be quoted, in
/// which case `\` escapes the next character.
struct Params<'a> {
    rest: &'a str,
}

impl<'a> Params<'a> {
    fn new(rest: &'a str) -> Self {
        Params { rest }
    }

    fn quoted_value(&mut self) -> String {
        let mut value = String::new();
        let mut chars = self.rest[1..].char_indices();

        while let Some((idx, ch)) = chars.next() {
            match ch {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        value.push(escaped);
                    }
                }
                '"' => {
                    self.rest = &self.rest[idx + 2..];
                    return value;
                }
                _ => value.push(ch),
            }
        }

        // Unterminated quote, take everything that is left.
        self.rest = "";
        value
    }

    fn token_value(&mut self) -> String {
        let end = self.rest.find(';').unwrap_or(self.rest.len());
        let value = self.rest[..end].trim().to_owned();
        self.rest = &self.rest[end..];
        value
    }
}

impl Iterator for Params<'_> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.rest = self.rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
            if self.rest.is_empty() {
                return None;
            }

            let end = self.rest.find(|c: char| c == '=' || c == ';').unwrap_or(self.rest.len());
            let key = self.rest[..end].trim().to_owned();

            if !self.rest[end..].starts_with('=') {
                // A parameter without a value.
                self.rest = &self.rest[end..];
                continue;
            }

            self.rest = self.rest[end + 1..].trim_start();

            let value = if self.rest.starts_with('"') {
                self.quoted_value()
            } else {
                self.token_value()
            };

            return Some((key, value));
        }
    }
}
