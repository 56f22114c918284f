use crate::size_limit::SizeLimit;

/// Represents some rules to be applied on the stream and field's content size
/// to prevent DoS attacks.
///
/// It's recommended to add some rules on field (specially text field) size to
/// avoid potential DoS attacks from attackers running the server out of
/// memory. This type provides some API to apply constraints on basis of a
/// single field level and the whole stream level.
///
/// # Examples
///
/// ```
/// use partreader::{Constraints, Multipart, SizeLimit};
///
/// # fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
///
/// let constraints = Constraints::new()
///     // We only accept `my_text_field` and `my_file_field` fields,
///     // For any unknown field, we will throw an error.
///     .allowed_fields(vec!["my_text_field", "my_file_field"])
///     .size_limit(
///         SizeLimit::new()
///             // Set 15mb as size limit for the whole stream body.
///             .whole_stream(15 * 1024 * 1024)
///             // Set 10mb as size limit for all fields.
///             .per_field(10 * 1024 * 1024)
///             // Set 30kb as size limit for our text field only.
///             .for_field("my_text_field", 30 * 1024)
///             // Never buffer more than 64kb looking for a line break.
///             .line(64 * 1024),
///     );
///
/// let mut multipart = Multipart::with_constraints(data.as_bytes(), "X-BOUNDARY", constraints);
///
/// while let Some(part) = multipart.next_part().unwrap() {
///     println!("Content: {:?}", part.text())
/// }
/// # }
/// # run();
/// ```
#[derive(Debug, Clone)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) allowed_fields: Option<Vec<String>>,
}

impl Constraints {
    /// Creates a set of rules with default behaviour.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies rules on field's content length.
    pub fn size_limit(self, size_limit: SizeLimit) -> Constraints {
        Constraints {
            size_limit,
            allowed_fields: self.allowed_fields,
        }
    }

    /// Specify which fields should be allowed, for any unknown field
    /// [`next_part`](crate::Multipart::next_part) will throw an error.
    pub fn allowed_fields<N: Into<String>>(self, allowed_fields: Vec<N>) -> Constraints {
        let allowed_fields = allowed_fields.into_iter().map(|item| item.into()).collect();

        Constraints {
            size_limit: self.size_limit,
            allowed_fields: Some(allowed_fields),
        }
    }

    pub(crate) fn is_it_allowed(&self, field: Option<&str>) -> bool {
        if let Some(ref allowed_fields) = self.allowed_fields {
            field
                .map(|field| allowed_fields.iter().any(|item| item == field))
                .unwrap_or(false)
        } else {
            true
        }
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            size_limit: SizeLimit::default(),
            allowed_fields: None,
        }
    }
}
