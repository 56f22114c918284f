use crate::boundary::BoundaryMatcher;
use crate::buffer::LineScanner;
use crate::constraints::Constraints;
use crate::content_disposition::ContentDisposition;
use crate::state::{MultipartState, StreamingStage};
use crate::Part;
use http::header::HeaderMap;
use spin::mutex::spin::SpinMutex as Mutex;
use std::fmt::{self, Debug, Formatter};
use std::io::Read;
use std::sync::Arc;

/// Represents the implementation of `multipart/*` formatted data.
///
/// This will parse the source reader into [`Part`] instances one line at a
/// time, via [`next_part`](Multipart::next_part) or its [`Iterator`]
/// implementation.
///
/// To maintain consistency in the underlying reader, only the most recently
/// returned [`Part`] can be read. Requesting the next part discards whatever is
/// left of the current one.
///
/// Any error is terminal: once returned, every later call returns it again.
///
/// # Examples
///
/// ```
/// use partreader::Multipart;
///
/// # fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let mut multipart = Multipart::new(data.as_bytes(), "X-BOUNDARY");
///
/// while let Some(part) = multipart.next_part().unwrap() {
///     println!("Part: {:?}", part.text())
/// }
/// # }
/// # run();
/// ```
pub struct Multipart<R> {
    state: Arc<Mutex<MultipartState<R>>>,
    constraints: Constraints,
}

impl<R: Read> Multipart<R> {
    /// Construct a new `Multipart` instance with the given reader and the boundary.
    pub fn new<B: Into<String>>(reader: R, boundary: B) -> Self {
        Multipart::with_constraints(reader, boundary, Constraints::default())
    }

    /// Construct a new `Multipart` instance with the given reader, the boundary
    /// and the [`Constraints`] to apply.
    pub fn with_constraints<B: Into<String>>(reader: R, boundary: B, constraints: Constraints) -> Self {
        let boundary = boundary.into();

        let state = MultipartState {
            scanner: LineScanner::new(
                reader,
                constraints.size_limit.line,
                constraints.size_limit.whole_stream,
            ),
            matcher: BoundaryMatcher::new(&boundary),
            stage: StreamingStage::FindingFirstBoundary,
            next_part_idx: 0,
            curr_part_idx: None,
            curr_part_name: None,
            curr_part_size_limit: constraints.size_limit.per_field,
            curr_part_size_counter: 0,
            pending: None,
            error: None,
        };

        Multipart {
            state: Arc::new(Mutex::new(state)),
            constraints,
        }
    }

    /// Yields the next [`Part`] if available.
    ///
    /// Any unread data of the previous part is read and discarded first.
    /// Returns `Ok(None)` once the closing boundary has been seen, and also
    /// when the source ends without containing a single boundary.
    pub fn next_part(&mut self) -> crate::Result<Option<Part<R>>> {
        let mut state = self.state.lock();

        if let Some(ref err) = state.error {
            return Err(err.clone());
        }

        let headers = match Self::advance(&mut state) {
            Ok(Some(headers)) => headers,
            Ok(None) => return Ok(None),
            Err(err) => return Err(state.fail(err)),
        };

        let part_idx = state.next_part_idx;
        state.next_part_idx += 1;

        let content_disposition = ContentDisposition::parse(&headers);
        let part_name = content_disposition.field_name.clone();

        state.curr_part_idx = Some(part_idx);
        state.curr_part_size_limit = self
            .constraints
            .size_limit
            .extract_size_limit_for(part_name.as_deref());
        state.curr_part_size_counter = 0;
        state.curr_part_name = part_name;

        if !self.constraints.is_it_allowed(content_disposition.field_name.as_deref()) {
            return Err(state.fail(crate::Error::UnknownField {
                field_name: content_disposition.field_name,
            }));
        }

        trace!("yielding part {}", part_idx);
        drop(state);

        Ok(Some(Part::new(
            Arc::clone(&self.state),
            headers,
            part_idx,
            content_disposition,
        )))
    }

    /// Yields the next [`Part`] with their positioning index as a tuple
    /// `(usize, Part)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use partreader::Multipart;
    ///
    /// # fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let mut multipart = Multipart::new(data.as_bytes(), "X-BOUNDARY");
    ///
    /// while let Some((idx, part)) = multipart.next_part_with_idx().unwrap() {
    ///     println!("Index: {:?}, Content: {:?}", idx, part.text())
    /// }
    /// # }
    /// # run();
    /// ```
    pub fn next_part_with_idx(&mut self) -> crate::Result<Option<(usize, Part<R>)>> {
        self.next_part().map(|part| part.map(|part| (part.index(), part)))
    }

    fn advance(state: &mut MultipartState<R>) -> crate::Result<Option<HeaderMap>> {
        if state.stage == StreamingStage::ReadingPartData {
            state.curr_part_idx = None;
            state.drain_part_data()?;
        }

        if state.stage == StreamingStage::FindingFirstBoundary && !state.find_first_boundary()? {
            return Ok(None);
        }

        match state.stage {
            StreamingStage::ReadingPartHeaders => state.read_part_headers().map(Some),
            _ => Ok(None),
        }
    }
}

impl<R: Read> Iterator for Multipart<R> {
    type Item = crate::Result<Part<R>>;

    /// Stops after the last part or right after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.state.lock().stage == StreamingStage::Failed {
            return None;
        }

        self.next_part().transpose()
    }
}

impl<R> Debug for Multipart<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct("Multipart")
            .field("stage", &state.stage)
            .field("next_part_idx", &state.next_part_idx)
            .field("constraints", &self.constraints)
            .finish()
    }
}
