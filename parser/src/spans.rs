//! Types related to spanning parsed code.

use nom::Slice;

use core::fmt;

/// Code span.
pub type InputSpan<'a> = nom_locate::LocatedSpan<&'a str, ()>;
/// Scanning outcome generalized by the type returned on success.
pub(crate) type NomResult<'a, T> = nom::IResult<InputSpan<'a>, T>;

/// Code span together with information related to where it is located in the code.
///
/// This type is similar to one from the [`nom_locate`] crate, but it does not provide access
/// to other parts of the code, which allows to store owned fragments (see [`Location`])
/// alongside borrowed ones.
///
/// [`nom_locate`]: https://crates.io/crates/nom_locate
#[derive(Debug, Clone, Copy)]
pub struct LocatedSpan<Span, T = ()> {
    offset: usize,
    line: u32,
    column: usize,
    fragment: Span,

    /// Extra information that can be embedded by the user.
    pub extra: T,
}

impl<Span: PartialEq, T> PartialEq for LocatedSpan<Span, T> {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.offset == other.offset && self.fragment == other.fragment
    }
}

impl<Span, T> LocatedSpan<Span, T> {
    /// The offset represents the position of the fragment relatively to the input of the parser.
    /// It starts at offset 0.
    pub fn location_offset(&self) -> usize {
        self.offset
    }

    /// The line number of the fragment relatively to the input of the parser. It starts at line 1.
    pub fn location_line(&self) -> u32 {
        self.line
    }

    /// The column of the fragment start. It starts at column 1.
    pub fn get_column(&self) -> usize {
        self.column
    }

    /// The fragment that is spanned. The fragment represents a part of the input of the parser.
    pub fn fragment(&self) -> &Span {
        &self.fragment
    }
}

impl<Span: AsRef<str>, T> LocatedSpan<Span, T> {
    /// Returns the offset just past the end of the fragment.
    pub fn end_offset(&self) -> usize {
        self.offset + self.fragment.as_ref().len()
    }

    /// Converts this span into an owned [`Location`] with the provided `extra` field.
    pub fn to_location_with<U>(&self, extra: U) -> Location<U> {
        LocatedSpan {
            offset: self.offset,
            line: self.line,
            column: self.column,
            fragment: self.fragment.as_ref().to_owned(),
            extra,
        }
    }

    /// Converts this span into an owned [`Location`] dropping the `extra` field.
    pub fn to_location(&self) -> Location {
        self.to_location_with(())
    }
}

impl<Span: Copy, T> LocatedSpan<Span, T> {
    /// Copies this span with the provided `extra` field.
    pub fn copy_with_extra<U>(&self, value: U) -> LocatedSpan<Span, U> {
        LocatedSpan {
            offset: self.offset,
            line: self.line,
            column: self.column,
            fragment: self.fragment,
            extra: value,
        }
    }
}

/// Value with an associated code span.
pub type Spanned<'a, T = ()> = LocatedSpan<&'a str, T>;

impl<'a, T> Spanned<'a, T> {
    pub(crate) fn new(span: InputSpan<'a>, extra: T) -> Self {
        Self {
            offset: span.location_offset(),
            line: span.location_line(),
            column: span.get_utf8_column(),
            fragment: *span.fragment(),
            extra,
        }
    }

    /// Creates a span with the same position as `self`, but with a different fragment.
    /// Used for synthetic tokens that do not correspond to the source text verbatim.
    pub(crate) fn with_fragment(&self, fragment: &'a str) -> Self
    where
        T: Copy,
    {
        Self {
            fragment,
            ..*self
        }
    }
}

impl<'a> Spanned<'a> {
    /// Creates a span from a `range` in the provided `code`. This is mostly useful for testing.
    pub fn from_str<R>(code: &'a str, range: R) -> Self
    where
        InputSpan<'a>: Slice<R>,
    {
        let input = InputSpan::new(code);
        Self::new(input.slice(range), ())
    }
}

/// Owned counterpart of [`Spanned`]: the code fragment is copied, so the location can outlive
/// the parsed code. Used in errors and compiled expressions.
pub type Location<T = ()> = LocatedSpan<String, T>;

impl<T> fmt::Display for LocatedSpan<String, T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Wrapper around parsers allowing to capture both their output and the relevant span.
pub(crate) fn with_span<'a, O>(
    mut parser: impl FnMut(InputSpan<'a>) -> NomResult<'a, O>,
) -> impl FnMut(InputSpan<'a>) -> NomResult<'a, Spanned<'a, O>> {
    move |input: InputSpan<'a>| {
        parser(input).map(|(rest, output)| {
            let len = rest.location_offset() - input.location_offset();
            let spanned = Spanned::new(input.slice(..len), output);
            (rest, spanned)
        })
    }
}
