//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages.

// lets `#[derive(ErrorKind)]` refer to this crate by name from within its own tests
extern crate self as cas_error;

use ariadne::{Color, Report, Source};
use std::{any::Any, fmt::{self, Debug, Display, Formatter}, ops::Range, sync::Arc};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send + Sync {
    /// Returns the error as a [`dyn Any`](Any), so that callers can recover the concrete error
    /// type.
    fn as_any(&self) -> &dyn Any;

    /// The one-line message displayed at the top of the error.
    fn message(&self) -> String;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of source code that can be highlighted.
///
/// The kind is shared, so cloning an [`Error`] is cheap. This lets the same error be attached to
/// an expression and to the session that evaluated it.
#[derive(Debug, Clone)]
pub struct Error {
    /// The regions of the source code that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Arc<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Arc::new(kind) }
    }

    /// Returns the kind of this error as the concrete type `T`, if it is one.
    pub fn downcast_ref<T: ErrorKind + 'static>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref()
    }

    /// Returns true if the kind of this error is the concrete type `T`.
    pub fn is<T: ErrorKind + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// The one-line message of this error.
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Renders the report of this error against the given source into a string.
    ///
    /// The `ariadne` crate's [`Report`] type does not implement `Display`, so the report is
    /// written to a buffer instead.
    pub fn render(&self, src_id: &str, source: &str) -> String {
        let mut buf = Vec::new();
        match self.build_report(src_id).write((src_id, Source::from(source)), &mut buf) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.message(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use cas_attrs::ErrorKind;
    use super::*;

    #[derive(Debug, ErrorKind, PartialEq)]
    #[error(
        message = format!("`{}` is not allowed here", self.word),
        labels = ["this word"],
        help = "remove it",
    )]
    struct NotAllowed {
        word: String,
    }

    #[derive(Debug, ErrorKind, PartialEq)]
    #[error(message = "something else", labels = [""])]
    struct Other;

    fn plain(error: &Error, source: &str) -> String {
        let rendered = error.render("input", source);
        String::from_utf8(strip_ansi_escapes::strip(rendered.as_bytes())).unwrap()
    }

    #[test]
    fn message_and_display() {
        let error = Error::new(vec![0..6], NotAllowed { word: "system".to_string() });
        assert_eq!(error.message(), "`system` is not allowed here");
        assert_eq!(error.to_string(), "`system` is not allowed here");
    }

    #[test]
    fn downcast() {
        let error = Error::new(vec![0..1], Other);
        assert!(error.is::<Other>());
        assert!(!error.is::<NotAllowed>());
        assert_eq!(error.downcast_ref::<Other>(), Some(&Other));
    }

    #[test]
    fn clone_shares_kind() {
        let error = Error::new(vec![2..3], Other);
        let copy = error.clone();
        assert!(Arc::ptr_eq(&error.kind, &copy.kind));
        assert_eq!(copy.spans, vec![2..3]);
    }

    #[test]
    fn render_report() {
        let error = Error::new(vec![4..10], NotAllowed { word: "system".to_string() });
        let text = plain(&error, "1 + system(x)");
        assert!(text.contains("`system` is not allowed here"));
        assert!(text.contains("this word"));
        assert!(text.contains("remove it"));
    }
}
