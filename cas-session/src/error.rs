//! Errors reported by a [`CasSession`](crate::CasSession).
//!
//! Validation and evaluation errors are never returned as [`Err`]; they are collected into
//! [`SessionError`] records attached to the offending expression and to the session. Rendering
//! them (as plain text, an [`ariadne`] report, or anything else) is up to the caller.

use cas_attrs::ErrorKind;
use cas_error::{Error, ErrorKind};
use std::{fmt::{self, Display, Formatter}, ops::Range};

/// The engine reported an error while evaluating an expression.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the CAS reported an error while evaluating this expression: {}", self.error.trim()),
    labels = ["this expression"],
)]
pub struct CasError {
    /// The error text printed by the engine.
    pub error: String,
}

/// The engine returned no value for an expression.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "the CAS failed to return a value for this expression",
    labels = ["this expression"],
)]
pub struct FailedReturn;

/// The engine returned no results at all.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "the CAS failed to return any results; the connection may have failed or timed out",
    help = "no expression in this session was evaluated",
)]
pub struct AllFailed;

/// The broad category of a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    /// The expression failed validation and was never sent to the engine.
    Syntax,

    /// The engine reported an error for this expression.
    Evaluation,

    /// The engine did not return a value for this expression.
    MissingResult,

    /// The engine did not return anything at all.
    AllFailed,
}

/// A user-facing error attached to an expression and / or to a session.
#[derive(Debug, Clone)]
pub struct SessionError {
    /// The category of the error.
    pub kind: SessionErrorKind,

    /// The raw text of the offending expression. Empty for [`SessionErrorKind::AllFailed`].
    pub expr: String,

    /// The error itself, with spans pointing into [`SessionError::expr`].
    pub error: Error,
}

impl SessionError {
    /// Creates a syntax error for the given expression.
    pub fn syntax(expr: &str, spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self {
            kind: SessionErrorKind::Syntax,
            expr: expr.to_string(),
            error: Error::new(spans, kind),
        }
    }

    /// Creates an error for an expression the engine reported an error for.
    pub fn evaluation(expr: &str, error: &str) -> Self {
        Self {
            kind: SessionErrorKind::Evaluation,
            expr: expr.to_string(),
            error: Error::new(vec![0..expr.len()], CasError { error: error.to_string() }),
        }
    }

    /// Creates an error for an expression the engine returned no value for.
    pub fn missing_result(expr: &str) -> Self {
        Self {
            kind: SessionErrorKind::MissingResult,
            expr: expr.to_string(),
            error: Error::new(vec![0..expr.len()], FailedReturn),
        }
    }

    /// Creates the error that replaces all others when the engine returned nothing.
    pub fn all_failed() -> Self {
        Self {
            kind: SessionErrorKind::AllFailed,
            expr: String::new(),
            error: Error::new(Vec::new(), AllFailed),
        }
    }

    /// The one-line message of this error, without the offending expression.
    pub fn message(&self) -> String {
        self.error.message()
    }

    /// Build a report highlighting the offending regions of the expression.
    pub fn build_report<'a>(&self, src_id: &'a str) -> ariadne::Report<(&'a str, Range<usize>)> {
        self.error.build_report(src_id)
    }

    /// Renders the report of this error against its own expression.
    pub fn render(&self, src_id: &str) -> String {
        self.error.render(src_id, &self.expr)
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.expr.is_empty() {
            write!(f, "{}", self.message())
        } else {
            write!(f, "`{}`: {}", self.expr, self.message())
        }
    }
}

/// Joins the [`Display`] forms of the given errors with newlines.
pub fn errors_to_string(errors: &[SessionError]) -> String {
    errors.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Error returned when parsing an unknown security level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSecurityLevel {
    /// The text that could not be parsed.
    pub input: String,
}

impl Display for InvalidSecurityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "invalid security level `{}`: expected `s` (student) or `t` (teacher)", self.input)
    }
}

impl std::error::Error for InvalidSecurityLevel {}
