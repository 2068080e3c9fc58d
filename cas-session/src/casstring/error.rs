use ariadne::Fmt;
use cas_attrs::ErrorKind;
use cas_error::{ErrorKind, EXPR};

/// The expression was empty.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "the expression is empty",
    labels = [format!("you might need to add an {} here", "expression".fg(EXPR))],
)]
pub struct EmptyExpression;

/// A closing bracket did not match the most recently opened bracket.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("mismatched brackets: `{}` is closed by `{}`", self.open, self.close),
    labels = ["this bracket is opened here...", "...but closed by this one"],
    help = format!("close it with `{}` instead", closing_bracket(self.open).fg(EXPR)),
)]
pub struct MismatchedBracket {
    /// The bracket that was opened.
    pub open: char,

    /// The bracket that was found.
    pub close: char,
}

/// A closing bracket was found with no bracket open.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unexpected closing bracket `{}`", self.close),
    labels = ["nothing was opened before this bracket"],
)]
pub struct UnexpectedCloseBracket {
    /// The bracket that was found.
    pub close: char,
}

/// A bracket was opened and never closed.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unclosed bracket `{}`", self.open),
    labels = ["this bracket is never closed"],
    help = format!("add a `{}` at the end", closing_bracket(self.open).fg(EXPR)),
)]
pub struct UnclosedBracket {
    /// The bracket that was opened.
    pub open: char,
}

/// A string literal was opened and never closed.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "unclosed string",
    labels = ["this string is never closed"],
    help = format!("add a {} at the end of the string", "\"".fg(EXPR)),
)]
pub struct UnclosedString;

/// A character that is never allowed was used.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the character `{}` is not allowed", self.ch),
    labels = ["remove this character"],
)]
pub struct ForbiddenChar {
    /// The character that was found.
    pub ch: char,
}

/// A forbidden word was used.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the word `{}` is not allowed", self.word),
    labels = ["this word"],
    help = if self.student_only {
        "this command is not available when entering an answer"
    } else {
        "this command is never available"
    },
)]
pub struct ForbiddenWord {
    /// The word that was found.
    pub word: String,

    /// Whether the word is only forbidden for students.
    pub student_only: bool,
}

/// A student attempted an assignment.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "assignment is not allowed in an answer",
    labels = ["this operator"],
    help = format!("to compare two expressions, use {} instead", "=".fg(EXPR)),
)]
pub struct AssignmentNotAllowed;

/// Two operands were written next to each other without an operator.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "missing multiplication sign",
    labels = ["this operand...", "...and this operand need an operator between them"],
    help = format!("did you mean {}?", (&self.suggestion).fg(EXPR)),
)]
pub struct MissingStar {
    /// The operands, joined with a `*`.
    pub suggestion: String,
}

/// Returns the bracket that closes the given opening bracket.
pub fn closing_bracket(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}
