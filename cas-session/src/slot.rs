//! The contract every expression must satisfy to take part in a [`CasSession`](crate::CasSession).

use crate::error::{InvalidSecurityLevel, SessionError};
use std::{fmt::{self, Debug, Display, Formatter}, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Who authored the expressions in a session. This gates which syntactic forms are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SecurityLevel {
    /// Untrusted input typed by a student.
    #[default]
    Student,

    /// Trusted input written by a teacher.
    Teacher,
}

impl Display for SecurityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SecurityLevel::Student => write!(f, "s"),
            SecurityLevel::Teacher => write!(f, "t"),
        }
    }
}

impl FromStr for SecurityLevel {
    type Err = InvalidSecurityLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "student" => Ok(SecurityLevel::Student),
            "t" | "teacher" => Ok(SecurityLevel::Teacher),
            _ => Err(InvalidSecurityLevel { input: s.to_string() }),
        }
    }
}

/// The syntax settings a session hands to each of its expressions when it validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyntaxPolicy {
    /// Who authored the expressions.
    pub security: SecurityLevel,

    /// When true, implicit multiplication (`2x`) is an error unless stars are inserted.
    pub strict: bool,

    /// When true, missing multiplication signs are inserted instead of reported.
    pub insert_stars: bool,
}

impl Default for SyntaxPolicy {
    fn default() -> Self {
        Self {
            security: SecurityLevel::Student,
            strict: true,
            insert_stars: false,
        }
    }
}

/// One symbolic expression participating in a session.
///
/// The session only ever talks to its expressions through this trait. An expression is owned by
/// exactly one session, which mutates it in place: first while validating, then while merging
/// the engine's results back in.
pub trait ExprSlot: Debug {
    /// Called by the session at the start of every validation epoch, after
    /// [`ExprSlot::clear_results`] and before [`ExprSlot::is_valid`]. Implementations can use it
    /// to (re)validate themselves under the session's settings.
    ///
    /// The default implementation does nothing.
    fn prepare(&mut self, _policy: &SyntaxPolicy) {}

    /// Drops the value, display form and evaluation errors left over from a previous
    /// evaluation. Syntax errors are kept.
    ///
    /// The session calls this on every expression at the start of every validation epoch, so
    /// that results read after [`CasSession::add_slots`](crate::CasSession::add_slots) always
    /// come from the latest call to the engine.
    fn clear_results(&mut self);

    /// Returns true if the expression is syntactically valid on its own.
    fn is_valid(&self) -> bool;

    /// The errors accumulated by this expression so far.
    fn errors(&self) -> &[SessionError];

    /// The key used to look up this expression. May be empty.
    fn key(&self) -> &str;

    /// The normalized text that is sent to the engine.
    fn canonical_text(&self) -> &str;

    /// The text as it was authored.
    fn raw_text(&self) -> &str;

    /// The value returned by the engine, if any.
    fn value(&self) -> Option<&str>;

    /// The display form returned by the engine, if any.
    fn display(&self) -> Option<&str>;

    /// Stores the value returned by the engine.
    fn set_value(&mut self, value: String);

    /// Stores the display form returned by the engine.
    fn set_display(&mut self, display: String);

    /// Appends an error to this expression.
    fn add_error(&mut self, error: SessionError);

    /// Returns true if the expression uses any of the given words.
    fn matches_forbidden(&self, keywords: &[&str]) -> bool;

    /// Returns true if this expression has accumulated any errors.
    fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }
}
