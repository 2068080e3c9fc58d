//! [`CasString`], the expression type used by a [`CasSession`](crate::CasSession) unless the
//! caller brings their own [`ExprSlot`] implementation.

pub mod error;
pub mod token;
pub mod words;

use cas_error::Error;
use crate::{error::{SessionError, SessionErrorKind}, slot::{ExprSlot, SecurityLevel, SyntaxPolicy}};
use error::*;
use std::ops::Range;
use token::{tokenize_complete, Token, TokenKind};

/// A single expression, as typed by a student or written by a teacher.
///
/// The expression is validated lazily: either explicitly with [`CasString::validate`], or by the
/// session that owns it, under that session's [`SyntaxPolicy`]. Once validated explicitly, the
/// session's policy no longer applies.
#[derive(Debug, Clone)]
pub struct CasString {
    /// The expression as authored, without its key.
    raw: String,

    /// The normalized expression that is sent to the engine.
    canonical: String,

    /// The key of the expression. May be empty.
    key: String,

    /// The value returned by the engine.
    value: Option<String>,

    /// The display form returned by the engine.
    display: Option<String>,

    /// Syntax errors first, followed by any evaluation errors.
    errors: Vec<SessionError>,

    /// The policy this expression was last validated under, if any.
    policy: Option<SyntaxPolicy>,

    /// True if [`CasString::validate`] was called directly.
    explicit: bool,
}

impl CasString {
    /// Creates a new expression from the given text.
    ///
    /// If the text starts with `name:`, the name is used as the key of the expression and the
    /// rest of the text as the expression itself. `name:=` is a function definition and is kept
    /// intact.
    pub fn new(text: &str) -> Self {
        match split_key(text) {
            Some((key, raw)) => Self::with_key(key, raw),
            None => Self::with_key("", text),
        }
    }

    /// Creates a new expression with the given key.
    pub fn with_key(key: &str, text: &str) -> Self {
        let raw = text.trim().to_string();
        Self {
            canonical: raw.clone(),
            raw,
            key: key.to_string(),
            value: None,
            display: None,
            errors: Vec::new(),
            policy: None,
            explicit: false,
        }
    }

    /// Validates the expression under the given policy, discarding the results of any previous
    /// validation or evaluation. Returns true if the expression is valid.
    pub fn validate(&mut self, policy: SyntaxPolicy) -> bool {
        self.explicit = true;
        self.check(policy);
        self.is_valid()
    }

    /// Returns true if the expression has been validated, either explicitly or by a session.
    pub fn is_validated(&self) -> bool {
        self.policy.is_some()
    }

    /// Runs all checks against the raw text and rebuilds the canonical text.
    fn check(&mut self, policy: SyntaxPolicy) {
        self.policy = Some(policy);
        self.value = None;
        self.display = None;
        self.errors.clear();

        let raw = self.raw.as_str();
        if raw.is_empty() {
            self.errors.push(SessionError::syntax(raw, vec![0..0], EmptyExpression));
            self.canonical = String::new();
            return;
        }

        let tokens = tokenize_complete(raw);
        let mut errors = Vec::new();
        check_brackets(&tokens, &mut errors);
        check_strings(&tokens, &mut errors);
        check_chars(&tokens, policy.security, &mut errors);
        check_words(&tokens, policy.security, &mut errors);
        if policy.security == SecurityLevel::Student {
            check_assignment(&tokens, &mut errors);
        }
        let canonical = insert_stars(raw, &tokens, policy, &mut errors);

        self.canonical = canonical;
        self.errors = errors.into_iter()
            .map(|error| SessionError { kind: SessionErrorKind::Syntax, expr: raw.to_string(), error })
            .collect();
    }
}

impl ExprSlot for CasString {
    fn prepare(&mut self, policy: &SyntaxPolicy) {
        match self.policy {
            Some(current) if self.explicit || current == *policy => (),
            _ => self.check(*policy),
        }
    }

    fn clear_results(&mut self) {
        self.value = None;
        self.display = None;
        self.errors.retain(|err| err.kind == SessionErrorKind::Syntax);
    }

    fn is_valid(&self) -> bool {
        self.policy.is_some()
            && !self.errors.iter().any(|err| err.kind == SessionErrorKind::Syntax)
    }

    fn errors(&self) -> &[SessionError] {
        &self.errors
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn canonical_text(&self) -> &str {
        &self.canonical
    }

    fn raw_text(&self) -> &str {
        &self.raw
    }

    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    fn set_value(&mut self, value: String) {
        self.value = Some(value);
    }

    fn set_display(&mut self, display: String) {
        self.display = Some(display);
    }

    fn add_error(&mut self, error: SessionError) {
        self.errors.push(error);
    }

    fn matches_forbidden(&self, keywords: &[&str]) -> bool {
        tokenize_complete(&self.canonical)
            .iter()
            .filter(|token| token.kind == TokenKind::Name)
            .any(|token| keywords.iter().any(|word| token.lexeme.eq_ignore_ascii_case(word)))
    }
}

/// Syntax errors found by the checks, before they are attached to an expression.
type Errors = Vec<Error>;

/// Splits a leading `name:` off the given text.
fn split_key(text: &str) -> Option<(&str, &str)> {
    let tokens = tokenize_complete(text);
    let mut significant = tokens.iter().filter(|token| !token.kind.is_whitespace());
    let name = significant.next().filter(|token| token.kind == TokenKind::Name)?;
    let colon = significant.next().filter(|token| token.kind == TokenKind::Colon)?;
    Some((name.lexeme, &text[colon.span.end..]))
}

fn check_brackets(tokens: &[Token], errors: &mut Errors) {
    let mut open: Vec<(char, Range<usize>)> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => {
                open.push((token.lexeme.chars().next().unwrap_or('('), token.span.clone()));
            },
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                let close = token.lexeme.chars().next().unwrap_or(')');
                match open.pop() {
                    Some((bracket, _)) if closing_bracket(bracket) == close => (),
                    Some((bracket, span)) => errors.push(Error::new(
                        vec![span, token.span.clone()],
                        MismatchedBracket { open: bracket, close },
                    )),
                    None => errors.push(Error::new(
                        vec![token.span.clone()],
                        UnexpectedCloseBracket { close },
                    )),
                }
            },
            _ => (),
        }
    }

    for (bracket, span) in open {
        errors.push(Error::new(vec![span], UnclosedBracket { open: bracket }));
    }
}

fn check_strings(tokens: &[Token], errors: &mut Errors) {
    // a quote that does not start a complete string literal is lexed as a symbol
    for token in tokens.iter().filter(|token| token.kind == TokenKind::Symbol && token.lexeme.starts_with('"')) {
        let start = token.span.start;
        errors.push(Error::new(vec![start..start + 1], UnclosedString));
    }
}

fn check_chars(tokens: &[Token], security: SecurityLevel, errors: &mut Errors) {
    for token in tokens {
        let forbidden = match token.kind {
            TokenKind::Symbol => token.lexeme.chars().find(|ch| words::FORBIDDEN_CHARS.contains(ch)),
            TokenKind::Quote if security == SecurityLevel::Student => Some('\''),
            _ => None,
        };
        if let Some(ch) = forbidden {
            errors.push(Error::new(vec![token.span.clone()], ForbiddenChar { ch }));
        }
    }
}

fn check_words(tokens: &[Token], security: SecurityLevel, errors: &mut Errors) {
    for token in tokens.iter().filter(|token| token.kind == TokenKind::Name) {
        let word = token.lexeme.to_ascii_lowercase();
        let student_only = if words::GLOBAL_FORBIDDEN.contains(word.as_str()) {
            false
        } else if security == SecurityLevel::Student && words::STUDENT_FORBIDDEN.contains(word.as_str()) {
            true
        } else {
            continue;
        };
        errors.push(Error::new(
            vec![token.span.clone()],
            ForbiddenWord { word: token.lexeme.to_string(), student_only },
        ));
    }
}

fn check_assignment(tokens: &[Token], errors: &mut Errors) {
    for token in tokens.iter().filter(|token| matches!(token.kind, TokenKind::Colon | TokenKind::Define)) {
        errors.push(Error::new(vec![token.span.clone()], AssignmentNotAllowed));
    }
}

/// Returns true if the two tokens, separated by whitespace or not, form an implicit
/// multiplication.
fn is_implicit_mul(left: &Token, right: &Token, spaced: bool) -> bool {
    if !left.kind.ends_operand() || !right.kind.starts_operand() {
        return false;
    }
    if left.kind == TokenKind::Name && words::is_keyword(left.lexeme)
        || right.kind == TokenKind::Name && words::is_keyword(right.lexeme)
    {
        return false;
    }

    match (left.kind, right.kind) {
        // function call, with or without a space before the argument list
        (TokenKind::Name, TokenKind::OpenParen) => false,
        (TokenKind::String, _) | (_, TokenKind::String) => spaced,
        (l, _) if l.is_number() || l == TokenKind::CloseParen => true,
        _ => spaced,
    }
}

/// Finds implicit multiplications and either reports them or inserts the missing `*` into the
/// returned canonical text, depending on the policy.
fn insert_stars(raw: &str, tokens: &[Token], policy: SyntaxPolicy, errors: &mut Errors) -> String {
    let mut canonical = String::with_capacity(raw.len());
    let mut prev: Option<&Token> = None;
    let mut gap: Option<&Token> = None;

    for token in tokens {
        if token.kind.is_whitespace() {
            gap = Some(token);
            continue;
        }

        let implicit = prev.is_some_and(|left| is_implicit_mul(left, token, gap.is_some()));
        if implicit && policy.insert_stars {
            canonical.push('*');
        } else {
            if implicit && policy.strict {
                if let Some(left) = prev {
                    errors.push(Error::new(
                        vec![left.span.clone(), token.span.clone()],
                        MissingStar { suggestion: format!("{}*{}", left.lexeme, token.lexeme) },
                    ));
                }
            }
            if let Some(gap) = gap {
                canonical.push_str(gap.lexeme);
            }
        }

        canonical.push_str(token.lexeme);
        prev = Some(token);
        gap = None;
    }

    canonical
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn teacher() -> SyntaxPolicy {
        SyntaxPolicy { security: SecurityLevel::Teacher, ..SyntaxPolicy::default() }
    }

    fn syntax_messages(cs: &CasString) -> Vec<String> {
        cs.errors().iter().map(|err| err.message()).collect()
    }

    #[test]
    fn split_key_from_text() {
        let cs = CasString::new("ta:(x+1)^2");
        assert_eq!(cs.key(), "ta");
        assert_eq!(cs.raw_text(), "(x+1)^2");

        let cs = CasString::new("f(x):=x^2");
        assert_eq!(cs.key(), "");
        assert_eq!(cs.raw_text(), "f(x):=x^2");

        let cs = CasString::new("  1 + 1 ");
        assert_eq!(cs.key(), "");
        assert_eq!(cs.raw_text(), "1 + 1");
    }

    #[test]
    fn unvalidated_is_not_valid() {
        let cs = CasString::new("1+1");
        assert!(!cs.is_validated());
        assert!(!cs.is_valid());
    }

    #[test]
    fn valid_expression() {
        let mut cs = CasString::new("x^2+2*x+1");
        assert!(cs.validate(SyntaxPolicy::default()));
        assert_eq!(cs.canonical_text(), "x^2+2*x+1");
        assert!(cs.errors().is_empty());
    }

    #[test]
    fn empty_expression() {
        let mut cs = CasString::new("   ");
        assert!(!cs.validate(SyntaxPolicy::default()));
        assert_eq!(syntax_messages(&cs), vec!["the expression is empty"]);
    }

    #[test]
    fn brackets() {
        let mut cs = CasString::new("(x+1]*[2");
        assert!(!cs.validate(SyntaxPolicy::default()));
        assert_eq!(syntax_messages(&cs), vec![
            "mismatched brackets: `(` is closed by `]`",
            "unclosed bracket `[`",
        ]);
        assert_eq!(cs.errors()[0].error.spans, vec![0..1, 4..5]);

        let mut cs = CasString::new("x)");
        assert!(!cs.validate(SyntaxPolicy::default()));
        assert_eq!(syntax_messages(&cs), vec!["unexpected closing bracket `)`"]);
    }

    #[test]
    fn unclosed_string() {
        for text in ["x\"", "\"abc", "f(\"a\\\")"] {
            let mut cs = CasString::new(text);
            assert!(!cs.validate(teacher()), "{} should be invalid", text);
            assert!(syntax_messages(&cs).contains(&"unclosed string".to_string()));
        }

        let mut cs = CasString::new("x\"");
        cs.validate(SyntaxPolicy::default());
        assert_eq!(cs.errors()[0].error.spans, vec![1..2]);

        let mut cs = CasString::new("f(\"a\", \"b\")");
        assert!(cs.validate(SyntaxPolicy::default()));
    }

    #[test]
    fn forbidden_chars() {
        let mut cs = CasString::new("x$");
        assert!(!cs.validate(teacher()));
        assert_eq!(syntax_messages(&cs), vec!["the character `$` is not allowed"]);

        // quoting is only forbidden for students
        let mut cs = CasString::new("'diff(y,x)");
        assert!(cs.validate(teacher()));
        assert!(!cs.validate(SyntaxPolicy::default()));
    }

    #[test]
    fn forbidden_words() {
        let mut cs = CasString::new("system(\"rm\")");
        assert!(!cs.validate(teacher()));
        assert_eq!(syntax_messages(&cs), vec!["the word `system` is not allowed"]);

        let mut cs = CasString::new("diff(x^2, x)");
        assert!(cs.validate(teacher()));
        assert!(!cs.validate(SyntaxPolicy::default()));
        assert_eq!(syntax_messages(&cs), vec!["the word `diff` is not allowed"]);
    }

    #[test]
    fn student_assignment() {
        let mut cs = CasString::with_key("ans1", "x:2");
        assert!(!cs.validate(SyntaxPolicy::default()));
        assert_eq!(syntax_messages(&cs), vec!["assignment is not allowed in an answer"]);
        assert!(cs.validate(teacher()));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut cs = CasString::new("system(x$");
        assert!(!cs.validate(SyntaxPolicy::default()));
        assert_eq!(cs.errors().len(), 3);
    }

    #[test]
    fn missing_star_strict() {
        let mut cs = CasString::new("2x+3(x+1)");
        assert!(!cs.validate(SyntaxPolicy::default()));
        assert_eq!(syntax_messages(&cs), vec!["missing multiplication sign"; 2]);
        assert_eq!(cs.errors()[0].error.spans, vec![0..1, 1..2]);
    }

    #[test]
    fn insert_stars_into_canonical() {
        let policy = SyntaxPolicy { insert_stars: true, ..SyntaxPolicy::default() };
        let mut cs = CasString::new("2x+(x-1)(x+1) + a b");
        assert!(cs.validate(policy));
        assert_eq!(cs.raw_text(), "2x+(x-1)(x+1) + a b");
        assert_eq!(cs.canonical_text(), "2*x+(x-1)*(x+1) + a*b");

        let mut cs = CasString::new("1.5e-3x + 2e");
        assert!(cs.validate(policy));
        assert_eq!(cs.canonical_text(), "1.5e-3*x + 2*e");
    }

    #[test]
    fn lenient_passes_through() {
        let policy = SyntaxPolicy { strict: false, ..SyntaxPolicy::default() };
        let mut cs = CasString::new("2x");
        assert!(cs.validate(policy));
        assert_eq!(cs.canonical_text(), "2x");
    }

    #[test]
    fn not_implicit_multiplication() {
        for text in [
            "sin(x)", "sin (x)", "x and y", "if x then 1 else 2", "[1, 2]", "x - 2", "1.5e-3", "1e5+x",
        ] {
            let mut cs = CasString::new(text);
            assert!(cs.validate(teacher()), "{} should be valid", text);
            assert_eq!(cs.canonical_text(), text);
        }
    }

    #[test]
    fn prepare_uses_session_policy_unless_explicit() {
        let mut cs = CasString::new("diff(x^2,x)");
        cs.prepare(&teacher());
        assert!(cs.is_valid());
        cs.prepare(&SyntaxPolicy::default());
        assert!(!cs.is_valid());

        let mut cs = CasString::new("diff(x^2,x)");
        cs.validate(teacher());
        cs.prepare(&SyntaxPolicy::default());
        assert!(cs.is_valid());
    }

    #[test]
    fn clear_results_keeps_syntax_errors() {
        let mut cs = CasString::new("1+1");
        cs.prepare(&SyntaxPolicy::default());
        cs.set_value("2".to_string());
        cs.set_display("2".to_string());
        cs.add_error(SessionError::missing_result("1+1"));

        cs.clear_results();
        cs.prepare(&SyntaxPolicy::default());
        assert_eq!(cs.value(), None);
        assert_eq!(cs.display(), None);
        assert!(cs.errors().is_empty());
        assert!(cs.is_valid());

        let mut cs = CasString::new("2x");
        cs.prepare(&SyntaxPolicy::default());
        cs.add_error(SessionError::missing_result("2x"));
        cs.clear_results();
        assert_eq!(syntax_messages(&cs), vec!["missing multiplication sign"]);
    }

    #[test]
    fn forbidden_keywords() {
        let mut cs = CasString::new("Integrate(f, x) + y");
        cs.validate(teacher());
        assert!(cs.matches_forbidden(&["integrate"]));
        assert!(!cs.matches_forbidden(&["int", "f(x)"]));
    }
}
