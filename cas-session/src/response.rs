//! Unpacks the engine's printed output back into [`CasResults`].
//!
//! The script printed by [`build_script`](crate::command::build_script) produces output of the
//! form:
//!
//! ```text
//! [TimeStamp= [ 42 ], Locals= [ 0=[ error= [], key = a, value = 2, display = 2 ], 1=[ ... ] ] ]
//! ```
//!
//! Each fragment is a position, followed by a bracketed list of `name = value` fields. Fields are
//! split on commas that are not nested in brackets or strings, so values like `[1, 2]` survive
//! intact. Fragments that cannot be parsed are skipped; the session reports them as missing.

use crate::connector::{CasResult, CasResults};
use logos::Logos;
use std::ops::Range;
use tracing::{trace, warn};

/// The marker that precedes the list of fragments.
const LOCALS: &str = "Locals=";

/// The tokens of the engine's output.
#[derive(Logos, Clone, Copy, Debug, PartialEq)]
enum TokenKind {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"[\[({]")]
    Open,

    #[regex(r"[\])}]")]
    Close,

    #[token(",")]
    Comma,

    #[token("=")]
    Equals,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r#"[^\[\](){},=" \t\r\n]+"#)]
    Text,

    #[regex(r".", priority = 0)]
    Symbol,
}

/// A significant token: its kind, and where it is in the input.
type Token = (TokenKind, Range<usize>);

/// Unpacks the printed output of a script into the results of each expression.
///
/// Returns an empty map if the output does not contain a list of results at all.
pub fn unpack(raw: &str) -> CasResults {
    let mut results = CasResults::new();
    let Some(start) = raw.find(LOCALS) else {
        warn!("engine output has no `{}` section", LOCALS);
        return results;
    };

    let offset = start + LOCALS.len();
    let mut tokens = TokenKind::lexer(&raw[offset..])
        .spanned()
        .map(|(kind, span)| (kind.unwrap_or(TokenKind::Symbol), span.start + offset..span.end + offset))
        .filter(|(kind, _)| *kind != TokenKind::Whitespace)
        .collect::<Vec<_>>();
    flatten_errors(raw, &mut tokens);

    if tokens.first().map(|(kind, _)| *kind) != Some(TokenKind::Open) {
        warn!("engine output has an empty `{}` section", LOCALS);
        return results;
    }

    let mut cursor = 1;
    while let Some((kind, span)) = tokens.get(cursor) {
        match kind {
            TokenKind::Comma => cursor += 1,
            TokenKind::Close => break,
            TokenKind::Text if matches!(tokens.get(cursor + 1), Some((TokenKind::Equals, _)))
                && matches!(tokens.get(cursor + 2), Some((TokenKind::Open, _))) =>
            {
                let Some(end) = matching_close(&tokens, cursor + 2) else {
                    warn!("engine output was cut off inside the result at position {}", &raw[span.clone()]);
                    break;
                };

                let index = &raw[span.clone()];
                if index.bytes().all(|b| b.is_ascii_digit()) {
                    let result = unpack_fields(raw, &tokens[cursor + 3..end]);
                    trace!(index, ?result, "unpacked result");
                    results.insert(index.to_string(), result);
                } else {
                    warn!("skipping result with non-numeric position `{}`", index);
                }
                cursor = end + 1;
            },
            _ => {
                trace!("skipping unexpected output `{}`", &raw[span.clone()]);
                cursor += 1;
            },
        }
    }

    results
}

/// Turns everything inside each `error= [...]` section into text. Error messages are free text,
/// so their brackets and commas need not be balanced.
///
/// A section ends at the first `]` that is followed by either another `]` or a `, name =` field
/// of the result. A section that never ends is left alone; the fragment is then cut off anyway.
fn flatten_errors(raw: &str, tokens: &mut [Token]) {
    let mut i = 0;
    while i + 2 < tokens.len() {
        let starts_error = tokens[i].0 == TokenKind::Text
            && &raw[tokens[i].1.clone()] == "error"
            && tokens[i + 1].0 == TokenKind::Equals
            && tokens[i + 2].0 == TokenKind::Open;
        if !starts_error {
            i += 1;
            continue;
        }

        let start = i + 3;
        let Some(end) = (start..tokens.len()).find(|&j| ends_error(raw, tokens, j)) else {
            break;
        };
        for token in &mut tokens[start..end] {
            token.0 = TokenKind::Text;
        }
        i = end + 1;
    }
}

/// Returns true if the token at `j` closes an error section.
fn ends_error(raw: &str, tokens: &[Token], j: usize) -> bool {
    let is_square_close = |j: usize| {
        tokens.get(j).is_some_and(|(kind, span)| *kind == TokenKind::Close && &raw[span.clone()] == "]")
    };
    if !is_square_close(j) {
        return false;
    }

    match (tokens.get(j + 1), tokens.get(j + 2), tokens.get(j + 3)) {
        (None, _, _) => true,
        (Some((TokenKind::Comma, _)), Some((TokenKind::Text, name)), Some((TokenKind::Equals, _))) => {
            matches!(&raw[name.clone()], "key" | "value" | "display")
        },
        _ => is_square_close(j + 1),
    }
}

/// Returns the index of the token that closes the bracket opened at `open`.
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, (kind, _)) in tokens.iter().enumerate().skip(open) {
        match kind {
            TokenKind::Open => depth += 1,
            TokenKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            },
            _ => (),
        }
    }
    None
}

/// Splits the given tokens into comma-separated fields at bracket depth zero.
fn split_fields(tokens: &[Token]) -> Vec<&[Token]> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, (kind, _)) in tokens.iter().enumerate() {
        match kind {
            TokenKind::Open => depth += 1,
            TokenKind::Close => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                fields.push(&tokens[start..i]);
                start = i + 1;
            },
            _ => (),
        }
    }
    fields.push(&tokens[start..]);
    fields
}

/// Builds a result from the fields of one fragment.
fn unpack_fields(raw: &str, tokens: &[Token]) -> CasResult {
    let mut result = CasResult::default();

    for field in split_fields(tokens) {
        let Some(eq) = field.iter().position(|(kind, _)| *kind == TokenKind::Equals) else {
            continue;
        };
        let (Some((_, first)), Some((_, last))) = (field.first(), field.last()) else {
            continue;
        };

        let name = raw[first.start..field[eq].1.start].trim();
        let value = raw[field[eq].1.end..last.end].trim();
        match name {
            "error" => result.error = strip_brackets(value).to_string(),
            "value" => result.value = Some(value.to_string()),
            "display" => result.display = Some(value.to_string()),
            _ => (),
        }
    }

    result
}

/// Strips one pair of enclosing square brackets, if present.
fn strip_brackets(value: &str) -> &str {
    value.strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(value)
        .trim()
}
