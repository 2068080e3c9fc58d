use logos::{Lexer, Logos};
use std::ops::Range;

/// The different kinds of tokens that can be produced by the tokenizer.
#[derive(Logos, Clone, Copy, Debug, PartialEq)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"[a-zA-Z_%][a-zA-Z0-9_%]*")]
    Name,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[0-9]+\.[0-9]+")]
    #[regex(r"[0-9]+(\.[0-9]+)?[eE][+-]?[0-9]+")]
    Float,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(":=")]
    Define,

    #[token("'")]
    Quote,

    #[regex(r"[+\-*/^=<>#!.~|&]")]
    Op,

    #[regex(r".", priority = 0)]
    Symbol,
}

impl TokenKind {
    /// Returns true if the token represents whitespace.
    pub fn is_whitespace(self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }

    /// Returns true if the token is a number literal.
    pub fn is_number(self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float)
    }

    /// Returns true if an operand can end with this token.
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Name | TokenKind::Int | TokenKind::Float | TokenKind::String | TokenKind::CloseParen
        )
    }

    /// Returns true if an operand can start with this token.
    pub fn starts_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Name | TokenKind::Int | TokenKind::Float | TokenKind::String | TokenKind::OpenParen
        )
    }
}

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'source> {
    /// The region of the source code that this token originated from.
    pub span: Range<usize>,

    /// The kind of token.
    pub kind: TokenKind,

    /// The raw lexeme that was parsed into this token.
    pub lexeme: &'source str,
}

/// Returns an iterator over the token kinds produced by the tokenizer.
pub fn tokenize(input: &str) -> Lexer<TokenKind> {
    TokenKind::lexer(input)
}

/// Returns an owned array containing all of the tokens produced by the tokenizer. Input the
/// tokenizer cannot match is kept as [`TokenKind::Symbol`] tokens, so the spans of the returned
/// tokens always cover the whole input.
pub fn tokenize_complete(input: &str) -> Box<[Token]> {
    let mut lexer = tokenize(input);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        tokens.push(Token {
            span: lexer.span(),
            kind: kind.unwrap_or(TokenKind::Symbol),
            lexeme: lexer.slice(),
        });
    }

    tokens.into_boxed_slice()
}
