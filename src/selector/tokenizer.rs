//! logos-based selector tokenizer.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `ojs-counter` is one [`Token::Ident`])
//! 2. For equal length matches, earlier-defined variants win
//!
//! Whitespace is skipped; the parser recovers descendant combinators from
//! the byte spans.

use logos::Logos;

/// Selector token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    /// Double-quoted string literal.
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Identifier: tag names, classes, ids, attribute names.
    #[regex(r"-?[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    /// Unquoted attribute value starting with a digit, e.g. `[uid=12]`.
    #[regex(r"[0-9][a-zA-Z0-9_-]*")]
    Number,

    // ── Single-character punctuation ─────────────────────────────────

    /// `,`
    #[token(",")]
    Comma,

    /// `.`
    #[token(".")]
    Dot,

    /// `#`
    #[token("#")]
    Hash,

    /// `*`
    #[token("*")]
    Star,

    /// `>`
    #[token(">")]
    GreaterThan,

    /// `[`
    #[token("[")]
    BracketOpen,

    /// `]`
    #[token("]")]
    BracketClose,

    /// `=`
    #[token("=")]
    Equals,
}

/// A token with its source text and byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    /// Index in the token stream (for error reporting).
    pub pos: usize,
    pub start: usize,
    pub end: usize,
}

/// Tokenize a selector string.
///
/// Returns the byte offset of the first unrecognized character as the error.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, usize> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        let token = result.map_err(|_| span.start)?;
        tokens.push(Spanned {
            token,
            text: input[span.clone()].to_string(),
            pos: tokens.len(),
            start: span.start,
            end: span.end,
        });
    }
    Ok(tokens)
}
