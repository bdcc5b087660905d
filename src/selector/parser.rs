//! Recursive descent selector parser.
//!
//! Parses selector text into a [`SelectorList`]. Uses the logos-based
//! tokenizer from [`crate::selector::tokenizer`].

use super::model::*;
use super::tokenizer::{tokenize, Spanned, Token};
use crate::error::{Error, Result};

/// Parse a comma-separated selector list.
pub fn parse_selector_list(input: &str) -> Result<SelectorList> {
    let tokens = tokenize(input).map_err(|offset| Error::InvalidSelector {
        position: offset,
        message: format!("unexpected character in {input:?}"),
    })?;
    let mut parser = Parser { tokens, cursor: 0 };

    let mut selectors = vec![parser.parse_selector()?];
    while parser.peek().is_some_and(|t| t.token == Token::Comma) {
        parser.advance();
        selectors.push(parser.parse_selector()?);
    }
    if let Some(t) = parser.peek() {
        return Err(Error::InvalidSelector {
            position: t.pos,
            message: format!("unexpected {:?} '{}'", t.token, t.text),
        });
    }
    Ok(SelectorList { selectors })
}

/// Recursive descent parser state.
struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn current_pos(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.tokens.len())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::InvalidSelector {
            position: self.current_pos(),
            message: message.into(),
        }
    }

    /// Returns `true` if the current token is immediately adjacent (no whitespace)
    /// to the previous token.
    fn is_adjacent(&self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = &self.tokens[self.cursor - 1];
        self.peek().is_some_and(|curr| curr.start == prev.end)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<Spanned> {
        match self.advance() {
            Some(tok) if tok.token == expected => Ok(tok),
            Some(tok) => Err(Error::InvalidSelector {
                position: tok.pos,
                message: format!("expected {what}, got {:?} '{}'", tok.token, tok.text),
            }),
            None => Err(self.error(format!("expected {what}, found end of input"))),
        }
    }

    /// Parse compound selectors joined by combinators.
    fn parse_selector(&mut self) -> Result<Selector> {
        let mut parts = vec![SelectorPart::Compound(self.parse_compound_selector()?)];

        loop {
            match self.peek().map(|t| &t.token) {
                Some(Token::GreaterThan) => {
                    self.advance();
                    parts.push(SelectorPart::Combinator(Combinator::Child));
                    parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
                }
                // A selector-starting token that was not absorbed by the
                // previous compound is separated by whitespace.
                Some(
                    Token::Ident
                    | Token::Hash
                    | Token::Dot
                    | Token::Star
                    | Token::BracketOpen,
                ) => {
                    parts.push(SelectorPart::Combinator(Combinator::Descendant));
                    parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
                }
                _ => break,
            }
        }

        Ok(Selector { parts })
    }

    /// Parse simple selectors with no whitespace between them, e.g.
    /// `ojs-todo[uid="2"].done`.
    fn parse_compound_selector(&mut self) -> Result<CompoundSelector> {
        let mut compound = CompoundSelector::new();

        match self.peek().map(|t| &t.token) {
            Some(Token::Ident) => {
                let name = self.advance().map(|t| t.text).unwrap_or_default();
                compound.push(SelectorComponent::Type(name));
            }
            Some(Token::Star) => {
                self.advance();
                compound.push(SelectorComponent::Universal);
            }
            Some(Token::Dot | Token::Hash | Token::BracketOpen) => {
                compound.push(self.parse_qualifier()?);
            }
            _ => return Err(self.error("expected selector part")),
        }

        while self.is_adjacent()
            && matches!(
                self.peek().map(|t| &t.token),
                Some(Token::Dot | Token::Hash | Token::BracketOpen)
            )
        {
            compound.push(self.parse_qualifier()?);
        }

        Ok(compound)
    }

    /// Parse `.class`, `#id` or `[attr]` / `[attr=value]`.
    fn parse_qualifier(&mut self) -> Result<SelectorComponent> {
        let Some(tok) = self.advance() else {
            return Err(self.error("expected selector part"));
        };
        match tok.token {
            Token::Dot => {
                let name = self.expect(Token::Ident, "class name")?;
                Ok(SelectorComponent::Class(name.text))
            }
            Token::Hash => {
                let name = self.expect(Token::Ident, "id")?;
                Ok(SelectorComponent::Id(name.text))
            }
            Token::BracketOpen => {
                let name = self.expect(Token::Ident, "attribute name")?.text;
                let value = if self.peek().is_some_and(|t| t.token == Token::Equals) {
                    self.advance();
                    Some(self.parse_attribute_value()?)
                } else {
                    None
                };
                self.expect(Token::BracketClose, "']'")?;
                Ok(SelectorComponent::Attribute { name, value })
            }
            other => Err(Error::InvalidSelector {
                position: tok.pos,
                message: format!("unexpected {other:?} '{}'", tok.text),
            }),
        }
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        match self.advance() {
            Some(tok) => match tok.token {
                Token::StringLiteral | Token::StringLiteralSingle => {
                    Ok(tok.text[1..tok.text.len() - 1].to_string())
                }
                Token::Ident | Token::Number => Ok(tok.text),
                other => Err(Error::InvalidSelector {
                    position: tok.pos,
                    message: format!("expected attribute value, got {other:?}"),
                }),
            },
            None => Err(self.error("expected attribute value, found end of input")),
        }
    }
}
