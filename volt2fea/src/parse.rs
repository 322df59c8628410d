//! A cursor over a block's tokens.
//!
//! This type does not implement any grammar; it is driven by the builders in
//! the [`glyphs`], [`groups`], [`scripts`] and [`lookups`] modules.
//!
//! [`glyphs`]: crate::glyphs
//! [`groups`]: crate::groups
//! [`scripts`]: crate::scripts
//! [`lookups`]: crate::lookups

use smol_str::SmolStr;
use write_fonts::types::Tag;

use crate::{
    error::Error,
    lexer::{Kind, Token},
};

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub(crate) fn nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n)
    }

    /// The tokens not yet consumed.
    pub(crate) fn rest(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// The line of the current token, or of the last token if we're at the end.
    pub(crate) fn line(&self) -> usize {
        self.nth(0)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    pub(crate) fn bump(&mut self) -> Option<&'a Token> {
        let token = self.nth(0);
        self.pos += usize::from(token.is_some());
        token
    }

    pub(crate) fn matches(&self, n: usize, word: &str) -> bool {
        self.nth(n).map(|t| t.is_word(word)).unwrap_or(false)
    }

    pub(crate) fn matches_any(&self, words: &[&str]) -> bool {
        self.nth(0).map(|t| t.is_any_word(words)).unwrap_or(false)
    }

    pub(crate) fn eat(&mut self, word: &str) -> bool {
        if self.matches(0, word) {
            self.pos += 1;
            return true;
        }
        false
    }

    pub(crate) fn err(&self, message: impl Into<String>) -> Error {
        Error::parse(self.line(), message)
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.nth(0) {
            Some(token) => self.err(format!("expected {expected}, found '{token}'")),
            None => self.err(format!("expected {expected}, found end of block")),
        }
    }

    pub(crate) fn expect(&mut self, word: &str) -> Result<(), Error> {
        if self.eat(word) {
            return Ok(());
        }
        Err(self.unexpected(word))
    }

    /// Any keyword; returns its text.
    pub(crate) fn expect_word(&mut self, what: &str) -> Result<&'a SmolStr, Error> {
        match self.nth(0) {
            Some(token) if token.kind == Kind::Word => {
                self.pos += 1;
                Ok(&token.text)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    pub(crate) fn expect_string(&mut self, what: &str) -> Result<&'a SmolStr, Error> {
        match self.nth(0) {
            Some(token) if token.kind == Kind::String => {
                self.pos += 1;
                Ok(&token.text)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    pub(crate) fn expect_uint(&mut self, what: &str) -> Result<u32, Error> {
        match self.nth(0) {
            Some(token) if token.kind == Kind::Number => {
                let value = token
                    .text
                    .parse::<u32>()
                    .map_err(|_| self.err(format!("{what} '{}' is out of range", token.text)))?;
                self.pos += 1;
                Ok(value)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// A quoted OpenType tag, e.g. `"latn"`.
    pub(crate) fn expect_tag(&mut self) -> Result<Tag, Error> {
        let line = self.line();
        let raw = self.expect_string("a quoted tag")?;
        Tag::new_checked(raw.as_bytes())
            .map_err(|e| Error::parse(line, format!("invalid tag \"{raw}\": {e}")))
    }

    /// Require that every token has been consumed.
    pub(crate) fn expect_end(&self) -> Result<(), Error> {
        if self.at_end() {
            return Ok(());
        }
        Err(self.unexpected("end of block"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn cursor_basics() {
        let tokens = tokenize("DEF_SCRIPT NAME \"Latin\" TAG \"latn\" 12").unwrap();
        let mut parser = Parser::new(&tokens);
        parser.expect("DEF_SCRIPT").unwrap();
        assert!(parser.eat("NAME"));
        assert_eq!(parser.expect_string("name").unwrap(), "Latin");
        assert!(!parser.eat("NAME"));
        parser.expect("TAG").unwrap();
        assert_eq!(parser.expect_tag().unwrap(), Tag::new(b"latn"));
        assert_eq!(parser.expect_uint("id").unwrap(), 12);
        assert!(parser.at_end());
        parser.expect_end().unwrap();
    }

    #[test]
    fn short_tags_are_padded() {
        let tokens = tokenize("\"ROM\"").unwrap();
        assert_eq!(Parser::new(&tokens).expect_tag().unwrap(), Tag::new(b"ROM "));
    }

    #[test]
    fn bad_tag() {
        let tokens = tokenize("\"toolong\"").unwrap();
        assert!(Parser::new(&tokens).expect_tag().is_err());
    }

    #[test]
    fn negative_is_not_a_uint() {
        let tokens = tokenize("-3").unwrap();
        let err = Parser::new(&tokens).expect_uint("id").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn errors_report_expected_and_found() {
        let tokens = tokenize("ID\n\"a\"").unwrap();
        let mut parser = Parser::new(&tokens);
        parser.expect("ID").unwrap();
        let err = parser.expect_uint("glyph id").unwrap_err();
        assert_eq!(err.to_string(), "line 2: expected glyph id, found '\"a\"'");
    }
}
