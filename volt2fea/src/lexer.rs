//! Scan VOLT source, producing a sequence of tokens.
//!
//! VOLT has a very small lexical grammar: upper-case keywords, quoted strings
//! (with no escapes) and integers, all separated by whitespace. We do not try
//! to assign any meaning to keywords here; a keyword is just a [`Kind::Word`]
//! whose text is checked by the parser.

use smol_str::SmolStr;

use crate::error::Error;

const EOF: u8 = 0x0;

/// The atomic unit of the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub(crate) len: usize,
    pub(crate) kind: Kind,
}

/// Kinds of tokens assigned during lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Eof,
    /// A keyword, or any other run of non-whitespace.
    Word,
    String,
    StringUnterminated, // an error reported by `tokenize`
    Number,
    Whitespace,
}

/// A non-trivia token, with its text and the line it starts on.
///
/// For strings, `text` is the contents without the surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: Kind,
    pub(crate) text: SmolStr,
    pub(crate) line: usize,
}

impl Token {
    pub(crate) fn is_word(&self, word: &str) -> bool {
        self.kind == Kind::Word && self.text == word
    }

    pub(crate) fn is_any_word(&self, words: &[&str]) -> bool {
        self.kind == Kind::Word && words.contains(&self.text.as_str())
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Kind::String | Kind::StringUnterminated => write!(f, "\"{}\"", self.text),
            _ => f.write_str(&self.text),
        }
    }
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn nth(&self, index: usize) -> u8 {
        self.input
            .as_bytes()
            .get(self.pos + index)
            .copied()
            .unwrap_or(EOF)
    }

    fn bump(&mut self) -> Option<u8> {
        let pos = self.pos;
        let next = self.input.as_bytes().get(pos).copied();
        self.pos += usize::from(next.is_some());
        next
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn next_token(&mut self) -> Lexeme {
        let start_pos = self.pos;
        let kind = match self.bump() {
            None => Kind::Eof,
            Some(byte) if is_whitespace(byte) => self.whitespace(),
            Some(b'"') => self.string(),
            Some(_) => self.word(start_pos),
        };

        let len = self.pos - start_pos;
        Lexeme { len, kind }
    }

    fn whitespace(&mut self) -> Kind {
        while !self.at_eof() && is_whitespace(self.nth(0)) {
            self.bump();
        }
        Kind::Whitespace
    }

    fn string(&mut self) -> Kind {
        loop {
            match self.bump() {
                Some(b'"') => break Kind::String,
                None => break Kind::StringUnterminated,
                Some(_) => (),
            }
        }
    }

    fn word(&mut self, start_pos: usize) -> Kind {
        while !self.at_eof() && !is_whitespace(self.nth(0)) && self.nth(0) != b'"' {
            self.bump();
        }
        let raw = &self.input.as_bytes()[start_pos..self.pos];
        if is_integer(raw) {
            Kind::Number
        } else {
            Kind::Word
        }
    }
}

/// Tokenize VOLT source, dropping whitespace.
///
/// The input is expected to already have its line endings normalized.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    loop {
        let Lexeme { len, kind } = lexer.next_token();
        let raw = &text[pos..pos + len];
        match kind {
            Kind::Eof => break,
            Kind::Whitespace => (),
            Kind::StringUnterminated => {
                return Err(Error::parse(line, "unterminated string"));
            }
            Kind::String => tokens.push(Token {
                kind,
                text: raw[1..raw.len() - 1].into(),
                line,
            }),
            Kind::Word | Kind::Number => tokens.push(Token {
                kind,
                text: raw.into(),
                line,
            }),
        }
        line += raw.bytes().filter(|b| *b == b'\n').count();
        pos += len;
    }
    Ok(tokens)
}

// tables sometimes carry trailing NUL padding, treat it like whitespace
fn is_whitespace(byte: u8) -> bool {
    byte == b' ' || byte == EOF || (0x9..=0xD).contains(&byte)
}

fn is_integer(raw: &[u8]) -> bool {
    let digits = raw.strip_prefix(b"-").unwrap_or(raw);
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}
