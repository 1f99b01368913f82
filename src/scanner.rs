//! Streaming lexer for Lox source text.
//!
//! [`Scanner`] is a fused iterator of `Result<Token>`: a lexical error is
//! yielded in place of the offending input and scanning resumes right after
//! it, so one pass surfaces every error.  Exactly one `EOF` token closes the
//! stream.  [`scan_tokens`] drains a scanner into a vector and forwards the
//! errors to a [`Reporter`].
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! for result in Scanner::new("print 123; // comment") {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Reporter, Result};
use crate::token::{Token, TokenType};
use log::{debug, info, trace};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    src: &'a str,
    /// Byte offset where the current lexeme begins.
    start: usize,
    /// Byte offset of the next unread byte.
    curr: usize,
    line: usize,
    /// Set once `EOF` has been yielded.
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            done: false,
        }
    }

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `offset` positions ahead, or `0` past the end.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes().get(self.curr + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    /// `double` if the next byte is `=` (consuming it), otherwise `single`.
    fn with_equal(&mut self, double: TokenType, single: TokenType) -> TokenType {
        if self.peek() == b'=' {
            self.curr += 1;
            double
        } else {
            single
        }
    }

    /// Consume one lexeme.  `Ok(None)` means whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.advance() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.peek() == b'/' => {
                // Stop before the newline; the main loop counts it.
                let rest = &self.bytes()[self.curr..];
                self.curr += memchr(b'\n', rest).unwrap_or(rest.len());
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Consume the whole code point so multibyte input is
                // reported once.
                let ch: char = self.src[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.curr = self.start + ch.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        Ok(Some(kind))
    }

    /// Body of a string literal; the opening quote is already consumed.
    /// Newlines inside the literal are kept and counted.
    fn string(&mut self) -> Result<TokenType> {
        let Some(len) = memchr(b'"', &self.bytes()[self.curr..]) else {
            self.line += self.bytes()[self.curr..]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.curr = self.src.len();
            return Err(LoxError::lex(self.line, "Unterminated string."));
        };

        let contents: &str = &self.src[self.curr..self.curr + len];
        self.line += contents.matches('\n').count();
        self.curr += len + 1;

        Ok(TokenType::STRING(contents.to_owned()))
    }

    /// Digits with an optional fraction.  A trailing `.` not followed by a
    /// digit is left for the next token.
    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }

        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.curr += 1;
            while self.peek().is_ascii_digit() {
                self.curr += 1;
            }
        }

        let text: &str = &self.src[self.start..self.curr];
        // Digits and at most one interior dot always parse.
        TokenType::NUMBER(text.parse::<f64>().unwrap_or(0.0))
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        let word: &[u8] = &self.bytes()[self.start..self.curr];

        KEYWORDS
            .get(word)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    let lexeme: &str = &self.src[self.start..self.curr];
                    trace!("Scanned {:?} on line {}", lexeme, self.line);
                    return Some(Ok(Token::new(kind, lexeme, self.line)));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        debug!("Reached end of input on line {}", self.line);

        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan all of `src`, reporting lexical errors and returning the tokens that
/// were recognised.  The result always ends with `EOF`.
pub fn scan_tokens(src: &str, reporter: &mut dyn Reporter) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(src) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => reporter.report(&e),
        }
    }

    info!("Scanned {} tokens", tokens.len());

    tokens
}
