// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hand-written scanner for the S-ONNX surface syntax.
//!
//! The scanner is a single forward pass over the character stream with
//! 1-based line/column tracking. Any malformed input aborts the whole
//! pipeline with a [`LexError`]; there is no token-level recovery.
//!
//! Word-shaped input is disambiguated after the maximal run is taken:
//! a trailing `#` marks a bytes literal, an all-digit run (optionally
//! `L`/`l` suffixed) is an integer, and everything else must be a
//! keyword.

use crate::error::LexError;
use crate::literal;
use crate::token::{Keyword, Pos, Token, TokenKind};

struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            src: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn here(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_ahead(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `//` line comments.
    fn strip(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_ahead() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.strip();
            let start = self.here();
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, start));
                return Ok(tokens);
            };
            let kind = match c {
                '{' => self.punct(TokenKind::LBrace),
                '}' => self.punct(TokenKind::RBrace),
                '[' => self.punct(TokenKind::LBracket),
                ']' => self.punct(TokenKind::RBracket),
                ':' => self.punct(TokenKind::Colon),
                ',' => self.punct(TokenKind::Comma),
                '"' => self.string(start)?,
                c if c.is_ascii_alphanumeric() || c == '_' => self.word(start)?,
                other => {
                    return Err(LexError::new(
                        start,
                        format!("unexpected character '{other}'"),
                    ));
                }
            };
            tokens.push(Token::new(kind, start));
        }
    }

    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    /// Scans a quoted string, raw escapes included, then resolves the
    /// escapes in one go. A newline or end of input before the closing
    /// quote is fatal.
    fn string(&mut self, start: Pos) -> Result<TokenKind, LexError> {
        self.bump(); // opening quote
        let mut body = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(LexError::new(start, "unterminated string literal"));
                }
                Some('"') => break,
                Some('\\') => {
                    body.push('\\');
                    match self.bump() {
                        None | Some('\n') => {
                            return Err(LexError::new(start, "unterminated string literal"));
                        }
                        Some(escaped) => body.push(escaped),
                    }
                }
                Some(c) => body.push(c),
            }
        }
        Ok(TokenKind::Str(literal::unescape_string(&body)))
    }

    fn word(&mut self, start: Pos) -> Result<TokenKind, LexError> {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }

        // Bytes literal: hex digit run closed by the marker character.
        if self.peek() == Some('#') {
            self.bump();
            let payload = literal::decode_bytes(&word)
                .map_err(|e| LexError::new(start, e.to_string()))?;
            return Ok(TokenKind::Bytes(payload));
        }

        if is_integer_text(&word) {
            return Ok(TokenKind::Integer(word));
        }

        match Keyword::from_word(&word) {
            Some(kw) => Ok(TokenKind::Keyword(kw)),
            None => Err(LexError::new(start, format!("unknown keyword '{word}'"))),
        }
    }
}

fn is_integer_text(word: &str) -> bool {
    // A bare suffix ("L") is not an integer.
    let digits = word.strip_suffix(['L', 'l']).unwrap_or(word);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Tokenizes a whole source text. The result always ends with an
/// [`TokenKind::Eof`] token carrying the final position.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).all()
}
