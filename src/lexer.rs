//! Lexer — turns comment-stripped text into a stream of tokens.
//!
//! Runs after `preprocess::strip`, so comments are already gone. Numeric
//! literals are kept as raw text and decoded later (`number::decode`); the
//! lexer only has to find where they end. String escapes are decoded here.

use crate::error::{CalcDiagnostic, CalcError, CalcResult, SourceLoc};

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(String),
    Str(String),
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    SlashComma, // /,
    Percent,
    Power,     // **
    At,        // @
    PipeArrow, // |>
    Assign,    // =

    // Delimiters
    LeftParen,
    RightParen,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLoc,
}

impl Token {
    pub fn new(kind: TokenKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    lines: Vec<String>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let lines: Vec<String> = source.lines().map(String::from).collect();
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            lines,
        }
    }

    pub fn tokenize(&mut self) -> CalcResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.loc()));
                break;
            }
            tokens.push(self.next_token()?);
        }
        Ok(tokens)
    }

    fn loc(&self) -> SourceLoc {
        let mut loc = SourceLoc::new(self.line, self.col);
        if self.line > 0 && self.line <= self.lines.len() {
            loc = loc.with_source(self.lines[self.line - 1].clone());
        }
        loc
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.source.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> CalcResult<Token> {
        let loc = self.loc();
        let ch = self.peek().expect("next_token called at end of input");

        match ch {
            '\'' | '"' => self.lex_string(ch),

            '0'..='9' => Ok(self.lex_number()),

            // A dot starts a fractional literal like `.5`.
            '.' if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => Ok(self.lex_number()),

            'a'..='z' | 'A'..='Z' | '_' => Ok(self.lex_ident()),

            '+' => {
                self.advance();
                Ok(Token::new(TokenKind::Plus, loc))
            }
            '-' => {
                self.advance();
                Ok(Token::new(TokenKind::Minus, loc))
            }
            '*' => {
                self.advance();
                if self.peek() == Some('*') {
                    self.advance();
                    Ok(Token::new(TokenKind::Power, loc))
                } else {
                    Ok(Token::new(TokenKind::Star, loc))
                }
            }
            '/' => {
                self.advance();
                if self.peek() == Some(',') {
                    self.advance();
                    Ok(Token::new(TokenKind::SlashComma, loc))
                } else {
                    Ok(Token::new(TokenKind::Slash, loc))
                }
            }
            '%' => {
                self.advance();
                Ok(Token::new(TokenKind::Percent, loc))
            }
            '@' => {
                self.advance();
                Ok(Token::new(TokenKind::At, loc))
            }
            '|' => {
                self.advance();
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token::new(TokenKind::PipeArrow, loc))
                } else {
                    Err(CalcDiagnostic::new(CalcError::SyntaxError)
                        .at(loc)
                        .with_detail("'|' must be followed by '>'"))
                }
            }
            '=' => {
                self.advance();
                Ok(Token::new(TokenKind::Assign, loc))
            }
            '(' => {
                self.advance();
                Ok(Token::new(TokenKind::LeftParen, loc))
            }
            ')' => {
                self.advance();
                Ok(Token::new(TokenKind::RightParen, loc))
            }
            _ => Err(CalcDiagnostic::new(CalcError::SyntaxError)
                .at(loc)
                .with_detail(format!("unexpected character '{ch}'"))),
        }
    }

    fn lex_string(&mut self, quote: char) -> CalcResult<Token> {
        let loc = self.loc();
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            if self.at_end() {
                return Err(CalcDiagnostic::new(CalcError::SyntaxError)
                    .at(loc)
                    .with_detail("unterminated string literal"));
            }
            let ch = self.advance().expect("checked not at end");
            if ch == quote {
                break;
            }
            if ch == '\\' {
                let Some(escaped) = self.advance() else {
                    return Err(CalcDiagnostic::new(CalcError::SyntaxError)
                        .at(loc)
                        .with_detail("unterminated string literal"));
                };
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    // Unknown escapes keep both characters.
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                value.push(ch);
            }
        }

        Ok(Token::new(TokenKind::Str(value), loc))
    }

    /// Scan the extent of a numeric literal. Base markers (`b`, `o`, `x`),
    /// hex digits and the imaginary suffix `j` are all alphanumeric, so the
    /// literal is the maximal run of alphanumerics and dots; `number::decode`
    /// validates the content.
    fn lex_number(&mut self) -> Token {
        let loc = self.loc();
        let mut raw = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '.' {
                raw.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number(raw), loc)
    }

    fn lex_ident(&mut self) -> Token {
        let loc = self.loc();
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Ident(name), loc)
    }
}
