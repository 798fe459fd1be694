//! Comment stripping — the first pass over raw source text.
//!
//! Removes `//` line comments and nested `/* ... */` block comments before
//! the lexer runs. String literals are scanned so their contents (including
//! comment markers and escaped quotes) pass through untouched.

use crate::error::{CalcDiagnostic, CalcError, CalcResult, SourceLoc};

/// Strip comments from `source`, returning the cleaned text.
///
/// Block comments nest; input ending while a block comment is still open is
/// an error located at the outermost `/*`. Line comments run to the end of
/// the line; the newline itself is kept.
pub fn strip(source: &str) -> CalcResult<String> {
    Stripper::new(source).run()
}

struct Stripper {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    lines: Vec<String>,
    out: String,
}

impl Stripper {
    fn new(source: &str) -> Self {
        let lines: Vec<String> = source.lines().map(String::from).collect();
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            lines,
            out: String::with_capacity(source.len()),
        }
    }

    fn run(mut self) -> CalcResult<String> {
        while let Some(ch) = self.peek() {
            match ch {
                '/' if self.peek_ahead(1) == Some('*') => self.skip_block_comment()?,
                '/' if self.peek_ahead(1) == Some('/') => self.skip_line_comment(),
                '\'' | '"' => self.copy_string(ch),
                _ => self.copy_char(),
            }
        }
        Ok(self.out)
    }

    fn loc(&self) -> SourceLoc {
        let mut loc = SourceLoc::new(self.line, self.col);
        if self.line > 0 && self.line <= self.lines.len() {
            loc = loc.with_source(self.lines[self.line - 1].clone());
        }
        loc
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

    fn copy_char(&mut self) {
        if let Some(ch) = self.advance() {
            self.out.push(ch);
        }
    }

    /// Consume a nested block comment, emitting nothing.
    fn skip_block_comment(&mut self) -> CalcResult<()> {
        let open_loc = self.loc();
        self.advance(); // /
        self.advance(); // *
        let mut depth = 1u32;
        while depth > 0 {
            if self.pos >= self.source.len() {
                return Err(CalcDiagnostic::new(CalcError::UnterminatedComment).at(open_loc));
            }
            if self.peek() == Some('/') && self.peek_ahead(1) == Some('*') {
                self.advance();
                self.advance();
                depth += 1;
            } else if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                depth -= 1;
            } else {
                self.advance();
            }
        }
        Ok(())
    }

    /// Consume a `//` comment up to (not including) the newline.
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Copy a string literal through verbatim. A backslash copies the next
    /// character as well, so an escaped quote does not end the string early.
    fn copy_string(&mut self, quote: char) {
        self.copy_char(); // opening quote
        while let Some(ch) = self.peek() {
            self.copy_char();
            if ch == '\\' {
                if self.peek().is_some() {
                    self.copy_char();
                }
            } else if ch == quote {
                return;
            }
        }
        // An unterminated string is left for the lexer to report.
    }
}
