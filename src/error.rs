//! Error types and message formatting.
//!
//! Every failure in the pipeline — comment stripping, tokenizing, parsing,
//! decoding a numeric literal, evaluation — is reported as a `CalcDiagnostic`:
//! an error kind plus optional source location and detail text.

use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: usize,
    pub col: usize,
    /// Original source line text for display.
    pub source_line: Option<String>,
}

impl SourceLoc {
    pub fn new(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            source_line: None,
        }
    }

    pub fn with_source(mut self, text: String) -> Self {
        self.source_line = Some(text);
        self
    }
}

/// The kinds of failure the interpreter can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcError {
    /// Input ended inside a `/* ... */` block comment.
    UnterminatedComment,
    /// Input does not match the grammar.
    SyntaxError,
    /// Numeric literal is malformed (bad digit for base, leading zero, ...).
    InvalidNumber,
    /// Parser or evaluator nesting exceeded the depth limit.
    RecursionLimit,
    /// Identifier not bound in any enclosing scope.
    UndeclaredIdentifier,
    /// Operand has no capability for the requested operator or call.
    UnsupportedOperation,
    /// Value wrapper has neither a matching override nor an underlying value.
    NoUnderlyingValue,
    /// Arithmetic failure from the numeric backend (e.g. division by zero).
    Arithmetic,
}

impl CalcError {
    /// Standard message text for the error kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::UnterminatedComment => "Unterminated block comment",
            Self::SyntaxError => "Syntax error",
            Self::InvalidNumber => "Invalid numeric literal",
            Self::RecursionLimit => "Expression nesting too deep",
            Self::UndeclaredIdentifier => "Undeclared identifier",
            Self::UnsupportedOperation => "Unsupported operation",
            Self::NoUnderlyingValue => "No underlying value",
            Self::Arithmetic => "Arithmetic error",
        }
    }
}

/// An error with location and context.
#[derive(Debug, Clone)]
pub struct CalcDiagnostic {
    pub error: CalcError,
    pub location: Option<SourceLoc>,
    pub detail: Option<String>,
}

impl CalcDiagnostic {
    pub fn new(error: CalcError) -> Self {
        Self {
            error,
            location: None,
            detail: None,
        }
    }

    pub fn at(mut self, loc: SourceLoc) -> Self {
        self.location = Some(loc);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for CalcDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error.message())?;

        if let Some(ref detail) = self.detail {
            write!(f, ": {detail}")?;
        }

        if let Some(ref loc) = self.location {
            write!(f, "\n  at line {}, column {}", loc.line, loc.col)?;
            if let Some(ref source) = loc.source_line {
                write!(f, "\n  | {source}")?;
                write!(f, "\n  | {:>width$}", "^", width = loc.col)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CalcDiagnostic {}

/// Convenience alias.
pub type CalcResult<T> = Result<T, CalcDiagnostic>;
