//! Recursive descent parser — tokens to a parse tree.
//!
//! One function per precedence level, lowest binding first:
//!
//!   1. assignment    (target = target = ... = expr)
//!   2. sum           (+ -)            left-folded chain
//!   3. product       (* / /, %)       left-folded chain
//!   4. call chain    (@ |>)           right-folded chain
//!   5. power         (**)             right-folded chain
//!   6. postfix call  (f(x))
//!   7. primary       (literals, identifiers, parens)
//!
//! The expression rule and the parenthesized-operand rule are mutually
//! recursive through ordinary function calls; an explicit depth counter
//! bounds that recursion so pathological nesting is reported as a
//! diagnostic instead of overflowing the stack.

use crate::ast::{CallStyle, Expr, ProductOp, SumOp};
use crate::error::{CalcDiagnostic, CalcError, CalcResult, SourceLoc};
use crate::lexer::{Token, TokenKind};

/// Maximum expression nesting depth before parsing gives up.
const MAX_PARSE_DEPTH: usize = 200;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream as a single expression.
    pub fn parse(&mut self) -> CalcResult<Expr> {
        let expr = self.parse_expression()?;
        if !self.at_end() {
            return Err(CalcDiagnostic::new(CalcError::SyntaxError)
                .at(self.loc())
                .with_detail(format!(
                    "unexpected {} after expression",
                    describe(self.peek_kind())
                )));
        }
        Ok(expr)
    }

    // ── helpers ──────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    /// Peek ahead by `n` tokens (0 = current).
    fn peek_at(&self, n: usize) -> &TokenKind {
        let idx = self.pos + n;
        if idx < self.tokens.len() {
            &self.tokens[idx].kind
        } else {
            &TokenKind::Eof
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos];
        if !self.at_end() {
            self.pos += 1;
        }
        tok
    }

    fn loc(&self) -> SourceLoc {
        self.peek().loc.clone()
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> CalcResult<()> {
        if self.peek_kind() == kind {
            self.advance();
            Ok(())
        } else {
            Err(CalcDiagnostic::new(CalcError::SyntaxError)
                .at(self.loc())
                .with_detail(format!(
                    "expected {what}, found {}",
                    describe(self.peek_kind())
                )))
        }
    }

    fn enter(&mut self) -> CalcResult<()> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(CalcDiagnostic::new(CalcError::RecursionLimit)
                .at(self.loc())
                .with_detail(
                    "hint: check for unbalanced or very deeply nested parentheses",
                ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ── expression levels ───────────────────────────────────────────

    fn parse_expression(&mut self) -> CalcResult<Expr> {
        self.enter()?;
        let result = if self.at_assignment() {
            self.parse_assignment()
        } else {
            self.parse_sum()
        };
        self.leave();
        result
    }

    /// Assignment lookahead: `name =` or `( name ) =`.
    fn at_assignment(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Ident(_) => matches!(self.peek_at(1), TokenKind::Assign),
            TokenKind::LeftParen => {
                matches!(self.peek_at(1), TokenKind::Ident(_))
                    && matches!(self.peek_at(2), TokenKind::RightParen)
                    && matches!(self.peek_at(3), TokenKind::Assign)
            }
            _ => false,
        }
    }

    fn parse_assignment(&mut self) -> CalcResult<Expr> {
        let mut targets = Vec::new();
        while self.at_assignment() {
            let name = match self.peek_kind().clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    name
                }
                TokenKind::LeftParen => {
                    self.advance(); // (
                    let TokenKind::Ident(name) = self.peek_kind().clone() else {
                        unreachable!("at_assignment checked the paren form");
                    };
                    self.advance(); // name
                    self.advance(); // )
                    name
                }
                _ => unreachable!("at_assignment checked the target form"),
            };
            targets.push(name);
            self.advance(); // =
        }
        let value = self.parse_sum()?;
        Ok(Expr::Assignment {
            targets,
            value: Box::new(value),
        })
    }

    fn parse_sum(&mut self) -> CalcResult<Expr> {
        let first = self.parse_product()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => SumOp::Add,
                TokenKind::Minus => SumOp::Sub,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_product()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Sum {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_product(&mut self) -> CalcResult<Expr> {
        let first = self.parse_call_chain()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => ProductOp::Mul,
                TokenKind::Slash => ProductOp::Div,
                TokenKind::SlashComma => ProductOp::FloorDiv,
                TokenKind::Percent => ProductOp::Rem,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_call_chain()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Product {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_call_chain(&mut self) -> CalcResult<Expr> {
        let first = self.parse_power()?;
        let mut style = None;
        let mut operands = vec![first];
        loop {
            let this = match self.peek_kind() {
                TokenKind::At => CallStyle::At,
                TokenKind::PipeArrow => CallStyle::Pipe,
                _ => break,
            };
            match style {
                None => style = Some(this),
                Some(prev) if prev != this => {
                    return Err(CalcDiagnostic::new(CalcError::SyntaxError)
                        .at(self.loc())
                        .with_detail("cannot mix '@' and '|>' in one call chain"));
                }
                Some(_) => {}
            }
            self.advance();
            operands.push(self.parse_power()?);
        }
        match style {
            None => Ok(operands.pop().expect("chain has at least one operand")),
            Some(style) => Ok(Expr::FunctionCall { style, operands }),
        }
    }

    fn parse_power(&mut self) -> CalcResult<Expr> {
        let first = self.parse_postfix()?;
        let mut operands = vec![first];
        while matches!(self.peek_kind(), TokenKind::Power) {
            self.advance();
            operands.push(self.parse_postfix()?);
        }
        if operands.len() == 1 {
            Ok(operands.pop().expect("one operand"))
        } else {
            Ok(Expr::Power { operands })
        }
    }

    /// Explicit calls: `f(x)`, chainable as `f(x)(y)`.
    fn parse_postfix(&mut self) -> CalcResult<Expr> {
        let mut expr = self.parse_primary()?;
        while matches!(self.peek_kind(), TokenKind::LeftParen) {
            self.advance(); // (
            let arg = self.parse_expression()?;
            self.expect(&TokenKind::RightParen, "')' after call argument")?;
            expr = Expr::FunctionCall {
                style: CallStyle::At,
                operands: vec![expr, arg],
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> CalcResult<Expr> {
        match self.peek_kind().clone() {
            TokenKind::Number(raw) => {
                self.advance();
                Ok(Expr::Number(raw))
            }
            // A minus at operand position signs the numeric literal it
            // precedes; there is no general unary minus.
            TokenKind::Minus => {
                if let TokenKind::Number(raw) = self.peek_at(1).clone() {
                    self.advance(); // -
                    self.advance(); // number
                    Ok(Expr::Number(format!("-{raw}")))
                } else {
                    Err(CalcDiagnostic::new(CalcError::SyntaxError)
                        .at(self.loc())
                        .with_detail("'-' must be followed by a numeric literal"))
                }
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Identifier(name))
            }
            TokenKind::LeftParen => {
                self.advance(); // (
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "closing ')'")?;
                Ok(expr)
            }
            _ => Err(CalcDiagnostic::new(CalcError::SyntaxError)
                .at(self.loc())
                .with_detail(format!(
                    "expected a number, string, name, or '(', found {}",
                    describe(self.peek_kind())
                ))),
        }
    }
}

/// Human-readable token description for syntax errors.
fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(raw) => format!("number '{raw}'"),
        TokenKind::Str(_) => "string literal".to_string(),
        TokenKind::Ident(name) => format!("name '{name}'"),
        TokenKind::Plus => "'+'".to_string(),
        TokenKind::Minus => "'-'".to_string(),
        TokenKind::Star => "'*'".to_string(),
        TokenKind::Slash => "'/'".to_string(),
        TokenKind::SlashComma => "'/,'".to_string(),
        TokenKind::Percent => "'%'".to_string(),
        TokenKind::Power => "'**'".to_string(),
        TokenKind::At => "'@'".to_string(),
        TokenKind::PipeArrow => "'|>'".to_string(),
        TokenKind::Assign => "'='".to_string(),
        TokenKind::LeftParen => "'('".to_string(),
        TokenKind::RightParen => "')'".to_string(),
        TokenKind::Eof => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    fn parse_err(src: &str) -> CalcDiagnostic {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap_err()
    }

    #[test]
    fn number_literal() {
        assert_eq!(parse("42"), Expr::Number("42".into()));
    }

    #[test]
    fn negative_literal() {
        assert_eq!(parse("-5"), Expr::Number("-5".into()));
    }

    #[test]
    fn sum_chain_is_flat() {
        let expr = parse("1 + 2 - 3");
        match expr {
            Expr::Sum { first, rest } => {
                assert_eq!(*first, Expr::Number("1".into()));
                assert_eq!(
                    rest,
                    vec![
                        (SumOp::Add, Expr::Number("2".into())),
                        (SumOp::Sub, Expr::Number("3".into())),
                    ]
                );
            }
            other => panic!("expected Sum, got {other:?}"),
        }
    }

    #[test]
    fn precedence_product_inside_sum() {
        // 1 + 2 * 3 keeps the product as a sum operand
        let expr = parse("1 + 2 * 3");
        match expr {
            Expr::Sum { rest, .. } => {
                assert!(matches!(rest[0].1, Expr::Product { .. }));
            }
            other => panic!("expected Sum, got {other:?}"),
        }
    }

    #[test]
    fn parens_group() {
        let expr = parse("(1 + 2) * 3");
        match expr {
            Expr::Product { first, .. } => {
                assert!(matches!(*first, Expr::Sum { .. }));
            }
            other => panic!("expected Product, got {other:?}"),
        }
    }

    #[test]
    fn power_chain_collects_operands() {
        let expr = parse("2 ** 3 ** 2");
        match expr {
            Expr::Power { operands } => assert_eq!(operands.len(), 3),
            other => panic!("expected Power, got {other:?}"),
        }
    }

    #[test]
    fn power_binds_tighter_than_call() {
        let expr = parse("f @ 2 ** 3");
        match expr {
            Expr::FunctionCall { style, operands } => {
                assert_eq!(style, CallStyle::At);
                assert!(matches!(operands[1], Expr::Power { .. }));
            }
            other => panic!("expected FunctionCall, got {other:?}"),
        }
    }

    #[test]
    fn explicit_call_desugars_to_at() {
        let expr = parse("f(5)");
        assert_eq!(
            expr,
            Expr::FunctionCall {
                style: CallStyle::At,
                operands: vec![Expr::Identifier("f".into()), Expr::Number("5".into())],
            }
        );
    }

    #[test]
    fn pipe_chain() {
        let expr = parse("5 |> f |> g");
        match expr {
            Expr::FunctionCall { style, operands } => {
                assert_eq!(style, CallStyle::Pipe);
                assert_eq!(operands.len(), 3);
                assert_eq!(operands[0], Expr::Number("5".into()));
            }
            other => panic!("expected FunctionCall, got {other:?}"),
        }
    }

    #[test]
    fn mixed_call_chain_rejected() {
        let err = parse_err("5 |> f @ g");
        assert_eq!(err.error, CalcError::SyntaxError);
    }

    #[test]
    fn assignment_chain_targets() {
        let expr = parse("a = b = 5");
        assert_eq!(
            expr,
            Expr::Assignment {
                targets: vec!["a".into(), "b".into()],
                value: Box::new(Expr::Number("5".into())),
            }
        );
    }

    #[test]
    fn parenthesized_target() {
        let expr = parse("(a) = 1");
        assert_eq!(
            expr,
            Expr::Assignment {
                targets: vec!["a".into()],
                value: Box::new(Expr::Number("1".into())),
            }
        );
    }

    #[test]
    fn assignment_nested_in_parens() {
        let expr = parse("1 + (a = 2)");
        match expr {
            Expr::Sum { rest, .. } => {
                assert!(matches!(rest[0].1, Expr::Assignment { .. }));
            }
            other => panic!("expected Sum, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_paren() {
        let err = parse_err("(1 + 2");
        assert_eq!(err.error, CalcError::SyntaxError);
    }

    #[test]
    fn trailing_tokens_rejected() {
        let err = parse_err("1 2");
        assert_eq!(err.error, CalcError::SyntaxError);
        assert!(err.detail.unwrap().contains("after expression"));
    }

    #[test]
    fn deep_nesting_reports_recursion_limit() {
        let mut src = String::new();
        for _ in 0..500 {
            src.push('(');
        }
        src.push('1');
        for _ in 0..500 {
            src.push(')');
        }
        let err = parse_err(&src);
        assert_eq!(err.error, CalcError::RecursionLimit);
        assert!(err.detail.unwrap().starts_with("hint:"));
    }
}
