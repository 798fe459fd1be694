//! Tree-walking evaluator — parse tree + environment to a value.
//!
//! A pure recursive walk: nodes are never mutated, and all state lives in
//! the `Environment`. Flat operator chains are folded here, left to right
//! for sums and products, right to left for powers and call chains. An
//! explicit depth counter mirrors the parser's guard so runaway recursion
//! is reported, not crashed.

use crate::ast::{CallStyle, Expr, ProductOp, SumOp};
use crate::env::Environment;
use crate::error::{CalcDiagnostic, CalcError, CalcResult};
use crate::number::{decode, Backend};
use crate::value::{chain_attempts, floor_value, Op, Value};

/// Maximum evaluation nesting depth.
const MAX_EVAL_DEPTH: usize = 200;

pub struct Evaluator<'a> {
    env: &'a mut Environment,
    backend: Backend,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a mut Environment, backend: Backend) -> Self {
        Self {
            env,
            backend,
            depth: 0,
        }
    }

    pub fn eval(&mut self, expr: &Expr) -> CalcResult<Value> {
        self.depth += 1;
        if self.depth > MAX_EVAL_DEPTH {
            return Err(CalcDiagnostic::new(CalcError::RecursionLimit)
                .with_detail("hint: the expression tree is nested too deeply to evaluate"));
        }
        let result = self.eval_node(expr);
        self.depth -= 1;
        result
    }

    fn eval_node(&mut self, expr: &Expr) -> CalcResult<Value> {
        match expr {
            Expr::Number(raw) => Ok(Value::number(decode(raw, self.backend)?)),

            Expr::Str(s) => Ok(Value::string(s.clone())),

            Expr::Identifier(name) => self.env.lookup(name).cloned().ok_or_else(|| {
                CalcDiagnostic::new(CalcError::UndeclaredIdentifier)
                    .with_detail(format!("name '{name}' is not bound in any scope"))
            }),

            Expr::Sum { first, rest } => {
                let mut acc = self.eval(first)?;
                for (op, operand) in rest {
                    let rhs = self.eval(operand)?;
                    let op = match op {
                        SumOp::Add => Op::Add,
                        SumOp::Sub => Op::Sub,
                    };
                    acc = acc.dispatch(op, &rhs)?;
                }
                Ok(acc)
            }

            Expr::Product { first, rest } => {
                let mut acc = self.eval(first)?;
                for (op, operand) in rest {
                    let rhs = self.eval(operand)?;
                    acc = match op {
                        ProductOp::Mul => acc.dispatch(Op::Mul, &rhs)?,
                        ProductOp::Div => acc.dispatch(Op::Div, &rhs)?,
                        ProductOp::Rem => acc.dispatch(Op::Rem, &rhs)?,
                        ProductOp::FloorDiv => Self::floor_divide(&acc, &rhs)?,
                    };
                }
                Ok(acc)
            }

            Expr::Power { operands } => {
                let mut values = self.eval_operands(operands)?;
                let mut acc = values.pop().expect("power chain has operands");
                while let Some(base) = values.pop() {
                    acc = base.dispatch(Op::Pow, &acc)?;
                }
                Ok(acc)
            }

            Expr::FunctionCall { style, operands } => {
                // Operands evaluate in textual order; a pipe chain then
                // reverses the list so both styles fold right to left.
                let mut values = self.eval_operands(operands)?;
                if *style == CallStyle::Pipe {
                    values.reverse();
                }
                let mut acc = values.pop().expect("call chain has operands");
                while let Some(callee) = values.pop() {
                    acc = callee.dispatch(Op::Call, &acc)?;
                }
                Ok(acc)
            }

            Expr::Assignment { targets, value } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.env.assign(target, value.clone());
                }
                Ok(value)
            }
        }
    }

    fn eval_operands(&mut self, operands: &[Expr]) -> CalcResult<Vec<Value>> {
        operands.iter().map(|operand| self.eval(operand)).collect()
    }

    /// Floor division: try the floordiv capability; on any failure fall
    /// back to flooring the true quotient.
    fn floor_divide(lhs: &Value, rhs: &Value) -> CalcResult<Value> {
        chain_attempts(vec![
            Box::new(|| lhs.dispatch(Op::FloorDiv, rhs)),
            Box::new(|| floor_value(&lhs.dispatch(Op::Div, rhs)?)),
        ])
    }
}
