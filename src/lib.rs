pub mod ast;
pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod number;
pub mod parser;
pub mod preprocess;
pub mod value;

use crate::env::Environment;
use crate::error::CalcResult;
use crate::number::Backend;
use crate::value::Value;

/// Evaluate one input (a REPL line or a whole batch file) against `env`:
/// strip comments, tokenize, parse as a single expression, evaluate.
pub fn run_line(source: &str, env: &mut Environment, backend: Backend) -> CalcResult<Value> {
    let cleaned = preprocess::strip(source)?;
    let tokens = lexer::Lexer::new(&cleaned).tokenize()?;
    let expr = parser::Parser::new(tokens).parse()?;
    eval::Evaluator::new(env, backend).eval(&expr)
}
