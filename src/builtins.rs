//! Built-in functions.
//!
//! Host functions installed into the global scope at startup. Each is an
//! ordinary `Value` wrapping a one-argument function, so user code can pass
//! them around, pipe into them, or shadow them by assignment.

use crate::env::Environment;
use crate::error::{CalcDiagnostic, CalcError, CalcResult};
use crate::number::{Number, Real};
use crate::value::{floor_value, Builtin, Op, Value};

/// Install the built-in bindings into `env`'s current scope.
pub fn install(env: &mut Environment) {
    for (name, func) in [
        ("incr", bif_incr as fn(&Value) -> CalcResult<Value>),
        ("decr", bif_decr),
        ("abs", bif_abs),
        ("floor", bif_floor),
    ] {
        env.define(name, Value::function(Builtin { name, func }));
    }
}

fn one_like(name: &str, arg: &Value) -> CalcResult<Value> {
    let backend = arg
        .as_number()
        .map(Number::backend)
        .ok_or_else(|| {
            CalcDiagnostic::new(CalcError::UnsupportedOperation)
                .with_detail(format!("{name} needs a numeric argument"))
        })?;
    Ok(Value::number(Number::real(Real::one(backend))))
}

/// `incr(x)` is `x + 1`.
fn bif_incr(arg: &Value) -> CalcResult<Value> {
    let one = one_like("incr", arg)?;
    arg.dispatch(Op::Add, &one)
}

/// `decr(x)` is `x - 1`.
fn bif_decr(arg: &Value) -> CalcResult<Value> {
    let one = one_like("decr", arg)?;
    arg.dispatch(Op::Sub, &one)
}

fn bif_abs(arg: &Value) -> CalcResult<Value> {
    match arg.as_number() {
        Some(n) => Ok(Value::number(n.abs()?)),
        None => Err(CalcDiagnostic::new(CalcError::UnsupportedOperation)
            .with_detail("abs needs a numeric argument")),
    }
}

fn bif_floor(arg: &Value) -> CalcResult<Value> {
    floor_value(arg)
}
