//! Values and operator dispatch.
//!
//! Every evaluated sub-expression produces a `Value`: a wrapper holding an
//! optional raw variant (number, string, or host function) plus a map of
//! per-operator overrides. Dispatch consults the overrides first, then the
//! raw variant's own capability for the operator; a wrapper with neither is
//! an error. The operator set is the closed `Op` enum, so dispatch is a
//! match, not a name lookup.

use std::collections::HashMap;
use std::fmt;

use num_traits::ToPrimitive;

use crate::error::{CalcDiagnostic, CalcError, CalcResult};
use crate::number::{Number, Real};

/// The closed set of dispatchable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
    Call,
    Floor,
}

impl Op {
    /// The operator's source spelling, for error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "/,",
            Self::Rem => "%",
            Self::Pow => "**",
            Self::Call => "call",
            Self::Floor => "floor",
        }
    }
}

/// A host function exposed as an ordinary callable value.
#[derive(Clone, Copy, PartialEq)]
pub struct Builtin {
    pub name: &'static str,
    pub func: fn(&Value) -> CalcResult<Value>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

/// The raw variants a value can delegate to.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw {
    Number(Number),
    Str(String),
    Function(Builtin),
}

impl Raw {
    fn describe(&self) -> &'static str {
        match self {
            Self::Number(_) => "a number",
            Self::Str(_) => "a string",
            Self::Function(_) => "a function",
        }
    }
}

/// The delegating wrapper around every evaluated value.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    overrides: HashMap<Op, Value>,
    raw: Option<Raw>,
}

fn unsupported(op: Op, raw: &Raw) -> CalcDiagnostic {
    CalcDiagnostic::new(CalcError::UnsupportedOperation).with_detail(format!(
        "'{}' is not defined for {}",
        op.symbol(),
        raw.describe()
    ))
}

impl Value {
    pub fn number(n: Number) -> Self {
        Self::from_raw(Raw::Number(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::from_raw(Raw::Str(s.into()))
    }

    pub fn function(b: Builtin) -> Self {
        Self::from_raw(Raw::Function(b))
    }

    pub fn from_raw(raw: Raw) -> Self {
        Self {
            overrides: HashMap::new(),
            raw: Some(raw),
        }
    }

    /// A wrapper with overrides only and no underlying value.
    pub fn detached(overrides: HashMap<Op, Value>) -> Self {
        Self {
            overrides,
            raw: None,
        }
    }

    pub fn with_overrides(raw: Raw, overrides: HashMap<Op, Value>) -> Self {
        Self {
            overrides,
            raw: Some(raw),
        }
    }

    /// The underlying raw value, or the no-underlying-value error.
    pub fn raw(&self) -> CalcResult<&Raw> {
        self.raw.as_ref().ok_or_else(|| {
            CalcDiagnostic::new(CalcError::NoUnderlyingValue)
                .with_detail("value has overrides but nothing to delegate to")
        })
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self.raw {
            Some(Raw::Number(ref n)) => Some(n),
            _ => None,
        }
    }

    /// Dispatch a binary operator: overrides first, then the raw variant's
    /// capability. The override (itself a callable value) and the capability
    /// both receive the right operand's raw value.
    pub fn dispatch(&self, op: Op, rhs: &Value) -> CalcResult<Value> {
        let rhs_raw = rhs.raw()?;
        if let Some(handler) = self.overrides.get(&op) {
            return handler.dispatch(Op::Call, &Value::from_raw(rhs_raw.clone()));
        }
        match self.raw {
            Some(ref raw) => raw.apply(op, rhs_raw),
            None => Err(CalcDiagnostic::new(CalcError::NoUnderlyingValue).with_detail(format!(
                "no override or underlying value for '{}'",
                op.symbol()
            ))),
        }
    }

    /// Dispatch a unary operator. An override is invoked with the value's
    /// own raw as its argument.
    pub fn dispatch_unary(&self, op: Op) -> CalcResult<Value> {
        if let Some(handler) = self.overrides.get(&op) {
            let arg = Value::from_raw(self.raw()?.clone());
            return handler.dispatch(Op::Call, &arg);
        }
        match self.raw {
            Some(ref raw) => raw.apply_unary(op),
            None => Err(CalcDiagnostic::new(CalcError::NoUnderlyingValue).with_detail(format!(
                "no override or underlying value for '{}'",
                op.symbol()
            ))),
        }
    }

    /// Invoke the value as a function with `arg`.
    pub fn call(&self, arg: &Value) -> CalcResult<Value> {
        self.dispatch(Op::Call, arg)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw {
            Some(Raw::Number(ref n)) => write!(f, "{n}"),
            Some(Raw::Str(ref s)) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Some(Raw::Function(ref b)) => write!(f, "<builtin {}>", b.name),
            None => write!(f, "<object>"),
        }
    }
}

// ── Raw capabilities — one method per operator ──────────────────────

impl Raw {
    fn apply(&self, op: Op, rhs: &Raw) -> CalcResult<Value> {
        match op {
            Op::Add => self.add(rhs),
            Op::Sub => self.sub(rhs),
            Op::Mul => self.mul(rhs),
            Op::Div => self.div(rhs),
            Op::FloorDiv => self.floor_div(rhs),
            Op::Rem => self.rem(rhs),
            Op::Pow => self.pow(rhs),
            Op::Call => self.call(rhs),
            Op::Floor => Err(unsupported(op, self)),
        }
    }

    fn apply_unary(&self, op: Op) -> CalcResult<Value> {
        match op {
            Op::Floor => self.floor(),
            _ => Err(unsupported(op, self)),
        }
    }

    fn add(&self, rhs: &Raw) -> CalcResult<Value> {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Value::number(a.add(b)?)),
            (Self::Str(a), Self::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
            _ => Err(unsupported(Op::Add, self)),
        }
    }

    fn sub(&self, rhs: &Raw) -> CalcResult<Value> {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Value::number(a.sub(b)?)),
            _ => Err(unsupported(Op::Sub, self)),
        }
    }

    fn mul(&self, rhs: &Raw) -> CalcResult<Value> {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Value::number(a.mul(b)?)),
            (Self::Str(s), Self::Number(n)) => {
                let count = repeat_count(n)?;
                Ok(Value::string(s.repeat(count)))
            }
            _ => Err(unsupported(Op::Mul, self)),
        }
    }

    fn div(&self, rhs: &Raw) -> CalcResult<Value> {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Value::number(a.div(b)?)),
            _ => Err(unsupported(Op::Div, self)),
        }
    }

    fn floor_div(&self, rhs: &Raw) -> CalcResult<Value> {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Value::number(a.floor_div(b)?)),
            _ => Err(unsupported(Op::FloorDiv, self)),
        }
    }

    fn rem(&self, rhs: &Raw) -> CalcResult<Value> {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Value::number(a.rem(b)?)),
            _ => Err(unsupported(Op::Rem, self)),
        }
    }

    fn pow(&self, rhs: &Raw) -> CalcResult<Value> {
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Value::number(a.pow(b)?)),
            _ => Err(unsupported(Op::Pow, self)),
        }
    }

    fn call(&self, arg: &Raw) -> CalcResult<Value> {
        match self {
            Self::Function(b) => (b.func)(&Value::from_raw(arg.clone())),
            _ => Err(unsupported(Op::Call, self)),
        }
    }

    fn floor(&self) -> CalcResult<Value> {
        match self {
            Self::Number(n) => Ok(Value::number(n.floor()?)),
            _ => Err(unsupported(Op::Floor, self)),
        }
    }
}

fn repeat_count(n: &Number) -> CalcResult<usize> {
    let whole = match n {
        Number::Real(r) => r.to_integer(),
        Number::Complex { .. } => None,
    };
    whole
        .and_then(|w| w.to_usize())
        .ok_or_else(|| {
            CalcDiagnostic::new(CalcError::Arithmetic)
                .with_detail("string repetition needs a non-negative whole number")
        })
}

// ── Fallback chains ─────────────────────────────────────────────────

/// Run `attempts` in order and return the first success. Errors from failed
/// attempts are discarded except the last one, which is propagated when
/// every attempt fails. This is the only sanctioned local-recovery path;
/// floor division is its one caller.
pub fn chain_attempts<T>(
    attempts: Vec<Box<dyn FnOnce() -> CalcResult<T> + '_>>,
) -> CalcResult<T> {
    let mut last_err = None;
    for attempt in attempts {
        match attempt() {
            Ok(v) => return Ok(v),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.expect("chain_attempts needs at least one attempt"))
}

/// Floor a value: prefer its own floor capability, else `v - v mod 1`.
pub fn floor_value(v: &Value) -> CalcResult<Value> {
    chain_attempts(vec![
        Box::new(|| v.dispatch_unary(Op::Floor)),
        Box::new(|| {
            let backend = match v.as_number() {
                Some(n) => n.backend(),
                None => return Err(unsupported_floor(v)),
            };
            let one = Value::number(Number::real(Real::one(backend)));
            let rem = v.dispatch(Op::Rem, &one)?;
            v.dispatch(Op::Sub, &rem)
        }),
    ])
}

fn unsupported_floor(v: &Value) -> CalcDiagnostic {
    match v.raw {
        Some(ref raw) => unsupported(Op::Floor, raw),
        None => CalcDiagnostic::new(CalcError::NoUnderlyingValue)
            .with_detail("no override or underlying value for 'floor'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::{decode, Backend};

    fn num(raw: &str) -> Value {
        Value::number(decode(raw, Backend::Exact).unwrap())
    }

    #[test]
    fn number_dispatch() {
        let v = num("2").dispatch(Op::Add, &num("3")).unwrap();
        assert_eq!(v, num("5"));
    }

    #[test]
    fn string_concat_and_repeat() {
        let v = Value::string("ab").dispatch(Op::Add, &Value::string("cd")).unwrap();
        assert_eq!(v, Value::string("abcd"));
        let v = Value::string("ab").dispatch(Op::Mul, &num("3")).unwrap();
        assert_eq!(v, Value::string("ababab"));
    }

    #[test]
    fn string_plus_number_unsupported() {
        let err = Value::string("ab").dispatch(Op::Add, &num("1")).unwrap_err();
        assert_eq!(err.error, CalcError::UnsupportedOperation);
    }

    #[test]
    fn number_call_unsupported() {
        let err = num("1").dispatch(Op::Call, &num("2")).unwrap_err();
        assert_eq!(err.error, CalcError::UnsupportedOperation);
        assert!(err.detail.unwrap().contains("a number"));
    }

    #[test]
    fn builtin_call() {
        fn double(arg: &Value) -> CalcResult<Value> {
            arg.dispatch(Op::Mul, &Value::number(decode("2", Backend::Exact).unwrap()))
        }
        let f = Value::function(Builtin {
            name: "double",
            func: double,
        });
        assert_eq!(f.call(&num("21")).unwrap(), num("42"));
    }

    #[test]
    fn override_wins_over_raw() {
        fn always_seven(_: &Value) -> CalcResult<Value> {
            Ok(Value::number(decode("7", Backend::Exact).unwrap()))
        }
        let mut overrides = HashMap::new();
        overrides.insert(
            Op::Add,
            Value::function(Builtin {
                name: "always_seven",
                func: always_seven,
            }),
        );
        let v = Value::with_overrides(
            Raw::Number(decode("1", Backend::Exact).unwrap()),
            overrides,
        );
        assert_eq!(v.dispatch(Op::Add, &num("100")).unwrap(), num("7"));
        // Operators without an override still delegate to the raw number.
        assert_eq!(v.dispatch(Op::Mul, &num("3")).unwrap(), num("3"));
    }

    #[test]
    fn detached_value_reports_no_underlying() {
        let v = Value::detached(HashMap::new());
        let err = v.dispatch(Op::Add, &num("1")).unwrap_err();
        assert_eq!(err.error, CalcError::NoUnderlyingValue);
    }

    #[test]
    fn detached_rhs_reports_no_underlying() {
        let v = Value::detached(HashMap::new());
        let err = num("1").dispatch(Op::Add, &v).unwrap_err();
        assert_eq!(err.error, CalcError::NoUnderlyingValue);
    }

    #[test]
    fn chain_attempts_takes_first_success() {
        let result: CalcResult<i32> = chain_attempts(vec![
            Box::new(|| Err(CalcDiagnostic::new(CalcError::UnsupportedOperation))),
            Box::new(|| Ok(2)),
            Box::new(|| Ok(3)),
        ]);
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn chain_attempts_propagates_last_error() {
        let result: CalcResult<i32> = chain_attempts(vec![
            Box::new(|| Err(CalcDiagnostic::new(CalcError::UnsupportedOperation))),
            Box::new(|| Err(CalcDiagnostic::new(CalcError::Arithmetic))),
        ]);
        assert_eq!(result.unwrap_err().error, CalcError::Arithmetic);
    }

    #[test]
    fn floor_value_uses_native_floor() {
        let seven_halves = num("7").dispatch(Op::Div, &num("2")).unwrap();
        assert_eq!(floor_value(&seven_halves).unwrap(), num("3"));
    }

    #[test]
    fn floor_value_falls_back_to_mod() {
        // An override replaces the native floor with one that always fails,
        // forcing the `v - v mod 1` fallback.
        fn no_floor(_: &Value) -> CalcResult<Value> {
            Err(CalcDiagnostic::new(CalcError::UnsupportedOperation))
        }
        let mut overrides = HashMap::new();
        overrides.insert(
            Op::Floor,
            Value::function(Builtin {
                name: "no_floor",
                func: no_floor,
            }),
        );
        let v = Value::with_overrides(
            Raw::Number(decode("7", Backend::Exact).unwrap()),
            overrides,
        );
        assert_eq!(floor_value(&v).unwrap(), num("7"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(num("42").to_string(), "42");
        assert_eq!(Value::string("hi").to_string(), "'hi'");
        assert_eq!(Value::string("it's").to_string(), "'it\\'s'");
        fn f(_: &Value) -> CalcResult<Value> {
            Ok(Value::string(""))
        }
        assert_eq!(
            Value::function(Builtin { name: "incr", func: f }).to_string(),
            "<builtin incr>"
        );
    }
}
