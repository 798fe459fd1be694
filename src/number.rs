//! Numeric values and literal decoding.
//!
//! Two interchangeable backends are selected at startup: exact rationals
//! (`BigRational`) and arbitrary-precision decimals (`BigDecimal`). Literal
//! decoding is exact on both — binary, octal and hex fractions all have
//! finite decimal expansions — and never goes through a machine float.
//!
//! A literal is `[-] [prefix] [marker] mantissa [j]` where the marker is
//! `b`, `o` or `x`, the prefix scales the mantissa by `base^prefix`, and a
//! leading `0` with no marker spells an octal literal (`017`). Decimal
//! literals have no marker or prefix.

use std::fmt;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, ToBigInt};
use num_rational::BigRational;
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};

use crate::error::{CalcDiagnostic, CalcError, CalcResult};

/// Which numeric representation the process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Exact rational arithmetic (`BigRational`).
    Exact,
    /// Arbitrary-precision decimal arithmetic (`BigDecimal`).
    Decimal,
}

/// A real number in the selected backend's representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Real {
    Exact(BigRational),
    Decimal(BigDecimal),
}

/// A numeric value: real, or complex with both components in one backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Real(Real),
    Complex { re: Real, im: Real },
}

fn arith(detail: impl Into<String>) -> CalcDiagnostic {
    CalcDiagnostic::new(CalcError::Arithmetic).with_detail(detail)
}

fn bad_literal(raw: &str, detail: &str) -> CalcDiagnostic {
    CalcDiagnostic::new(CalcError::InvalidNumber).with_detail(format!("'{raw}': {detail}"))
}

// ── Real arithmetic ─────────────────────────────────────────────────

impl Real {
    pub fn zero(backend: Backend) -> Self {
        match backend {
            Backend::Exact => Self::Exact(BigRational::zero()),
            Backend::Decimal => Self::Decimal(BigDecimal::zero()),
        }
    }

    pub fn one(backend: Backend) -> Self {
        match backend {
            Backend::Exact => Self::Exact(BigRational::one()),
            Backend::Decimal => Self::Decimal(BigDecimal::one()),
        }
    }

    pub fn from_u32(digit: u32, backend: Backend) -> Self {
        match backend {
            Backend::Exact => Self::Exact(BigRational::from_integer(BigInt::from(digit))),
            Backend::Decimal => Self::Decimal(BigDecimal::from(digit)),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Exact(_) => Backend::Exact,
            Self::Decimal(_) => Backend::Decimal,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Self::Exact(r) => r.is_zero(),
            Self::Decimal(d) => d.is_zero(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Self::Exact(r) => r.is_negative(),
            Self::Decimal(d) => d.is_negative(),
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Self::Exact(r) => Self::Exact(-r),
            Self::Decimal(d) => Self::Decimal(-d),
        }
    }

    pub fn add(&self, rhs: &Real) -> CalcResult<Real> {
        match (self, rhs) {
            (Self::Exact(a), Self::Exact(b)) => Ok(Self::Exact(a + b)),
            (Self::Decimal(a), Self::Decimal(b)) => Ok(Self::Decimal(a + b)),
            _ => Err(arith("mixed numeric backends")),
        }
    }

    pub fn sub(&self, rhs: &Real) -> CalcResult<Real> {
        match (self, rhs) {
            (Self::Exact(a), Self::Exact(b)) => Ok(Self::Exact(a - b)),
            (Self::Decimal(a), Self::Decimal(b)) => Ok(Self::Decimal(a - b)),
            _ => Err(arith("mixed numeric backends")),
        }
    }

    pub fn mul(&self, rhs: &Real) -> CalcResult<Real> {
        match (self, rhs) {
            (Self::Exact(a), Self::Exact(b)) => Ok(Self::Exact(a * b)),
            (Self::Decimal(a), Self::Decimal(b)) => Ok(Self::Decimal(a * b)),
            _ => Err(arith("mixed numeric backends")),
        }
    }

    pub fn div(&self, rhs: &Real) -> CalcResult<Real> {
        if rhs.is_zero() {
            return Err(arith("division by zero"));
        }
        match (self, rhs) {
            (Self::Exact(a), Self::Exact(b)) => Ok(Self::Exact(a / b)),
            (Self::Decimal(a), Self::Decimal(b)) => Ok(Self::Decimal(a / b)),
            _ => Err(arith("mixed numeric backends")),
        }
    }

    /// Round toward negative infinity.
    pub fn floor(&self) -> Real {
        match self {
            Self::Exact(r) => Self::Exact(r.floor()),
            Self::Decimal(d) => Self::Decimal(d.with_scale_round(0, RoundingMode::Floor)),
        }
    }

    /// Floored remainder (Python-style): `a - floor(a/b) * b`.
    pub fn rem(&self, rhs: &Real) -> CalcResult<Real> {
        let quotient = self.div(rhs)?.floor();
        self.sub(&quotient.mul(rhs)?)
    }

    /// Floored quotient: `floor(a/b)`.
    pub fn floor_div(&self, rhs: &Real) -> CalcResult<Real> {
        Ok(self.div(rhs)?.floor())
    }

    /// True if the value is a whole number, and its integer form if so.
    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            Self::Exact(r) => r.is_integer().then(|| r.to_integer()),
            Self::Decimal(d) => {
                let floored = d.with_scale_round(0, RoundingMode::Floor);
                if (d - &floored).is_zero() {
                    floored.to_bigint()
                } else {
                    None
                }
            }
        }
    }

    /// Raise to an integer power. Negative exponents invert, so `0 ** -n`
    /// is a division-by-zero error.
    pub fn pow(&self, exponent: i32) -> CalcResult<Real> {
        let mag = exponent.unsigned_abs();
        let positive = match self {
            Self::Exact(r) => Self::Exact(BigRational::new(
                r.numer().pow(mag),
                r.denom().pow(mag),
            )),
            Self::Decimal(d) => {
                let mut acc = BigDecimal::one();
                let mut base = d.clone();
                let mut e = mag;
                while e > 0 {
                    if e & 1 == 1 {
                        acc = &acc * &base;
                    }
                    base = &base * &base;
                    e >>= 1;
                }
                Self::Decimal(acc)
            }
        };
        if exponent < 0 {
            Real::one(self.backend()).div(&positive)
        } else {
            Ok(positive)
        }
    }
}

// ── Number arithmetic ───────────────────────────────────────────────

impl Number {
    pub fn real(r: Real) -> Self {
        Self::Real(r)
    }

    pub fn from_u32(n: u32, backend: Backend) -> Self {
        Self::Real(Real::from_u32(n, backend))
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Real(r) => r.backend(),
            Self::Complex { re, .. } => re.backend(),
        }
    }

    fn parts(&self) -> (Real, Real) {
        match self {
            Self::Real(r) => (r.clone(), Real::zero(r.backend())),
            Self::Complex { re, im } => (re.clone(), im.clone()),
        }
    }

    fn is_complex(&self) -> bool {
        matches!(self, Self::Complex { .. })
    }

    pub fn add(&self, rhs: &Number) -> CalcResult<Number> {
        if self.is_complex() || rhs.is_complex() {
            let (a, b) = self.parts();
            let (c, d) = rhs.parts();
            Ok(Self::Complex {
                re: a.add(&c)?,
                im: b.add(&d)?,
            })
        } else {
            let (Self::Real(a), Self::Real(b)) = (self, rhs) else {
                unreachable!("both operands are real");
            };
            Ok(Self::Real(a.add(b)?))
        }
    }

    pub fn sub(&self, rhs: &Number) -> CalcResult<Number> {
        if self.is_complex() || rhs.is_complex() {
            let (a, b) = self.parts();
            let (c, d) = rhs.parts();
            Ok(Self::Complex {
                re: a.sub(&c)?,
                im: b.sub(&d)?,
            })
        } else {
            let (Self::Real(a), Self::Real(b)) = (self, rhs) else {
                unreachable!("both operands are real");
            };
            Ok(Self::Real(a.sub(b)?))
        }
    }

    pub fn mul(&self, rhs: &Number) -> CalcResult<Number> {
        if self.is_complex() || rhs.is_complex() {
            // (a+bi)(c+di) = (ac-bd) + (ad+bc)i
            let (a, b) = self.parts();
            let (c, d) = rhs.parts();
            Ok(Self::Complex {
                re: a.mul(&c)?.sub(&b.mul(&d)?)?,
                im: a.mul(&d)?.add(&b.mul(&c)?)?,
            })
        } else {
            let (Self::Real(a), Self::Real(b)) = (self, rhs) else {
                unreachable!("both operands are real");
            };
            Ok(Self::Real(a.mul(b)?))
        }
    }

    pub fn div(&self, rhs: &Number) -> CalcResult<Number> {
        if self.is_complex() || rhs.is_complex() {
            // (a+bi)/(c+di) = ((ac+bd) + (bc-ad)i) / (c²+d²)
            let (a, b) = self.parts();
            let (c, d) = rhs.parts();
            let denom = c.mul(&c)?.add(&d.mul(&d)?)?;
            if denom.is_zero() {
                return Err(arith("division by zero"));
            }
            Ok(Self::Complex {
                re: a.mul(&c)?.add(&b.mul(&d)?)?.div(&denom)?,
                im: b.mul(&c)?.sub(&a.mul(&d)?)?.div(&denom)?,
            })
        } else {
            let (Self::Real(a), Self::Real(b)) = (self, rhs) else {
                unreachable!("both operands are real");
            };
            Ok(Self::Real(a.div(b)?))
        }
    }

    pub fn floor_div(&self, rhs: &Number) -> CalcResult<Number> {
        match (self, rhs) {
            (Self::Real(a), Self::Real(b)) => Ok(Self::Real(a.floor_div(b)?)),
            _ => Err(arith("floor division is not defined for complex values")),
        }
    }

    pub fn rem(&self, rhs: &Number) -> CalcResult<Number> {
        match (self, rhs) {
            (Self::Real(a), Self::Real(b)) => Ok(Self::Real(a.rem(b)?)),
            _ => Err(arith("modulo is not defined for complex values")),
        }
    }

    pub fn floor(&self) -> CalcResult<Number> {
        match self {
            Self::Real(r) => Ok(Self::Real(r.floor())),
            Self::Complex { .. } => Err(arith("floor is not defined for complex values")),
        }
    }

    pub fn abs(&self) -> CalcResult<Number> {
        match self {
            Self::Real(Real::Exact(r)) => Ok(Self::Real(Real::Exact(r.abs()))),
            Self::Real(Real::Decimal(d)) => Ok(Self::Real(Real::Decimal(d.abs()))),
            Self::Complex { .. } => Err(arith("abs is not defined for complex values")),
        }
    }

    /// Exponentiation. Exponents must be whole numbers: both backends are
    /// exact, and fractional powers have no exact representation here.
    pub fn pow(&self, rhs: &Number) -> CalcResult<Number> {
        let Self::Real(exp) = rhs else {
            return Err(arith("complex exponents are not supported"));
        };
        let Some(exp) = exp.to_integer() else {
            return Err(arith("exponent must be a whole number"));
        };
        let Some(exp) = exp.to_i32() else {
            return Err(arith("exponent is too large"));
        };

        match self {
            Self::Real(base) => Ok(Self::Real(base.pow(exp)?)),
            Self::Complex { .. } => {
                if exp < 0 {
                    let positive = self.pow(&Number::from_u32(exp.unsigned_abs(), self.backend()))?;
                    return Number::from_u32(1, self.backend()).div(&positive);
                }
                let mut acc = Number::from_u32(1, self.backend());
                let mut base = self.clone();
                let mut e = exp as u32;
                while e > 0 {
                    if e & 1 == 1 {
                        acc = acc.mul(&base)?;
                    }
                    base = base.mul(&base)?;
                    e >>= 1;
                }
                Ok(acc)
            }
        }
    }
}

// ── Display ─────────────────────────────────────────────────────────

/// Render a decimal without trailing fractional zeros.
fn format_decimal(d: &BigDecimal) -> String {
    let s = d.to_string();
    if s.contains('.') {
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    } else {
        s
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(r) => write!(f, "{r}"),
            Self::Decimal(d) => write!(f, "{}", format_decimal(d)),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(r) => write!(f, "{r}"),
            Self::Complex { re, im } => {
                if re.is_zero() {
                    write!(f, "{im}j")
                } else if im.is_negative() {
                    write!(f, "({re}{im}j)")
                } else {
                    write!(f, "({re}+{im}j)")
                }
            }
        }
    }
}

// ── Literal scanning ────────────────────────────────────────────────

/// A scanned numeric literal, before backend conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub negative: bool,
    pub base: u32,
    /// Decimal digits before the base marker; scales the mantissa by
    /// `base^prefix`. Always empty for decimal literals.
    pub exponent_prefix: String,
    pub integer_digits: String,
    pub fractional_digits: String,
    pub imaginary: bool,
}

fn digit_value(ch: char, base: u32) -> Option<u32> {
    ch.to_digit(16).filter(|&d| d < base)
}

/// Split a mantissa on its optional dot and check the digit alphabet.
fn split_mantissa(raw: &str, mantissa: &str, base: u32) -> CalcResult<(String, String)> {
    if mantissa.is_empty() || mantissa == "." {
        return Err(bad_literal(raw, "missing digits"));
    }
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => {
            let (i, rest) = mantissa.split_at(idx);
            let f = &rest[1..];
            if f.contains('.') {
                return Err(bad_literal(raw, "more than one '.'"));
            }
            (i, f)
        }
        None => (mantissa, ""),
    };
    for part in [int_part, frac_part] {
        for ch in part.chars() {
            if digit_value(ch, base).is_none() {
                return Err(bad_literal(raw, &format!("invalid digit '{ch}' for base {base}")));
            }
        }
    }
    Ok((int_part.to_string(), frac_part.to_string()))
}

/// Scan raw literal text into its parts.
pub fn scan(raw: &str) -> CalcResult<Literal> {
    let mut text = raw;

    let negative = text.starts_with('-');
    if negative {
        text = &text[1..];
    }

    let imaginary = text.ends_with('j') || text.ends_with('J');
    if imaginary {
        text = &text[..text.len() - 1];
    }

    if text.is_empty() {
        return Err(bad_literal(raw, "missing digits"));
    }

    // A run of decimal digits, then possibly a base marker.
    let digits_len = text.chars().take_while(char::is_ascii_digit).count();
    let marker = text[digits_len..].chars().next();

    let (base, exponent_prefix, mantissa) = match marker {
        Some(m @ ('b' | 'o' | 'x')) => {
            let prefix = &text[..digits_len];
            if prefix.is_empty() {
                return Err(bad_literal(raw, "missing exponent prefix before base marker"));
            }
            if prefix.len() > 1 && prefix.starts_with('0') {
                return Err(bad_literal(raw, "exponent prefix has a leading zero"));
            }
            let base = match m {
                'b' => 2,
                'o' => 8,
                _ => 16,
            };
            (base, prefix, &text[digits_len + 1..])
        }
        _ => {
            // No marker: decimal, or the leading-zero octal spelling.
            if text.starts_with('0') && text.len() > 1 && !text.starts_with("0.") {
                (8, "", &text[1..])
            } else {
                (10, "", text)
            }
        }
    };

    // A trailing dot is tolerated: `0.` is zero.
    let mantissa = mantissa.strip_suffix('.').unwrap_or(mantissa);
    let (integer_digits, fractional_digits) = split_mantissa(raw, mantissa, base)?;

    Ok(Literal {
        negative,
        base,
        exponent_prefix: exponent_prefix.to_string(),
        integer_digits,
        fractional_digits,
        imaginary,
    })
}

// ── Conversion ──────────────────────────────────────────────────────

/// Convert mantissa digits in `base` to an exact value: the integer part
/// folds high to low (`val = val*base + digit`), the fractional part scans
/// left to right with a running `1/base` weight.
fn convert(
    integer_digits: &str,
    fractional_digits: &str,
    base: u32,
    backend: Backend,
) -> CalcResult<Real> {
    let base_val = Real::from_u32(base, backend);

    let mut value = Real::zero(backend);
    for ch in integer_digits.chars() {
        let d = digit_value(ch, base).expect("digits validated by scan");
        value = value.mul(&base_val)?.add(&Real::from_u32(d, backend))?;
    }

    let mut weight = Real::one(backend).div(&base_val)?;
    for ch in fractional_digits.chars() {
        let d = digit_value(ch, base).expect("digits validated by scan");
        value = value.add(&Real::from_u32(d, backend).mul(&weight)?)?;
        weight = weight.div(&base_val)?;
    }

    Ok(value)
}

/// Largest accepted exponent prefix.
const MAX_EXPONENT_PREFIX: u32 = 1_000_000;

/// Decode raw literal text into a `Number` on the selected backend.
pub fn decode(raw: &str, backend: Backend) -> CalcResult<Number> {
    let lit = scan(raw)?;

    let mut value = convert(&lit.integer_digits, &lit.fractional_digits, lit.base, backend)?;

    if !lit.exponent_prefix.is_empty() {
        let exp: u32 = lit
            .exponent_prefix
            .parse()
            .ok()
            .filter(|&e| e <= MAX_EXPONENT_PREFIX)
            .ok_or_else(|| bad_literal(raw, "exponent prefix is too large"))?;
        let scale = Real::from_u32(lit.base, backend).pow(exp as i32)?;
        value = value.mul(&scale)?;
    }

    if lit.negative {
        value = value.neg();
    }

    if lit.imaginary {
        Ok(Number::Complex {
            re: Real::zero(backend),
            im: value,
        })
    } else {
        Ok(Number::Real(value))
    }
}
