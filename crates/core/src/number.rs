//! The numeric tower: integer, rational, real, complex
//!
//! Four kinds in an exactness ladder — `Int` and `Ratio` are exact,
//! `Real` and `Complex` are inexact. Binary operations lift both operands
//! to the join of their kinds before applying the kind-specific kernel.
//! Exact arithmetic that leaves the `i64` range promotes to `Real` rather
//! than wrapping; rationals are always kept reduced with a positive
//! denominator, and a rational that reduces to denominator 1 collapses to
//! an integer.

use crate::error::{Result, numeric_error};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    /// Reduced numerator/denominator, denominator > 0.
    Ratio(i64, i64),
    Real(f64),
    Complex(f64, f64),
}

impl Number {
    /// Build a rational from unreduced parts, collapsing to `Int` when the
    /// reduced denominator is 1 and falling back to `Real` when the
    /// reduced parts no longer fit in an `i64`.
    pub fn ratio(num: i128, den: i128) -> Result<Number> {
        if den == 0 {
            return Err(numeric_error("/", "division by zero"));
        }
        let g = gcd_i128(num.abs(), den.abs());
        let (mut n, mut d) = (num / g, den / g);
        if d < 0 {
            n = -n;
            d = -d;
        }
        if d == 1 {
            return Ok(match i64::try_from(n) {
                Ok(n) => Number::Int(n),
                Err(_) => Number::Real(n as f64),
            });
        }
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(n), Ok(d)) => Ok(Number::Ratio(n, d)),
            _ => Ok(Number::Real(n as f64 / d as f64)),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Number::Int(_) | Number::Ratio(_, _))
    }

    pub fn is_integer(&self) -> bool {
        match *self {
            Number::Int(_) => true,
            Number::Ratio(_, _) => false,
            Number::Real(f) => f.is_finite() && f.fract() == 0.0,
            Number::Complex(_, _) => false,
        }
    }

    pub fn is_rational(&self) -> bool {
        match *self {
            Number::Int(_) | Number::Ratio(_, _) => true,
            Number::Real(f) => f.is_finite(),
            Number::Complex(_, _) => false,
        }
    }

    pub fn is_real(&self) -> bool {
        !matches!(self, Number::Complex(_, _))
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Number::Int(n) => n == 0,
            Number::Ratio(_, _) => false,
            Number::Real(f) => f == 0.0,
            Number::Complex(re, im) => re == 0.0 && im == 0.0,
        }
    }

    /// Real-line value; `None` for complex with nonzero imaginary part.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Number::Int(n) => Some(n as f64),
            Number::Ratio(n, d) => Some(n as f64 / d as f64),
            Number::Real(f) => Some(f),
            Number::Complex(re, im) if im == 0.0 => Some(re),
            Number::Complex(_, _) => None,
        }
    }

    pub fn as_complex(&self) -> (f64, f64) {
        match *self {
            Number::Complex(re, im) => (re, im),
            ref n => (n.as_f64().expect("real kinds convert"), 0.0),
        }
    }

    /// Exact value as (numerator, denominator); `None` for inexact kinds.
    fn as_parts(&self) -> Option<(i64, i64)> {
        match *self {
            Number::Int(n) => Some((n, 1)),
            Number::Ratio(n, d) => Some((n, d)),
            _ => None,
        }
    }
}

fn gcd_i128(mut m: i128, mut n: i128) -> i128 {
    while n != 0 {
        let r = m % n;
        m = n;
        n = r;
    }
    if m == 0 { 1 } else { m }
}

pub fn gcd_i64(m: i64, n: i64) -> i64 {
    gcd_i128(m.unsigned_abs() as i128, n.unsigned_abs() as i128) as i64
}

// --- arithmetic ------------------------------------------------------------

fn exact_binop(
    a: (i64, i64),
    b: (i64, i64),
    f: impl FnOnce(i128, i128, i128, i128) -> (i128, i128),
) -> Number {
    let (n1, d1) = (a.0 as i128, a.1 as i128);
    let (n2, d2) = (b.0 as i128, b.1 as i128);
    let (n, d) = f(n1, d1, n2, d2);
    // i64 inputs keep the products inside i128; only the reduction step
    // can push the result out of i64 range, and ratio() handles that.
    Number::ratio(n, d).expect("denominator proved nonzero")
}

pub fn add(a: Number, b: Number) -> Number {
    use Number::*;
    match (a, b) {
        (Int(x), Int(y)) => match x.checked_add(y) {
            Some(s) => Int(s),
            None => Real(x as f64 + y as f64),
        },
        (Complex(_, _), _) | (_, Complex(_, _)) => {
            let (r1, i1) = a.as_complex();
            let (r2, i2) = b.as_complex();
            Complex(r1 + r2, i1 + i2)
        }
        (Real(_), _) | (_, Real(_)) => Real(a.as_f64().unwrap() + b.as_f64().unwrap()),
        _ => exact_binop(
            a.as_parts().unwrap(),
            b.as_parts().unwrap(),
            |n1, d1, n2, d2| (n1 * d2 + n2 * d1, d1 * d2),
        ),
    }
}

pub fn sub(a: Number, b: Number) -> Number {
    add(a, neg(b))
}

pub fn neg(a: Number) -> Number {
    use Number::*;
    match a {
        Int(n) => match n.checked_neg() {
            Some(m) => Int(m),
            None => Real(-(n as f64)),
        },
        Ratio(n, d) => Ratio(-n, d),
        Real(f) => Real(-f),
        Complex(re, im) => Complex(-re, -im),
    }
}

pub fn mul(a: Number, b: Number) -> Number {
    use Number::*;
    match (a, b) {
        (Int(x), Int(y)) => match x.checked_mul(y) {
            Some(p) => Int(p),
            None => Real(x as f64 * y as f64),
        },
        (Complex(_, _), _) | (_, Complex(_, _)) => {
            let (r1, i1) = a.as_complex();
            let (r2, i2) = b.as_complex();
            Complex(r1 * r2 - i1 * i2, r1 * i2 + i1 * r2)
        }
        (Real(_), _) | (_, Real(_)) => Real(a.as_f64().unwrap() * b.as_f64().unwrap()),
        _ => exact_binop(
            a.as_parts().unwrap(),
            b.as_parts().unwrap(),
            |n1, d1, n2, d2| (n1 * n2, d1 * d2),
        ),
    }
}

pub fn div(a: Number, b: Number) -> Result<Number> {
    use Number::*;
    match (a, b) {
        (Complex(_, _), _) | (_, Complex(_, _)) => {
            let (r1, i1) = a.as_complex();
            let (r2, i2) = b.as_complex();
            let den = r2 * r2 + i2 * i2;
            Ok(Complex((r1 * r2 + i1 * i2) / den, (i1 * r2 - r1 * i2) / den))
        }
        (Real(_), _) | (_, Real(_)) => Ok(Real(a.as_f64().unwrap() / b.as_f64().unwrap())),
        _ => {
            let (n1, d1) = a.as_parts().unwrap();
            let (n2, d2) = b.as_parts().unwrap();
            Number::ratio(n1 as i128 * d2 as i128, d1 as i128 * n2 as i128)
        }
    }
}

pub fn abs(a: Number) -> Number {
    use Number::*;
    match a {
        Int(n) if n < 0 => neg(Int(n)),
        Ratio(n, d) if n < 0 => Ratio(-n, d),
        Real(f) => Real(f.abs()),
        other => other,
    }
}

// --- integer-only kernels --------------------------------------------------

pub fn quotient(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(numeric_error("quotient", "division by zero"));
    }
    Ok(a.wrapping_div(b))
}

pub fn remainder(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(numeric_error("remainder", "division by zero"));
    }
    Ok(a.wrapping_rem(b))
}

/// Sign follows the divisor, per R5RS `modulo`.
pub fn modulo(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(numeric_error("modulo", "division by zero"));
    }
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

pub fn lcm(a: i64, b: i64) -> Number {
    if a == 0 || b == 0 {
        return Number::Int(0);
    }
    let g = gcd_i64(a, b) as i128;
    let l = (a.unsigned_abs() as i128 / g) * b.unsigned_abs() as i128;
    match i64::try_from(l) {
        Ok(l) => Number::Int(l),
        Err(_) => Number::Real(l as f64),
    }
}

// --- comparison ------------------------------------------------------------

/// Mathematical ordering. Fails for complex operands and NaN.
pub fn compare(a: Number, b: Number) -> Result<Ordering> {
    if !a.is_real() || !b.is_real() {
        return Err(numeric_error("compare", "complex numbers cannot be ordered"));
    }
    if let (Some((n1, d1)), Some((n2, d2))) = (a.as_parts(), b.as_parts()) {
        return Ok((n1 as i128 * d2 as i128).cmp(&(n2 as i128 * d1 as i128)));
    }
    let (x, y) = (a.as_f64().unwrap(), b.as_f64().unwrap());
    x.partial_cmp(&y)
        .ok_or_else(|| numeric_error("compare", "cannot order nan"))
}

/// Mathematical equality after coercion (`=`). Complex is allowed here;
/// only ordering rejects it.
pub fn num_eq(a: Number, b: Number) -> bool {
    if let (Some((n1, d1)), Some((n2, d2))) = (a.as_parts(), b.as_parts()) {
        return n1 as i128 * d2 as i128 == n2 as i128 * d1 as i128;
    }
    let (r1, i1) = a.as_complex();
    let (r2, i2) = b.as_complex();
    r1 == r2 && i1 == i2
}

/// `eqv?` on numbers: same kind and same value. `1` and `1.0` differ.
pub fn eqv(a: Number, b: Number) -> bool {
    use Number::*;
    match (a, b) {
        (Int(x), Int(y)) => x == y,
        (Ratio(n1, d1), Ratio(n2, d2)) => n1 == n2 && d1 == d2,
        (Real(x), Real(y)) => x == y,
        (Complex(r1, i1), Complex(r2, i2)) => r1 == r2 && i1 == i2,
        _ => false,
    }
}

// --- rounding --------------------------------------------------------------

fn floor_div(n: i64, d: i64) -> i64 {
    let q = n / d;
    if n % d != 0 && (n < 0) != (d < 0) { q - 1 } else { q }
}

pub fn floor(a: Number) -> Result<Number> {
    use Number::*;
    match a {
        Int(_) => Ok(a),
        Ratio(n, d) => Ok(Int(floor_div(n, d))),
        Real(f) => Ok(Real(f.floor())),
        Complex(_, _) => Err(numeric_error("floor", "complex argument")),
    }
}

pub fn ceiling(a: Number) -> Result<Number> {
    use Number::*;
    match a {
        Int(_) => Ok(a),
        Ratio(n, d) => Ok(Int(floor_div(n, d) + 1)),
        Real(f) => Ok(Real(f.ceil())),
        Complex(_, _) => Err(numeric_error("ceiling", "complex argument")),
    }
}

pub fn truncate(a: Number) -> Result<Number> {
    use Number::*;
    match a {
        Int(_) => Ok(a),
        Ratio(n, d) => Ok(Int(n / d)),
        Real(f) => Ok(Real(f.trunc())),
        Complex(_, _) => Err(numeric_error("truncate", "complex argument")),
    }
}

/// Round to even, per R5RS.
pub fn round(a: Number) -> Result<Number> {
    use Number::*;
    match a {
        Int(_) => Ok(a),
        Ratio(n, d) => {
            let lo = floor_div(n, d);
            // compare the fraction against 1/2: 2*(n - lo*d) vs d
            let twice_frac = 2 * (n as i128 - lo as i128 * d as i128);
            let up = match twice_frac.cmp(&(d as i128)) {
                Ordering::Less => false,
                Ordering::Greater => true,
                Ordering::Equal => lo % 2 != 0,
            };
            Ok(Int(if up { lo + 1 } else { lo }))
        }
        Real(f) => Ok(Real(f.round_ties_even())),
        Complex(_, _) => Err(numeric_error("round", "complex argument")),
    }
}

// --- exactness -------------------------------------------------------------

pub fn to_inexact(a: Number) -> Number {
    use Number::*;
    match a {
        Int(n) => Real(n as f64),
        Ratio(n, d) => Real(n as f64 / d as f64),
        other => other,
    }
}

pub fn to_exact(a: Number) -> Result<Number> {
    use Number::*;
    match a {
        Int(_) | Ratio(_, _) => Ok(a),
        Real(f) => exact_from_f64(f),
        Complex(_, _) => Err(numeric_error("inexact->exact", "complex argument")),
    }
}

/// Every finite double is a dyadic rational; scale by 2 until the
/// fractional part vanishes, bailing out when the numerator would leave
/// exact range.
fn exact_from_f64(f: f64) -> Result<Number> {
    if !f.is_finite() {
        return Err(numeric_error("inexact->exact", "no exact representation"));
    }
    let mut num = f;
    let mut den: i128 = 1;
    let mut steps = 0;
    while num.fract() != 0.0 {
        num *= 2.0;
        den *= 2;
        steps += 1;
        if steps > 64 || num.abs() > i64::MAX as f64 {
            return Err(numeric_error("inexact->exact", "no exact representation"));
        }
    }
    if num.abs() > i64::MAX as f64 {
        return Err(numeric_error("inexact->exact", "no exact representation"));
    }
    Number::ratio(num as i128, den)
}

pub fn numerator(a: Number) -> Result<Number> {
    use Number::*;
    match a {
        Int(_) => Ok(a),
        Ratio(n, _) => Ok(Int(n)),
        Real(_) => numerator(to_exact(a)?).map(to_inexact),
        Complex(_, _) => Err(numeric_error("numerator", "complex argument")),
    }
}

pub fn denominator(a: Number) -> Result<Number> {
    use Number::*;
    match a {
        Int(_) => Ok(Int(1)),
        Ratio(_, d) => Ok(Int(d)),
        Real(_) => denominator(to_exact(a)?).map(to_inexact),
        Complex(_, _) => Err(numeric_error("denominator", "complex argument")),
    }
}

// --- transcendental --------------------------------------------------------

fn real_arg(who: &str, a: Number) -> Result<f64> {
    a.as_f64()
        .ok_or_else(|| numeric_error(who, "complex argument not supported"))
}

pub fn exp(a: Number) -> Result<Number> {
    match a {
        Number::Complex(re, im) => {
            let m = re.exp();
            Ok(Number::Complex(m * im.cos(), m * im.sin()))
        }
        _ => Ok(Number::Real(real_arg("exp", a)?.exp())),
    }
}

pub fn log(a: Number) -> Result<Number> {
    match a {
        Number::Complex(re, im) => {
            let mag = (re * re + im * im).sqrt();
            Ok(Number::Complex(mag.ln(), im.atan2(re)))
        }
        _ => {
            let x = real_arg("log", a)?;
            if x < 0.0 {
                Ok(Number::Complex((-x).ln(), std::f64::consts::PI))
            } else {
                Ok(Number::Real(x.ln()))
            }
        }
    }
}

pub fn sin(a: Number) -> Result<Number> {
    Ok(Number::Real(real_arg("sin", a)?.sin()))
}

pub fn cos(a: Number) -> Result<Number> {
    Ok(Number::Real(real_arg("cos", a)?.cos()))
}

pub fn tan(a: Number) -> Result<Number> {
    Ok(Number::Real(real_arg("tan", a)?.tan()))
}

pub fn asin(a: Number) -> Result<Number> {
    Ok(Number::Real(real_arg("asin", a)?.asin()))
}

pub fn acos(a: Number) -> Result<Number> {
    Ok(Number::Real(real_arg("acos", a)?.acos()))
}

pub fn atan(a: Number) -> Result<Number> {
    Ok(Number::Real(real_arg("atan", a)?.atan()))
}

pub fn atan2(y: Number, x: Number) -> Result<Number> {
    Ok(Number::Real(
        real_arg("atan", y)?.atan2(real_arg("atan", x)?),
    ))
}

pub fn sqrt(a: Number) -> Result<Number> {
    match a {
        Number::Int(n) if n >= 0 => {
            let r = (n as f64).sqrt().round() as i64;
            if r.checked_mul(r) == Some(n) {
                Ok(Number::Int(r))
            } else {
                Ok(Number::Real((n as f64).sqrt()))
            }
        }
        Number::Complex(re, im) => {
            let mag = (re * re + im * im).sqrt().sqrt();
            let ang = im.atan2(re) / 2.0;
            Ok(Number::Complex(mag * ang.cos(), mag * ang.sin()))
        }
        _ => {
            let x = real_arg("sqrt", a)?;
            if x < 0.0 {
                Ok(Number::Complex(0.0, (-x).sqrt()))
            } else {
                Ok(Number::Real(x.sqrt()))
            }
        }
    }
}

pub fn expt(base: Number, power: Number) -> Result<Number> {
    use Number::*;
    match (base, power) {
        (_, Int(p)) if base.is_exact() => {
            let (n, d) = base.as_parts().unwrap();
            if p >= 0 {
                exact_pow(n, d, p as u32)
            } else {
                let flipped = div(Int(1), base)?;
                match flipped.as_parts() {
                    Some((n, d)) => exact_pow(n, d, p.unsigned_abs().min(u32::MAX as u64) as u32),
                    None => Ok(Real(flipped.as_f64().unwrap().powi(-(p as i32)))),
                }
            }
        }
        (Complex(_, _), _) | (_, Complex(_, _)) => {
            // b^p = exp(p * log b)
            let lg = log(base)?;
            exp(mul(power, lg))
        }
        _ => {
            let (b, p) = (base.as_f64().unwrap(), power.as_f64().unwrap());
            let r = b.powf(p);
            if r.is_nan() && b < 0.0 {
                let lg = log(base)?;
                exp(mul(power, lg))
            } else {
                Ok(Real(r))
            }
        }
    }
}

fn exact_pow(n: i64, d: i64, p: u32) -> Result<Number> {
    let mut num: i128 = 1;
    let mut den: i128 = 1;
    for _ in 0..p {
        num = match num.checked_mul(n as i128) {
            Some(v) => v,
            None => {
                return Ok(Number::Real(
                    (n as f64 / d as f64).powi(p.min(i32::MAX as u32) as i32),
                ));
            }
        };
        den = match den.checked_mul(d as i128) {
            Some(v) => v,
            None => {
                return Ok(Number::Real(
                    (n as f64 / d as f64).powi(p.min(i32::MAX as u32) as i32),
                ));
            }
        };
    }
    Number::ratio(num, den)
}

pub fn make_rectangular(re: Number, im: Number) -> Result<Number> {
    let (re, im) = (real_arg("make-rectangular", re)?, real_arg("make-rectangular", im)?);
    Ok(Number::Complex(re, im))
}

pub fn make_polar(mag: Number, ang: Number) -> Result<Number> {
    let (m, a) = (real_arg("make-polar", mag)?, real_arg("make-polar", ang)?);
    Ok(Number::Complex(m * a.cos(), m * a.sin()))
}

pub fn real_part(a: Number) -> Number {
    match a {
        Number::Complex(re, _) => Number::Real(re),
        other => other,
    }
}

pub fn imag_part(a: Number) -> Number {
    match a {
        Number::Complex(_, im) => Number::Real(im),
        n if n.is_exact() => Number::Int(0),
        _ => Number::Real(0.0),
    }
}

pub fn magnitude(a: Number) -> Number {
    match a {
        Number::Complex(re, im) => Number::Real((re * re + im * im).sqrt()),
        other => abs(other),
    }
}

pub fn angle(a: Number) -> Result<Number> {
    match a {
        Number::Complex(re, im) => Ok(Number::Real(im.atan2(re))),
        other => {
            let x = real_arg("angle", other)?;
            if x < 0.0 {
                Ok(Number::Real(std::f64::consts::PI))
            } else {
                Ok(Number::Real(0.0))
            }
        }
    }
}

/// Simplest rational within `tol` of `x`, per R5RS `rationalize`.
pub fn rationalize(x: Number, tol: Number) -> Result<Number> {
    let exact_in = x.is_exact() && tol.is_exact();
    let x_f = real_arg("rationalize", x)?;
    let tol_f = real_arg("rationalize", tol)?.abs();
    let (lo, hi) = (x_f - tol_f, x_f + tol_f);
    let (n, d) = simplest_between(lo, hi);
    let r = Number::ratio(n, d)?;
    Ok(if exact_in { r } else { to_inexact(r) })
}

fn simplest_between(lo: f64, hi: f64) -> (i128, i128) {
    if lo > 0.0 {
        simplest_positive(lo, hi)
    } else if hi < 0.0 {
        let (n, d) = simplest_positive(-hi, -lo);
        (-n, d)
    } else {
        (0, 1)
    }
}

fn simplest_positive(lo: f64, hi: f64) -> (i128, i128) {
    let fl = lo.floor();
    if fl >= hi.floor() && lo.fract() != 0.0 {
        // no integer in range; recurse on the reciprocal interval
        let (n, d) = simplest_positive(1.0 / (hi - fl), 1.0 / (lo - fl));
        (fl as i128 * n + d, n)
    } else {
        let int = if lo.fract() == 0.0 { lo } else { fl + 1.0 };
        (int as i128, 1)
    }
}

// --- parsing and formatting ------------------------------------------------

/// Parse a numeric literal: radix/exactness prefixes, integers, rationals,
/// decimals (radix 10), and rectangular complex forms. Returns `None` when
/// the text is not a number at all (callers treat it as an identifier).
pub fn parse_number(text: &str, default_radix: u32) -> Option<Number> {
    if !text.is_ascii() {
        return None;
    }
    let mut radix = default_radix;
    let mut exactness: Option<bool> = None;
    let mut s = text;

    while let Some(rest) = s.strip_prefix('#') {
        let (c, rest) = {
            let mut it = rest.chars();
            (it.next()?, it.as_str())
        };
        match c.to_ascii_lowercase() {
            'b' => radix = 2,
            'o' => radix = 8,
            'd' => radix = 10,
            'x' => radix = 16,
            'e' => exactness = Some(true),
            'i' => exactness = Some(false),
            _ => return None,
        }
        s = rest;
    }
    if s.is_empty() {
        return None;
    }

    let n = parse_complex(s, radix)?;
    Some(match exactness {
        Some(true) => to_exact(n).ok()?,
        Some(false) => to_inexact(n),
        None => n,
    })
}

fn parse_complex(s: &str, radix: u32) -> Option<Number> {
    // polar: <real>@<real>
    if let Some(at) = s[1..].find('@').map(|i| i + 1) {
        let mag = parse_real(&s[..at], radix)?;
        let ang = parse_real(&s[at + 1..], radix)?;
        return make_polar(to_inexact(mag), to_inexact(ang)).ok();
    }
    // rectangular: <real><sign><imag>i, <sign><imag>i
    if let Some(stripped) = s.strip_suffix(['i', 'I']) {
        // find the sign that splits real from imaginary (skip a leading
        // sign and any exponent sign)
        let bytes = stripped.as_bytes();
        let mut split = None;
        for i in (1..bytes.len()).rev() {
            let b = bytes[i];
            if (b == b'+' || b == b'-')
                && !matches!(bytes[i - 1], b'e' | b'E')
            {
                split = Some(i);
                break;
            }
        }
        let (re_s, im_s) = match split {
            Some(i) => (&stripped[..i], &stripped[i..]),
            None => ("0", stripped),
        };
        let re = if re_s.is_empty() {
            Number::Int(0)
        } else {
            parse_real(re_s, radix)?
        };
        let im = match im_s {
            "+" => Number::Int(1),
            "-" => Number::Int(-1),
            _ => parse_real(im_s, radix)?,
        };
        let (re, im) = (re.as_f64()?, im.as_f64()?);
        return Some(Number::Complex(re, im));
    }
    parse_real(s, radix)
}

fn parse_real(s: &str, radix: u32) -> Option<Number> {
    if let Some(slash) = s.find('/') {
        let n = parse_int(&s[..slash], radix)?;
        let d = parse_int(&s[slash + 1..], radix)?;
        return Number::ratio(n as i128, d as i128).ok();
    }
    if let Some(n) = parse_int(s, radix) {
        return Some(Number::Int(n));
    }
    if radix == 10 && looks_decimal(s) {
        return s.parse::<f64>().ok().map(Number::Real);
    }
    None
}

fn looks_decimal(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    !body.is_empty()
        && body.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.')
        && body.chars().all(|c| {
            c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')
        })
}

fn parse_int(s: &str, radix: u32) -> Option<i64> {
    let (neg, body) = match s.strip_prefix('-') {
        Some(b) => (true, b),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if body.is_empty() {
        return None;
    }
    let n = i64::from_str_radix(body, radix).ok()?;
    Some(if neg { -n } else { n })
}

/// Render `n` in `radix`. Non-integers in a non-decimal radix render the
/// exact parts in that radix; inexact kinds always render decimal.
pub fn format_number(n: Number, radix: u32) -> String {
    match n {
        Number::Int(i) => format_int(i, radix),
        Number::Ratio(num, den) => {
            format!("{}/{}", format_int(num, radix), format_int(den, radix))
        }
        Number::Real(f) => format_f64(f),
        Number::Complex(re, im) => {
            let sign = if im >= 0.0 || im.is_nan() { "+" } else { "" };
            format!("{}{}{}i", format_f64(re), sign, format_f64(im))
        }
    }
}

fn format_int(i: i64, radix: u32) -> String {
    match radix {
        2 | 8 | 16 => {
            let mag = i.unsigned_abs();
            let digits = match radix {
                2 => format!("{mag:b}"),
                8 => format!("{mag:o}"),
                _ => format!("{mag:x}"),
            };
            if i < 0 { format!("-{digits}") } else { digits }
        }
        _ => i.to_string(),
    }
}

fn format_f64(f: f64) -> String {
    if f.is_nan() {
        "+nan.0".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "+inf.0" } else { "-inf.0" }.to_string()
    } else {
        // Debug formatting keeps the decimal point on whole values (1.0)
        format!("{f:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_reduces_and_collapses() {
        assert_eq!(Number::ratio(6, 4).unwrap(), Number::Ratio(3, 2));
        assert_eq!(Number::ratio(4, 2).unwrap(), Number::Int(2));
        assert_eq!(Number::ratio(1, -2).unwrap(), Number::Ratio(-1, 2));
        assert!(Number::ratio(1, 0).is_err());
    }

    #[test]
    fn test_division_promotes_to_rational() {
        let r = div(Number::Int(1), Number::Int(3)).unwrap();
        assert_eq!(r, Number::Ratio(1, 3));
        let exact = div(Number::Int(8), Number::Int(2)).unwrap();
        assert_eq!(exact, Number::Int(4));
    }

    #[test]
    fn test_overflow_promotes_to_real() {
        let big = Number::Int(i64::MAX);
        match mul(big, big) {
            Number::Real(f) => {
                let expect = i64::MAX as f64 * i64::MAX as f64;
                assert!((f - expect).abs() <= expect * f64::EPSILON);
            }
            other => panic!("expected real, got {other:?}"),
        }
    }

    #[test]
    fn test_eqv_distinguishes_exactness() {
        assert!(!eqv(Number::Int(1), Number::Real(1.0)));
        assert!(num_eq(Number::Int(1), Number::Real(1.0)));
        assert!(eqv(Number::Ratio(1, 2), Number::Ratio(1, 2)));
        assert!(!eqv(Number::Ratio(1, 2), Number::Real(0.5)));
    }

    #[test]
    fn test_compare_rejects_complex() {
        assert!(compare(Number::Complex(1.0, 2.0), Number::Int(1)).is_err());
        assert_eq!(
            compare(Number::Ratio(1, 3), Number::Ratio(1, 2)).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_modulo_vs_remainder() {
        assert_eq!(remainder(-7, 2).unwrap(), -1);
        assert_eq!(modulo(-7, 2).unwrap(), 1);
        assert_eq!(modulo(7, -2).unwrap(), -1);
        assert!(modulo(1, 0).is_err());
    }

    #[test]
    fn test_round_halves_to_even() {
        assert_eq!(round(Number::Ratio(5, 2)).unwrap(), Number::Int(2));
        assert_eq!(round(Number::Ratio(7, 2)).unwrap(), Number::Int(4));
        assert_eq!(round(Number::Ratio(-5, 2)).unwrap(), Number::Int(-2));
    }

    #[test]
    fn test_exact_inexact_round_trip() {
        assert_eq!(to_exact(Number::Real(0.5)).unwrap(), Number::Ratio(1, 2));
        assert_eq!(to_exact(Number::Real(3.0)).unwrap(), Number::Int(3));
        assert_eq!(to_inexact(Number::Ratio(1, 4)), Number::Real(0.25));
        assert!(to_exact(Number::Real(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_sqrt_stays_exact_when_it_can() {
        assert_eq!(sqrt(Number::Int(16)).unwrap(), Number::Int(4));
        assert_eq!(sqrt(Number::Int(2)).unwrap(), Number::Real(2f64.sqrt()));
        match sqrt(Number::Int(-4)).unwrap() {
            Number::Complex(re, im) => {
                assert_eq!(re, 0.0);
                assert_eq!(im, 2.0);
            }
            other => panic!("expected complex, got {other:?}"),
        }
    }

    #[test]
    fn test_expt_exact_and_negative_power() {
        assert_eq!(expt(Number::Int(2), Number::Int(10)).unwrap(), Number::Int(1024));
        assert_eq!(
            expt(Number::Int(2), Number::Int(-2)).unwrap(),
            Number::Ratio(1, 4)
        );
        assert_eq!(
            expt(Number::Ratio(2, 3), Number::Int(2)).unwrap(),
            Number::Ratio(4, 9)
        );
    }

    #[test]
    fn test_parse_radix_and_prefixes() {
        assert_eq!(parse_number("#xff", 10), Some(Number::Int(255)));
        assert_eq!(parse_number("#b101", 10), Some(Number::Int(5)));
        assert_eq!(parse_number("-42", 10), Some(Number::Int(-42)));
        assert_eq!(parse_number("3/4", 10), Some(Number::Ratio(3, 4)));
        assert_eq!(parse_number("1.5e2", 10), Some(Number::Real(150.0)));
        assert_eq!(parse_number("#e0.5", 10), Some(Number::Ratio(1, 2)));
        assert_eq!(parse_number("#i3", 10), Some(Number::Real(3.0)));
        assert_eq!(parse_number("1+2i", 10), Some(Number::Complex(1.0, 2.0)));
        assert_eq!(parse_number("-i", 10), Some(Number::Complex(0.0, -1.0)));
        assert_eq!(parse_number("1e3", 10), Some(Number::Real(1000.0)));
        assert_eq!(parse_number("abc", 10), None);
        assert_eq!(parse_number("1.5", 16), None);
    }

    #[test]
    fn test_format_round_trips() {
        assert_eq!(format_number(Number::Int(255), 16), "ff");
        assert_eq!(format_number(Number::Int(-5), 2), "-101");
        assert_eq!(format_number(Number::Ratio(3, 4), 10), "3/4");
        assert_eq!(format_number(Number::Real(1.0), 10), "1.0");
        assert_eq!(format_number(Number::Complex(1.0, -2.0), 10), "1.0-2.0i");
        assert_eq!(format_number(Number::Complex(0.0, 1.0), 10), "0.0+1.0i");
    }

    #[test]
    fn test_rationalize_finds_simple_fraction() {
        let r = rationalize(Number::Ratio(3, 10), Number::Ratio(1, 10)).unwrap();
        assert_eq!(r, Number::Ratio(1, 3));
    }
}
