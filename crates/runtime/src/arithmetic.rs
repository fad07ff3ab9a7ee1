//! Numeric builtins over the core tower
//!
//! Thin marshalling around `rill_core::number`: type checks, folds for
//! the variadic operators, and the comparison chains. Coercion and
//! promotion live in the core kernels.

use crate::procedure::{NativeProc, ProcInfo};
use crate::value::Value;
use rill_core::Number;
use rill_core::error::{Condition, type_error};
use rill_core::number;
use std::cmp::Ordering;

fn want_number(who: &str, v: Value) -> Result<Number, Condition> {
    v.number()
        .ok_or_else(|| type_error(who, "number", v.kind_name()))
}

fn want_int(who: &str, v: Value) -> Result<i64, Condition> {
    match v {
        Value::Int(n) => Ok(n),
        other => Err(type_error(who, "exact integer", other.kind_name())),
    }
}

fn num(n: Number) -> Value {
    Value::from_number(n)
}

// --- predicates ------------------------------------------------------------

macro_rules! number_pred {
    ($static_name:ident, $lisp_name:literal, $test:expr) => {
        pub static $static_name: NativeProc = NativeProc {
            name: $lisp_name,
            fun: |_, args| {
                let test: fn(Number) -> bool = $test;
                Ok(Value::Bool(args[0].number().is_some_and(test)))
            },
            info: ProcInfo::fixed(1),
        };
    };
}

number_pred!(NUMBER_P, "number?", |_| true);
number_pred!(COMPLEX_P, "complex?", |_| true);
number_pred!(REAL_P, "real?", |n| n.is_real());
number_pred!(RATIONAL_P, "rational?", |n| n.is_rational());
number_pred!(INTEGER_P, "integer?", |n| n.is_integer());
number_pred!(EXACT_P, "exact?", |n| n.is_exact());
number_pred!(INEXACT_P, "inexact?", |n| !n.is_exact());
number_pred!(ZERO_P, "zero?", |n| n.is_zero());
number_pred!(POSITIVE_P, "positive?", |n| {
    number::compare(n, Number::Int(0)) == Ok(Ordering::Greater)
});
number_pred!(NEGATIVE_P, "negative?", |n| {
    number::compare(n, Number::Int(0)) == Ok(Ordering::Less)
});
number_pred!(ODD_P, "odd?", |n| matches!(n, Number::Int(i) if i % 2 != 0));
number_pred!(EVEN_P, "even?", |n| matches!(n, Number::Int(i) if i % 2 == 0));

// --- comparisons -----------------------------------------------------------

fn compare_chain(
    who: &'static str,
    args: &crate::procedure::Args,
    keep: fn(Ordering) -> bool,
) -> Result<Value, Condition> {
    let mut prev = want_number(who, args[0])?;
    for v in args.iter().skip(1) {
        let next = want_number(who, *v)?;
        if !keep(number::compare(prev, next)?) {
            return Ok(Value::Bool(false));
        }
        prev = next;
    }
    Ok(Value::Bool(true))
}

pub static NUM_EQ: NativeProc = NativeProc {
    name: "=",
    fun: |_, args| {
        let mut prev = want_number("=", args[0])?;
        for v in args.iter().skip(1) {
            let next = want_number("=", *v)?;
            if !number::num_eq(prev, next) {
                return Ok(Value::Bool(false));
            }
            prev = next;
        }
        Ok(Value::Bool(true))
    },
    info: ProcInfo::at_least(2),
};

pub static NUM_LT: NativeProc = NativeProc {
    name: "<",
    fun: |_, args| Ok(compare_chain("<", &args, |o| o == Ordering::Less)?),
    info: ProcInfo::at_least(2),
};

pub static NUM_GT: NativeProc = NativeProc {
    name: ">",
    fun: |_, args| Ok(compare_chain(">", &args, |o| o == Ordering::Greater)?),
    info: ProcInfo::at_least(2),
};

pub static NUM_LE: NativeProc = NativeProc {
    name: "<=",
    fun: |_, args| Ok(compare_chain("<=", &args, |o| o != Ordering::Greater)?),
    info: ProcInfo::at_least(2),
};

pub static NUM_GE: NativeProc = NativeProc {
    name: ">=",
    fun: |_, args| Ok(compare_chain(">=", &args, |o| o != Ordering::Less)?),
    info: ProcInfo::at_least(2),
};

fn extremum(who: &'static str, args: &crate::procedure::Args, want: Ordering) -> Result<Value, Condition> {
    let mut best = want_number(who, args[0])?;
    let mut saw_inexact = !best.is_exact();
    for v in args.iter().skip(1) {
        let n = want_number(who, *v)?;
        saw_inexact |= !n.is_exact();
        if number::compare(n, best)? == want {
            best = n;
        }
    }
    Ok(num(if saw_inexact {
        number::to_inexact(best)
    } else {
        best
    }))
}

pub static MAX: NativeProc = NativeProc {
    name: "max",
    fun: |_, args| Ok(extremum("max", &args, Ordering::Greater)?),
    info: ProcInfo::at_least(1),
};

pub static MIN: NativeProc = NativeProc {
    name: "min",
    fun: |_, args| Ok(extremum("min", &args, Ordering::Less)?),
    info: ProcInfo::at_least(1),
};

// --- arithmetic ------------------------------------------------------------

pub static ADD: NativeProc = NativeProc {
    name: "+",
    fun: |_, args| {
        let mut acc = Number::Int(0);
        for v in args.iter() {
            acc = number::add(acc, want_number("+", *v)?);
        }
        Ok(num(acc))
    },
    info: ProcInfo::at_least(0),
};

pub static MUL: NativeProc = NativeProc {
    name: "*",
    fun: |_, args| {
        let mut acc = Number::Int(1);
        for v in args.iter() {
            acc = number::mul(acc, want_number("*", *v)?);
        }
        Ok(num(acc))
    },
    info: ProcInfo::at_least(0),
};

pub static SUB: NativeProc = NativeProc {
    name: "-",
    fun: |_, args| {
        let first = want_number("-", args[0])?;
        if args.len() == 1 {
            return Ok(num(number::neg(first)));
        }
        let mut acc = first;
        for v in args.iter().skip(1) {
            acc = number::sub(acc, want_number("-", *v)?);
        }
        Ok(num(acc))
    },
    info: ProcInfo::at_least(1),
};

pub static DIV: NativeProc = NativeProc {
    name: "/",
    fun: |_, args| {
        let first = want_number("/", args[0])?;
        if args.len() == 1 {
            return Ok(num(number::div(Number::Int(1), first)?));
        }
        let mut acc = first;
        for v in args.iter().skip(1) {
            acc = number::div(acc, want_number("/", *v)?)?;
        }
        Ok(num(acc))
    },
    info: ProcInfo::at_least(1),
};

pub static ABS: NativeProc = NativeProc {
    name: "abs",
    fun: |_, args| Ok(num(number::abs(want_number("abs", args[0])?))),
    info: ProcInfo::fixed(1),
};

pub static QUOTIENT: NativeProc = NativeProc {
    name: "quotient",
    fun: |_, args| {
        let (a, b) = (want_int("quotient", args[0])?, want_int("quotient", args[1])?);
        Ok(Value::Int(number::quotient(a, b)?))
    },
    info: ProcInfo::fixed(2),
};

pub static REMAINDER: NativeProc = NativeProc {
    name: "remainder",
    fun: |_, args| {
        let (a, b) = (want_int("remainder", args[0])?, want_int("remainder", args[1])?);
        Ok(Value::Int(number::remainder(a, b)?))
    },
    info: ProcInfo::fixed(2),
};

pub static MODULO: NativeProc = NativeProc {
    name: "modulo",
    fun: |_, args| {
        let (a, b) = (want_int("modulo", args[0])?, want_int("modulo", args[1])?);
        Ok(Value::Int(number::modulo(a, b)?))
    },
    info: ProcInfo::fixed(2),
};

pub static GCD: NativeProc = NativeProc {
    name: "gcd",
    fun: |_, args| {
        let mut acc = 0i64;
        for v in args.iter() {
            acc = number::gcd_i64(acc, want_int("gcd", *v)?);
        }
        Ok(Value::Int(acc))
    },
    info: ProcInfo::at_least(0),
};

pub static LCM: NativeProc = NativeProc {
    name: "lcm",
    fun: |_, args| {
        let mut acc = Number::Int(1);
        for v in args.iter() {
            let n = want_int("lcm", *v)?;
            acc = match acc {
                Number::Int(a) => number::lcm(a, n),
                // an earlier overflow already forced the real rung
                other => number::mul(other, Number::Int(n)),
            };
        }
        Ok(num(number::abs(acc)))
    },
    info: ProcInfo::at_least(0),
};

// --- selectors and rounding ------------------------------------------------

macro_rules! unary_numeric {
    ($static_name:ident, $lisp_name:literal, $kernel:path) => {
        pub static $static_name: NativeProc = NativeProc {
            name: $lisp_name,
            fun: |_, args| Ok(num($kernel(want_number($lisp_name, args[0])?)?)),
            info: ProcInfo::fixed(1),
        };
    };
}

unary_numeric!(FLOOR, "floor", number::floor);
unary_numeric!(CEILING, "ceiling", number::ceiling);
unary_numeric!(TRUNCATE, "truncate", number::truncate);
unary_numeric!(ROUND, "round", number::round);
unary_numeric!(NUMERATOR, "numerator", number::numerator);
unary_numeric!(DENOMINATOR, "denominator", number::denominator);
unary_numeric!(EXP, "exp", number::exp);
unary_numeric!(LOG, "log", number::log);
unary_numeric!(SIN, "sin", number::sin);
unary_numeric!(COS, "cos", number::cos);
unary_numeric!(TAN, "tan", number::tan);
unary_numeric!(ASIN, "asin", number::asin);
unary_numeric!(ACOS, "acos", number::acos);
unary_numeric!(SQRT, "sqrt", number::sqrt);
unary_numeric!(ANGLE, "angle", number::angle);

pub static ATAN: NativeProc = NativeProc {
    name: "atan",
    fun: |_, args| {
        let y = want_number("atan", args[0])?;
        match args.get(1) {
            None => Ok(num(number::atan(y)?)),
            Some(x) => Ok(num(number::atan2(y, want_number("atan", x.clone())?)?)),
        }
    },
    info: ProcInfo::between(1, 2),
};

pub static EXPT: NativeProc = NativeProc {
    name: "expt",
    fun: |_, args| {
        let base = want_number("expt", args[0])?;
        let power = want_number("expt", args[1])?;
        Ok(num(number::expt(base, power)?))
    },
    info: ProcInfo::fixed(2),
};

pub static MAKE_RECTANGULAR: NativeProc = NativeProc {
    name: "make-rectangular",
    fun: |_, args| {
        let re = want_number("make-rectangular", args[0])?;
        let im = want_number("make-rectangular", args[1])?;
        Ok(num(number::make_rectangular(re, im)?))
    },
    info: ProcInfo::fixed(2),
};

pub static MAKE_POLAR: NativeProc = NativeProc {
    name: "make-polar",
    fun: |_, args| {
        let mag = want_number("make-polar", args[0])?;
        let ang = want_number("make-polar", args[1])?;
        Ok(num(number::make_polar(mag, ang)?))
    },
    info: ProcInfo::fixed(2),
};

pub static REAL_PART: NativeProc = NativeProc {
    name: "real-part",
    fun: |_, args| Ok(num(number::real_part(want_number("real-part", args[0])?))),
    info: ProcInfo::fixed(1),
};

pub static IMAG_PART: NativeProc = NativeProc {
    name: "imag-part",
    fun: |_, args| Ok(num(number::imag_part(want_number("imag-part", args[0])?))),
    info: ProcInfo::fixed(1),
};

pub static MAGNITUDE: NativeProc = NativeProc {
    name: "magnitude",
    fun: |_, args| Ok(num(number::magnitude(want_number("magnitude", args[0])?))),
    info: ProcInfo::fixed(1),
};

pub static RATIONALIZE: NativeProc = NativeProc {
    name: "rationalize",
    fun: |_, args| {
        let x = want_number("rationalize", args[0])?;
        let tol = want_number("rationalize", args[1])?;
        Ok(num(number::rationalize(x, tol)?))
    },
    info: ProcInfo::fixed(2),
};

pub static EXACT_TO_INEXACT: NativeProc = NativeProc {
    name: "exact->inexact",
    fun: |_, args| {
        Ok(num(number::to_inexact(want_number(
            "exact->inexact",
            args[0],
        )?)))
    },
    info: ProcInfo::fixed(1),
};

pub static INEXACT_TO_EXACT: NativeProc = NativeProc {
    name: "inexact->exact",
    fun: |_, args| {
        Ok(num(number::to_exact(want_number(
            "inexact->exact",
            args[0],
        )?)?))
    },
    info: ProcInfo::fixed(1),
};

// --- text ------------------------------------------------------------------

fn want_radix(who: &str, v: Option<Value>) -> Result<u32, Condition> {
    match v {
        None => Ok(10),
        Some(Value::Int(r @ (2 | 8 | 10 | 16))) => Ok(r as u32),
        Some(other) => Err(type_error(who, "radix (2, 8, 10, or 16)", other.kind_name())),
    }
}

pub static NUMBER_TO_STRING: NativeProc = NativeProc {
    name: "number->string",
    fun: |interp, args| {
        let n = want_number("number->string", args[0])?;
        let radix = want_radix("number->string", args.get(1))?;
        Ok(interp.heap.str_value(number::format_number(n, radix)))
    },
    info: ProcInfo::between(1, 2),
};

pub static STRING_TO_NUMBER: NativeProc = NativeProc {
    name: "string->number",
    fun: |interp, args| {
        let text = match args[0] {
            Value::Str(h) => interp.heap.string(h).to_string(),
            other => return Err(type_error("string->number", "string", other.kind_name()).into()),
        };
        let radix = want_radix("string->number", args.get(1))?;
        Ok(match number::parse_number(&text, radix) {
            Some(n) => num(n),
            None => Value::Bool(false),
        })
    },
    info: ProcInfo::between(1, 2),
};
