//! Character builtins

use crate::procedure::{NativeProc, ProcInfo};
use crate::value::Value;
use rill_core::error::{Condition, type_error};

fn want_char(who: &str, v: Value) -> Result<char, Condition> {
    match v {
        Value::Char(c) => Ok(c),
        other => Err(type_error(who, "character", other.kind_name())),
    }
}

pub static CHAR_P: NativeProc = NativeProc {
    name: "char?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::Char(_)))),
    info: ProcInfo::fixed(1),
};

fn char_compare(
    who: &'static str,
    args: &crate::procedure::Args,
    fold_case: bool,
    keep: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, Condition> {
    let mut prev = want_char(who, args[0])?;
    if fold_case {
        prev = prev.to_ascii_lowercase();
    }
    for v in args.iter().skip(1) {
        let mut next = want_char(who, *v)?;
        if fold_case {
            next = next.to_ascii_lowercase();
        }
        if !keep(prev.cmp(&next)) {
            return Ok(Value::Bool(false));
        }
        prev = next;
    }
    Ok(Value::Bool(true))
}

macro_rules! char_cmp {
    ($static_name:ident, $lisp_name:literal, $fold:literal, $keep:expr) => {
        pub static $static_name: NativeProc = NativeProc {
            name: $lisp_name,
            fun: |_, args| Ok(char_compare($lisp_name, &args, $fold, $keep)?),
            info: ProcInfo::at_least(2),
        };
    };
}

char_cmp!(CHAR_EQ, "char=?", false, |o| o.is_eq());
char_cmp!(CHAR_LT, "char<?", false, |o| o.is_lt());
char_cmp!(CHAR_GT, "char>?", false, |o| o.is_gt());
char_cmp!(CHAR_LE, "char<=?", false, |o| o.is_le());
char_cmp!(CHAR_GE, "char>=?", false, |o| o.is_ge());
char_cmp!(CHAR_CI_EQ, "char-ci=?", true, |o| o.is_eq());
char_cmp!(CHAR_CI_LT, "char-ci<?", true, |o| o.is_lt());
char_cmp!(CHAR_CI_GT, "char-ci>?", true, |o| o.is_gt());
char_cmp!(CHAR_CI_LE, "char-ci<=?", true, |o| o.is_le());
char_cmp!(CHAR_CI_GE, "char-ci>=?", true, |o| o.is_ge());

macro_rules! char_pred {
    ($static_name:ident, $lisp_name:literal, $test:expr) => {
        pub static $static_name: NativeProc = NativeProc {
            name: $lisp_name,
            fun: |_, args| {
                let test: fn(char) -> bool = $test;
                Ok(Value::Bool(test(want_char($lisp_name, args[0])?)))
            },
            info: ProcInfo::fixed(1),
        };
    };
}

char_pred!(CHAR_ALPHABETIC_P, "char-alphabetic?", |c| c.is_ascii_alphabetic());
char_pred!(CHAR_NUMERIC_P, "char-numeric?", |c| c.is_ascii_digit());
char_pred!(CHAR_WHITESPACE_P, "char-whitespace?", |c| c.is_whitespace());
char_pred!(CHAR_UPPER_CASE_P, "char-upper-case?", |c| c.is_ascii_uppercase());
char_pred!(CHAR_LOWER_CASE_P, "char-lower-case?", |c| c.is_ascii_lowercase());

pub static CHAR_TO_INTEGER: NativeProc = NativeProc {
    name: "char->integer",
    fun: |_, args| Ok(Value::Int(want_char("char->integer", args[0])? as i64)),
    info: ProcInfo::fixed(1),
};

pub static INTEGER_TO_CHAR: NativeProc = NativeProc {
    name: "integer->char",
    fun: |_, args| match args[0] {
        Value::Int(n) => match u32::try_from(n).ok().and_then(char::from_u32) {
            Some(c) => Ok(Value::Char(c)),
            None => Err(rill_core::error::range_error("integer->char", n, 0).into()),
        },
        other => Err(type_error("integer->char", "integer", other.kind_name()).into()),
    },
    info: ProcInfo::fixed(1),
};

pub static CHAR_UPCASE: NativeProc = NativeProc {
    name: "char-upcase",
    fun: |_, args| Ok(Value::Char(want_char("char-upcase", args[0])?.to_ascii_uppercase())),
    info: ProcInfo::fixed(1),
};

pub static CHAR_DOWNCASE: NativeProc = NativeProc {
    name: "char-downcase",
    fun: |_, args| Ok(Value::Char(want_char("char-downcase", args[0])?.to_ascii_lowercase())),
    info: ProcInfo::fixed(1),
};
