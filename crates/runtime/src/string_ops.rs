//! String and symbol builtins

use crate::cons::{list_from, list_to_vec};
use crate::procedure::{NativeProc, ProcInfo};
use crate::value::Value;
use rill_core::error::{Condition, range_error, type_error};

fn want_str(who: &str, v: Value) -> Result<crate::heap::Handle, Condition> {
    match v {
        Value::Str(h) => Ok(h),
        other => Err(type_error(who, "string", other.kind_name())),
    }
}

fn want_char(who: &str, v: Value) -> Result<char, Condition> {
    match v {
        Value::Char(c) => Ok(c),
        other => Err(type_error(who, "character", other.kind_name())),
    }
}

fn want_index(who: &str, v: Value, len: usize) -> Result<usize, Condition> {
    match v {
        Value::Int(n) if n >= 0 && (n as usize) < len => Ok(n as usize),
        Value::Int(n) => Err(range_error(who, n, len)),
        other => Err(type_error(who, "index", other.kind_name())),
    }
}

pub static STRING_P: NativeProc = NativeProc {
    name: "string?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::Str(_)))),
    info: ProcInfo::fixed(1),
};

pub static MAKE_STRING: NativeProc = NativeProc {
    name: "make-string",
    fun: |interp, args| {
        let n = match args[0] {
            Value::Int(n) if n >= 0 => n as usize,
            other => {
                return Err(type_error("make-string", "nonnegative integer", other.kind_name()).into());
            }
        };
        let fill = match args.get(1) {
            None => ' ',
            Some(v) => want_char("make-string", v)?,
        };
        Ok(interp.heap.str_value(fill.to_string().repeat(n)))
    },
    info: ProcInfo::between(1, 2),
};

pub static STRING: NativeProc = NativeProc {
    name: "string",
    fun: |interp, args| {
        let mut s = String::with_capacity(args.len());
        for v in args.iter() {
            s.push(want_char("string", *v)?);
        }
        Ok(interp.heap.str_value(s))
    },
    info: ProcInfo::at_least(0),
};

pub static STRING_LENGTH: NativeProc = NativeProc {
    name: "string-length",
    fun: |interp, args| {
        let h = want_str("string-length", args[0])?;
        Ok(Value::Int(interp.heap.string(h).chars().count() as i64))
    },
    info: ProcInfo::fixed(1),
};

pub static STRING_REF: NativeProc = NativeProc {
    name: "string-ref",
    fun: |interp, args| {
        let h = want_str("string-ref", args[0])?;
        let chars: Vec<char> = interp.heap.string(h).chars().collect();
        let i = want_index("string-ref", args[1], chars.len())?;
        Ok(Value::Char(chars[i]))
    },
    info: ProcInfo::fixed(2),
};

pub static STRING_SET: NativeProc = NativeProc {
    name: "string-set!",
    fun: |interp, args| {
        let h = want_str("string-set!", args[0])?;
        let c = want_char("string-set!", args[2])?;
        let mut chars: Vec<char> = interp.heap.string(h).chars().collect();
        let i = want_index("string-set!", args[1], chars.len())?;
        chars[i] = c;
        *interp.heap.string_mut(h) = chars.into_iter().collect();
        Ok(args[2])
    },
    info: ProcInfo::fixed(3),
};

fn string_compare(
    who: &'static str,
    args: &crate::procedure::Args,
    interp: &crate::interp::Interpreter,
    fold_case: bool,
    keep: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, Condition> {
    let mut prev = interp.heap.string(want_str(who, args[0])?).to_string();
    if fold_case {
        prev = prev.to_lowercase();
    }
    for v in args.iter().skip(1) {
        let mut next = interp.heap.string(want_str(who, *v)?).to_string();
        if fold_case {
            next = next.to_lowercase();
        }
        if !keep(prev.cmp(&next)) {
            return Ok(Value::Bool(false));
        }
        prev = next;
    }
    Ok(Value::Bool(true))
}

macro_rules! string_cmp {
    ($static_name:ident, $lisp_name:literal, $fold:literal, $keep:expr) => {
        pub static $static_name: NativeProc = NativeProc {
            name: $lisp_name,
            fun: |interp, args| Ok(string_compare($lisp_name, &args, interp, $fold, $keep)?),
            info: ProcInfo::at_least(2),
        };
    };
}

string_cmp!(STRING_EQ, "string=?", false, |o| o.is_eq());
string_cmp!(STRING_LT, "string<?", false, |o| o.is_lt());
string_cmp!(STRING_GT, "string>?", false, |o| o.is_gt());
string_cmp!(STRING_LE, "string<=?", false, |o| o.is_le());
string_cmp!(STRING_GE, "string>=?", false, |o| o.is_ge());
string_cmp!(STRING_CI_EQ, "string-ci=?", true, |o| o.is_eq());
string_cmp!(STRING_CI_LT, "string-ci<?", true, |o| o.is_lt());
string_cmp!(STRING_CI_GT, "string-ci>?", true, |o| o.is_gt());
string_cmp!(STRING_CI_LE, "string-ci<=?", true, |o| o.is_le());
string_cmp!(STRING_CI_GE, "string-ci>=?", true, |o| o.is_ge());

pub static SUBSTRING: NativeProc = NativeProc {
    name: "substring",
    fun: |interp, args| {
        let h = want_str("substring", args[0])?;
        let chars: Vec<char> = interp.heap.string(h).chars().collect();
        let start = match args[1] {
            Value::Int(n) if n >= 0 && (n as usize) <= chars.len() => n as usize,
            other => return Err(type_error("substring", "start index", other.kind_name()).into()),
        };
        let end = match args[2] {
            Value::Int(n) if (n as usize) >= start && (n as usize) <= chars.len() => n as usize,
            Value::Int(n) => return Err(range_error("substring", n, chars.len()).into()),
            other => return Err(type_error("substring", "end index", other.kind_name()).into()),
        };
        let s: String = chars[start..end].iter().collect();
        Ok(interp.heap.str_value(s))
    },
    info: ProcInfo::fixed(3),
};

pub static STRING_APPEND: NativeProc = NativeProc {
    name: "string-append",
    fun: |interp, args| {
        let mut out = String::new();
        for v in args.iter() {
            out.push_str(interp.heap.string(want_str("string-append", *v)?));
        }
        Ok(interp.heap.str_value(out))
    },
    info: ProcInfo::at_least(0),
};

pub static STRING_TO_LIST: NativeProc = NativeProc {
    name: "string->list",
    fun: |interp, args| {
        let h = want_str("string->list", args[0])?;
        let chars: Vec<Value> = interp.heap.string(h).chars().map(Value::Char).collect();
        Ok(list_from(&mut interp.heap, chars))
    },
    info: ProcInfo::fixed(1),
};

pub static LIST_TO_STRING: NativeProc = NativeProc {
    name: "list->string",
    fun: |interp, args| {
        let items = list_to_vec(&interp.heap, "list->string", args[0])?;
        let mut s = String::with_capacity(items.len());
        for v in items {
            s.push(want_char("list->string", v)?);
        }
        Ok(interp.heap.str_value(s))
    },
    info: ProcInfo::fixed(1),
};

pub static STRING_COPY: NativeProc = NativeProc {
    name: "string-copy",
    fun: |interp, args| {
        let h = want_str("string-copy", args[0])?;
        let s = interp.heap.string(h).to_string();
        Ok(interp.heap.str_value(s))
    },
    info: ProcInfo::fixed(1),
};

pub static STRING_FILL: NativeProc = NativeProc {
    name: "string-fill!",
    fun: |interp, args| {
        let h = want_str("string-fill!", args[0])?;
        let c = want_char("string-fill!", args[1])?;
        let n = interp.heap.string(h).chars().count();
        *interp.heap.string_mut(h) = c.to_string().repeat(n);
        Ok(args[0])
    },
    info: ProcInfo::fixed(2),
};

// --- symbols ---------------------------------------------------------------

pub static SYMBOL_P: NativeProc = NativeProc {
    name: "symbol?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::Sym(_)))),
    info: ProcInfo::fixed(1),
};

pub static SYMBOL_TO_STRING: NativeProc = NativeProc {
    name: "symbol->string",
    fun: |interp, args| match args[0] {
        Value::Sym(id) => {
            let name = interp.symbols.name(id).to_string();
            Ok(interp.heap.str_value(name))
        }
        other => Err(type_error("symbol->string", "symbol", other.kind_name()).into()),
    },
    info: ProcInfo::fixed(1),
};

pub static STRING_TO_SYMBOL: NativeProc = NativeProc {
    name: "string->symbol",
    fun: |interp, args| {
        let h = want_str("string->symbol", args[0])?;
        let name = interp.heap.string(h).to_string();
        Ok(Value::Sym(interp.symbols.intern(&name)))
    },
    info: ProcInfo::fixed(1),
};
