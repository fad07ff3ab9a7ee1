//! Pair and list builtins

use crate::cons::{ConsIter, GrowList, list_from, list_length, nth, nth_cdr};
use crate::equivalence::{equal_values, eqv_values};
use crate::interp::Interpreter;
use crate::procedure::{NativeProc, ProcInfo};
use crate::value::Value;
use rill_core::error::type_error;

fn want_pair(who: &str, v: Value) -> Result<crate::heap::Handle, rill_core::Condition> {
    match v {
        Value::Pair(h) => Ok(h),
        other => Err(type_error(who, "pair", other.kind_name())),
    }
}

fn want_list_index(who: &str, v: Value) -> Result<usize, rill_core::Condition> {
    match v {
        Value::Int(n) if n >= 0 => Ok(n as usize),
        other => Err(type_error(who, "nonnegative integer", other.kind_name())),
    }
}

pub static PAIR_P: NativeProc = NativeProc {
    name: "pair?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::Pair(_)))),
    info: ProcInfo::fixed(1),
};

pub static NULL_P: NativeProc = NativeProc {
    name: "null?",
    fun: |_, args| Ok(Value::Bool(args[0].is_nil())),
    info: ProcInfo::fixed(1),
};

pub static CONS: NativeProc = NativeProc {
    name: "cons",
    fun: |interp, args| Ok(interp.heap.pair_value(args[0], args[1])),
    info: ProcInfo::fixed(2),
};

pub static CAR: NativeProc = NativeProc {
    name: "car",
    fun: |interp, args| Ok(interp.heap.car(want_pair("car", args[0])?)),
    info: ProcInfo::fixed(1),
};

pub static CDR: NativeProc = NativeProc {
    name: "cdr",
    fun: |interp, args| Ok(interp.heap.cdr(want_pair("cdr", args[0])?)),
    info: ProcInfo::fixed(1),
};

pub static SET_CAR: NativeProc = NativeProc {
    name: "set-car!",
    fun: |interp, args| {
        let h = want_pair("set-car!", args[0])?;
        interp.heap.set_car(h, args[1]);
        Ok(args[1])
    },
    info: ProcInfo::fixed(2),
};

pub static SET_CDR: NativeProc = NativeProc {
    name: "set-cdr!",
    fun: |interp, args| {
        let h = want_pair("set-cdr!", args[0])?;
        interp.heap.set_cdr(h, args[1]);
        Ok(args[1])
    },
    info: ProcInfo::fixed(2),
};

pub static LIST_P: NativeProc = NativeProc {
    name: "list?",
    fun: |interp, args| Ok(Value::Bool(is_proper_list(interp, args[0]))),
    info: ProcInfo::fixed(1),
};

/// Cycle-safe proper-list test (tortoise and hare).
fn is_proper_list(interp: &Interpreter, v: Value) -> bool {
    let mut slow = v;
    let mut fast = v;
    loop {
        match fast {
            Value::Nil => return true,
            Value::Pair(h) => fast = interp.heap.cdr(h),
            _ => return false,
        }
        match fast {
            Value::Nil => return true,
            Value::Pair(h) => fast = interp.heap.cdr(h),
            _ => return false,
        }
        let Value::Pair(sh) = slow else { unreachable!() };
        slow = interp.heap.cdr(sh);
        if slow == fast {
            return false;
        }
    }
}

pub static LIST: NativeProc = NativeProc {
    name: "list",
    fun: |interp, args| Ok(list_from(&mut interp.heap, args.into_vec())),
    info: ProcInfo::at_least(0),
};

pub static LIST_STAR: NativeProc = NativeProc {
    name: "list*",
    fun: |interp, args| {
        let vals = args.into_vec();
        let (last, init) = vals.split_last().expect("arity checked");
        let mut gl = GrowList::new();
        for v in init {
            gl.push(&mut interp.heap, *v);
        }
        Ok(gl.extract_with_tail(&mut interp.heap, *last))
    },
    info: ProcInfo::at_least(1),
};

pub static LENGTH: NativeProc = NativeProc {
    name: "length",
    fun: |interp, args| match list_length(&interp.heap, args[0]) {
        Some(n) => Ok(Value::Int(n as i64)),
        None => Err(type_error("length", "proper list", args[0].kind_name()).into()),
    },
    info: ProcInfo::fixed(1),
};

pub static REVERSE: NativeProc = NativeProc {
    name: "reverse",
    fun: |interp, args| {
        let mut out = Value::Nil;
        let mut it = ConsIter::new(&interp.heap, args[0]);
        let items: Vec<Value> = it.by_ref().collect();
        if !it.rest().is_nil() {
            return Err(type_error("reverse", "proper list", args[0].kind_name()).into());
        }
        for v in items {
            out = interp.heap.pair_value(v, out);
        }
        Ok(out)
    },
    info: ProcInfo::fixed(1),
};

pub static LIST_TAIL: NativeProc = NativeProc {
    name: "list-tail",
    fun: |interp, args| {
        let n = want_list_index("list-tail", args[1])?;
        Ok(nth_cdr(&interp.heap, "list-tail", args[0], n)?)
    },
    info: ProcInfo::fixed(2),
};

pub static LIST_REF: NativeProc = NativeProc {
    name: "list-ref",
    fun: |interp, args| {
        let n = want_list_index("list-ref", args[1])?;
        Ok(nth(&interp.heap, "list-ref", args[0], n)?)
    },
    info: ProcInfo::fixed(2),
};

fn member_by(
    interp: &Interpreter,
    key: Value,
    list: Value,
    same: impl Fn(&Interpreter, Value, Value) -> bool,
) -> Value {
    let mut cur = list;
    while let Value::Pair(h) = cur {
        let (car, cdr) = interp.heap.pair(h);
        if same(interp, key, car) {
            return cur;
        }
        cur = cdr;
    }
    Value::Bool(false)
}

fn assoc_by(
    interp: &Interpreter,
    key: Value,
    alist: Value,
    same: impl Fn(&Interpreter, Value, Value) -> bool,
) -> Value {
    let mut cur = alist;
    while let Value::Pair(h) = cur {
        let (entry, cdr) = interp.heap.pair(h);
        if let Value::Pair(eh) = entry
            && same(interp, key, interp.heap.car(eh))
        {
            return entry;
        }
        cur = cdr;
    }
    Value::Bool(false)
}

pub static MEMQ: NativeProc = NativeProc {
    name: "memq",
    fun: |interp, args| Ok(member_by(interp, args[0], args[1], |_, a, b| a == b)),
    info: ProcInfo::fixed(2),
};

pub static MEMV: NativeProc = NativeProc {
    name: "memv",
    fun: |interp, args| Ok(member_by(interp, args[0], args[1], eqv_values)),
    info: ProcInfo::fixed(2),
};

pub static MEMBER: NativeProc = NativeProc {
    name: "member",
    fun: |interp, args| Ok(member_by(interp, args[0], args[1], equal_values)),
    info: ProcInfo::fixed(2),
};

pub static ASSQ: NativeProc = NativeProc {
    name: "assq",
    fun: |interp, args| Ok(assoc_by(interp, args[0], args[1], |_, a, b| a == b)),
    info: ProcInfo::fixed(2),
};

pub static ASSV: NativeProc = NativeProc {
    name: "assv",
    fun: |interp, args| Ok(assoc_by(interp, args[0], args[1], eqv_values)),
    info: ProcInfo::fixed(2),
};

pub static ASSOC: NativeProc = NativeProc {
    name: "assoc",
    fun: |interp, args| Ok(assoc_by(interp, args[0], args[1], equal_values)),
    info: ProcInfo::fixed(2),
};
