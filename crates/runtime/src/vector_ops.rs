//! Vector builtins

use crate::cons::{list_from, list_to_vec};
use crate::procedure::{NativeProc, ProcInfo};
use crate::value::Value;
use rill_core::error::{Condition, range_error, type_error};

fn want_vector(who: &str, v: Value) -> Result<crate::heap::Handle, Condition> {
    match v {
        Value::Vector(h) => Ok(h),
        other => Err(type_error(who, "vector", other.kind_name())),
    }
}

fn want_index(who: &str, v: Value, len: usize) -> Result<usize, Condition> {
    match v {
        Value::Int(n) if n >= 0 && (n as usize) < len => Ok(n as usize),
        Value::Int(n) => Err(range_error(who, n, len)),
        other => Err(type_error(who, "index", other.kind_name())),
    }
}

pub static VECTOR_P: NativeProc = NativeProc {
    name: "vector?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::Vector(_)))),
    info: ProcInfo::fixed(1),
};

pub static MAKE_VECTOR: NativeProc = NativeProc {
    name: "make-vector",
    fun: |interp, args| {
        let n = match args[0] {
            Value::Int(n) if n >= 0 => n as usize,
            other => {
                return Err(type_error("make-vector", "nonnegative integer", other.kind_name()).into());
            }
        };
        let fill = args.get(1).unwrap_or(Value::Int(0));
        Ok(interp.heap.vector_value(vec![fill; n]))
    },
    info: ProcInfo::between(1, 2),
};

pub static VECTOR: NativeProc = NativeProc {
    name: "vector",
    fun: |interp, args| Ok(interp.heap.vector_value(args.into_vec())),
    info: ProcInfo::at_least(0),
};

pub static VECTOR_LENGTH: NativeProc = NativeProc {
    name: "vector-length",
    fun: |interp, args| {
        let h = want_vector("vector-length", args[0])?;
        Ok(Value::Int(interp.heap.vector(h).len() as i64))
    },
    info: ProcInfo::fixed(1),
};

pub static VECTOR_REF: NativeProc = NativeProc {
    name: "vector-ref",
    fun: |interp, args| {
        let h = want_vector("vector-ref", args[0])?;
        let len = interp.heap.vector(h).len();
        let i = want_index("vector-ref", args[1], len)?;
        Ok(interp.heap.vector(h)[i])
    },
    info: ProcInfo::fixed(2),
};

pub static VECTOR_SET: NativeProc = NativeProc {
    name: "vector-set!",
    fun: |interp, args| {
        let h = want_vector("vector-set!", args[0])?;
        let len = interp.heap.vector(h).len();
        let i = want_index("vector-set!", args[1], len)?;
        interp.heap.vector_mut(h)[i] = args[2];
        Ok(args[2])
    },
    info: ProcInfo::fixed(3),
};

pub static VECTOR_TO_LIST: NativeProc = NativeProc {
    name: "vector->list",
    fun: |interp, args| {
        let h = want_vector("vector->list", args[0])?;
        let elems = interp.heap.vector(h).clone();
        Ok(list_from(&mut interp.heap, elems))
    },
    info: ProcInfo::fixed(1),
};

pub static LIST_TO_VECTOR: NativeProc = NativeProc {
    name: "list->vector",
    fun: |interp, args| {
        let items = list_to_vec(&interp.heap, "list->vector", args[0])?;
        Ok(interp.heap.vector_value(items))
    },
    info: ProcInfo::fixed(1),
};

pub static VECTOR_FILL: NativeProc = NativeProc {
    name: "vector-fill!",
    fun: |interp, args| {
        let h = want_vector("vector-fill!", args[0])?;
        for slot in interp.heap.vector_mut(h).iter_mut() {
            *slot = args[1];
        }
        Ok(args[0])
    },
    info: ProcInfo::fixed(2),
};
