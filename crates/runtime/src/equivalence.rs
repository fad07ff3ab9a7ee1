//! Equivalence predicates and the boolean builtins
//!
//! `eq?` is identity, `eqv?` adds the number rule (same kind, same
//! value), `equal?` recurses through pairs, vectors, and strings.

use crate::interp::Interpreter;
use crate::procedure::{NativeProc, ProcInfo};
use crate::value::Value;
use rill_core::number;

/// `eqv?` semantics over values.
pub fn eqv_values(_interp: &Interpreter, a: Value, b: Value) -> bool {
    if let (Some(x), Some(y)) = (a.number(), b.number()) {
        return number::eqv(x, y);
    }
    a == b
}

/// `equal?` semantics: structural over containers, `eqv?` at the leaves.
pub fn equal_values(interp: &Interpreter, a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Pair(x), Value::Pair(y)) => {
            if x == y {
                return true;
            }
            let (xa, xd) = interp.heap.pair(x);
            let (ya, yd) = interp.heap.pair(y);
            equal_values(interp, xa, ya) && equal_values(interp, xd, yd)
        }
        (Value::Vector(x), Value::Vector(y)) => {
            let xs = interp.heap.vector(x);
            let ys = interp.heap.vector(y);
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(p, q)| equal_values(interp, *p, *q))
        }
        (Value::Str(x), Value::Str(y)) => interp.heap.string(x) == interp.heap.string(y),
        _ => eqv_values(interp, a, b),
    }
}

pub static EQ_P: NativeProc = NativeProc {
    name: "eq?",
    fun: |_, args| Ok(Value::Bool(args[0] == args[1])),
    info: ProcInfo::fixed(2),
};

pub static EQV_P: NativeProc = NativeProc {
    name: "eqv?",
    fun: |interp, args| Ok(Value::Bool(eqv_values(interp, args[0], args[1]))),
    info: ProcInfo::fixed(2),
};

pub static EQUAL_P: NativeProc = NativeProc {
    name: "equal?",
    fun: |interp, args| Ok(Value::Bool(equal_values(interp, args[0], args[1]))),
    info: ProcInfo::fixed(2),
};

pub static NOT: NativeProc = NativeProc {
    name: "not",
    fun: |_, args| Ok(Value::Bool(!args[0].is_true())),
    info: ProcInfo::fixed(1),
};

pub static BOOLEAN_P: NativeProc = NativeProc {
    name: "boolean?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::Bool(_)))),
    info: ProcInfo::fixed(1),
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cons::list_from;

    #[test]
    fn test_eqv_number_rule() {
        let interp = Interpreter::new();
        assert!(!eqv_values(&interp, Value::Int(1), Value::Real(1.0)));
        assert!(eqv_values(&interp, Value::Int(1), Value::Int(1)));
        assert!(eqv_values(&interp, Value::Ratio(1, 2), Value::Ratio(1, 2)));
    }

    #[test]
    fn test_equal_recurses() {
        let mut interp = Interpreter::new();
        let a = list_from(&mut interp.heap, vec![Value::Int(1), Value::Int(2)]);
        let b = list_from(&mut interp.heap, vec![Value::Int(1), Value::Int(2)]);
        assert!(a != b);
        assert!(equal_values(&interp, a, b));

        let s1 = interp.heap.str_value("abc".to_string());
        let s2 = interp.heap.str_value("abc".to_string());
        assert!(s1 != s2);
        assert!(equal_values(&interp, s1, s2));
    }
}
