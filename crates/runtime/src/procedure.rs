//! Procedure kinds and calling-convention descriptors
//!
//! Every callable carries a `ProcInfo`: its arity window plus two
//! disciplines — `Passing` (how the evaluator prepares arguments) and
//! `Returning` (what happens to the result). Interpreted procedures add a
//! body, parameter list, and closure frame; natives are static registry
//! entries holding a plain function pointer.

use crate::heap::{Handle, Heap};
use crate::interp::Interpreter;
use crate::sclosure::is_identifier;
use crate::value::{EvalResult, Value};
use rill_core::SymbolId;
use rill_core::error::{Result, arity_error, syntax_error};

/// How arguments reach the callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passing {
    /// Evaluate each argument left to right.
    Eval,
    /// Pass each argument cell unevaluated (traditional macro call).
    Quote,
    /// Pass the whole call form plus the current environment.
    Whole,
}

/// What the evaluator does with the returned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    /// The value is the result.
    Pass,
    /// The value is code: push it back and evaluate (macro expansion).
    Code,
    /// The value is a list spliced into the pending argument marshalling.
    Splice,
}

#[derive(Debug, Clone, Copy)]
pub struct ProcInfo {
    pub required: usize,
    /// `None` = variadic.
    pub max: Option<usize>,
    pub passing: Passing,
    pub returning: Returning,
    /// When false the native manages the return-value vector itself.
    pub move_ret: bool,
}

impl ProcInfo {
    pub const fn fixed(n: usize) -> ProcInfo {
        ProcInfo {
            required: n,
            max: Some(n),
            passing: Passing::Eval,
            returning: Returning::Pass,
            move_ret: true,
        }
    }

    pub const fn between(min: usize, max: usize) -> ProcInfo {
        ProcInfo {
            max: Some(max),
            ..ProcInfo::fixed(min)
        }
    }

    pub const fn at_least(min: usize) -> ProcInfo {
        ProcInfo {
            max: None,
            ..ProcInfo::fixed(min)
        }
    }

    /// Whole-form special form: always entered with (form, env).
    pub const fn whole() -> ProcInfo {
        ProcInfo {
            passing: Passing::Whole,
            ..ProcInfo::fixed(2)
        }
    }

    pub const fn returning(mut self, r: Returning) -> ProcInfo {
        self.returning = r;
        self
    }

    /// The native drives the return-value vector itself.
    pub const fn keep_vals(mut self) -> ProcInfo {
        self.move_ret = false;
        self
    }

    pub fn accepts(&self, argc: usize) -> bool {
        argc >= self.required && self.max.is_none_or(|m| argc <= m)
    }

    pub fn check(&self, who: &str, argc: usize) -> Result<()> {
        if self.accepts(argc) {
            Ok(())
        } else {
            Err(arity_error(who, self.required, self.max, argc))
        }
    }
}

/// Argument view handed to a native: the marshalled values, in order.
#[derive(Debug)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(vals: Vec<Value>) -> Args {
        Args(vals)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    pub fn get(&self, i: usize) -> Option<Value> {
        self.0.get(i).copied()
    }
}

impl std::ops::Index<usize> for Args {
    type Output = Value;

    fn index(&self, i: usize) -> &Value {
        &self.0[i]
    }
}

pub type NativeFn = fn(&mut Interpreter, Args) -> EvalResult<Value>;

/// A builtin: static registry entry referenced directly by `Value`.
#[derive(Debug)]
pub struct NativeProc {
    pub name: &'static str,
    pub fun: NativeFn,
    pub info: ProcInfo,
}

/// An interpreted procedure: body forms, parameter list, closure frame.
#[derive(Debug)]
pub struct Lambda {
    pub params: Vec<Value>,
    /// Rest-parameter identifier for variadic lambdas.
    pub rest: Option<Value>,
    /// Proper list of body forms, never empty.
    pub body: Value,
    pub env: Handle,
    pub name: Option<SymbolId>,
    pub info: ProcInfo,
}

impl Lambda {
    pub fn trace(&self, work: &mut Vec<Value>) {
        work.extend(self.params.iter().copied());
        if let Some(r) = self.rest {
            work.push(r);
        }
        work.push(self.body);
        work.push(Value::Env(self.env));
    }
}

/// Split a lambda parameter list into positional identifiers plus an
/// optional rest identifier. Accepts `(a b)`, `(a . r)`, and bare `r`.
pub fn parse_params(heap: &Heap, params: Value) -> Result<(Vec<Value>, Option<Value>)> {
    if is_identifier(heap, params) {
        return Ok((Vec::new(), Some(params)));
    }
    let mut fixed = Vec::new();
    let mut cur = params;
    loop {
        match cur {
            Value::Nil => return Ok((fixed, None)),
            Value::Pair(h) => {
                let (car, cdr) = heap.pair(h);
                if !is_identifier(heap, car) {
                    return Err(syntax_error("lambda", "parameter is not an identifier"));
                }
                fixed.push(car);
                cur = cdr;
            }
            tail if is_identifier(heap, tail) => return Ok((fixed, Some(tail))),
            _ => return Err(syntax_error("lambda", "malformed parameter list")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cons::list_from;
    use rill_core::SymbolTable;

    #[test]
    fn test_arity_windows() {
        assert!(ProcInfo::fixed(2).accepts(2));
        assert!(!ProcInfo::fixed(2).accepts(3));
        assert!(ProcInfo::at_least(1).accepts(7));
        assert!(!ProcInfo::at_least(1).accepts(0));
        assert!(ProcInfo::between(1, 2).accepts(2));
        assert!(!ProcInfo::between(1, 2).accepts(3));
    }

    #[test]
    fn test_parse_params_shapes() {
        let mut heap = Heap::new();
        let mut syms = SymbolTable::new();
        let a = Value::Sym(syms.intern("a"));
        let b = Value::Sym(syms.intern("b"));
        let r = Value::Sym(syms.intern("r"));

        let fixed = list_from(&mut heap, vec![a, b]);
        let (ps, rest) = parse_params(&heap, fixed).unwrap();
        assert_eq!(ps, vec![a, b]);
        assert!(rest.is_none());

        let dotted = {
            let tail = heap.pair_value(b, r);
            heap.pair_value(a, tail)
        };
        let (ps, rest) = parse_params(&heap, dotted).unwrap();
        assert_eq!(ps, vec![a, b]);
        assert_eq!(rest, Some(r));

        let (ps, rest) = parse_params(&heap, r).unwrap();
        assert!(ps.is_empty());
        assert_eq!(rest, Some(r));

        let bad = list_from(&mut heap, vec![a, Value::Int(1)]);
        assert!(parse_params(&heap, bad).is_err());
    }
}
