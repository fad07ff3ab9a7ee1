//! Control-flow builtins
//!
//! These natives drive the VM directly: they push `Enter`/`MoveValues`
//! sequences instead of calling back into the evaluator, which keeps
//! tail-call behaviour and continuation capture uniform.

use crate::cons::list_to_vec;
use crate::heap::{Obj, Promise};
use crate::interp::Interpreter;
use crate::procedure::{Args, NativeProc, ProcInfo};
use crate::value::{EvalResult, Value};
use crate::vm::{Code, Entry, Op, Wind};
use rill_core::error::type_error;

fn want_callable(who: &str, v: Value) -> Result<Value, rill_core::Condition> {
    if v.is_callable() {
        Ok(v)
    } else {
        Err(type_error(who, "procedure", v.kind_name()))
    }
}

pub static PROCEDURE_P: NativeProc = NativeProc {
    name: "procedure?",
    fun: |_, args| {
        // syntax transformers are not procedures; everything callable at
        // run time is
        Ok(Value::Bool(matches!(
            args[0],
            Value::Lambda(_) | Value::Native(_) | Value::Continuation(_)
        )))
    },
    info: ProcInfo::fixed(1),
};

pub static APPLY: NativeProc = NativeProc {
    name: "apply",
    fun: apply,
    info: ProcInfo::at_least(2).keep_vals(),
};

fn apply(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let proc = want_callable("apply", args[0])?;
    let vals = args.into_vec();
    let (last, direct) = vals[1..].split_last().expect("arity checked");

    let mut count = 0;
    for v in direct {
        interp.vm.data.push(Entry::Val(*v));
        count += 1;
    }
    for v in list_to_vec(&interp.heap, "apply", *last)? {
        interp.vm.data.push(Entry::Val(v));
        count += 1;
    }
    interp.vm.data.push(Entry::Count(count));
    interp.vm.code.push(Code::Op(Op::Enter(proc)));
    Ok(Value::Undefined)
}

pub static VALUES: NativeProc = NativeProc {
    name: "values",
    fun: |interp, args| {
        interp.vm.vals = args.into_vec();
        Ok(Value::Undefined)
    },
    info: ProcInfo::at_least(0).keep_vals(),
};

pub static CALL_WITH_VALUES: NativeProc = NativeProc {
    name: "call-with-values",
    fun: call_with_values,
    info: ProcInfo::fixed(2).keep_vals(),
};

fn call_with_values(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let producer = want_callable("call-with-values", args[0])?;
    let consumer = want_callable("call-with-values", args[1])?;

    // consumer waits for the producer's values to be moved into place
    interp.vm.code.push(Code::Op(Op::Enter(consumer)));
    interp.vm.code.push(Code::Op(Op::MoveValues));

    interp.vm.data.push(Entry::Count(0));
    interp.vm.code.push(Code::Op(Op::Enter(producer)));
    Ok(Value::Undefined)
}

pub static CALL_CC: NativeProc = NativeProc {
    name: "call-with-current-continuation",
    fun: call_cc,
    info: ProcInfo::fixed(1).keep_vals(),
};

pub static CALL_CC_SHORT: NativeProc = NativeProc {
    name: "call/cc",
    fun: call_cc,
    info: ProcInfo::fixed(1).keep_vals(),
};

fn call_cc(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let proc = want_callable("call/cc", args[0])?;
    let snapshot = Box::new(interp.vm.clone());
    let k = Value::Continuation(interp.heap.alloc(Obj::Continuation(snapshot)));
    interp.vm.data.push(Entry::Val(k));
    interp.vm.data.push(Entry::Count(1));
    interp.vm.code.push(Code::Op(Op::Enter(proc)));
    Ok(Value::Undefined)
}

pub static DYNAMIC_WIND: NativeProc = NativeProc {
    name: "dynamic-wind",
    fun: dynamic_wind,
    info: ProcInfo::fixed(3).keep_vals(),
};

fn dynamic_wind(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let before = want_callable("dynamic-wind", args[0])?;
    let thunk = want_callable("dynamic-wind", args[1])?;
    let after = want_callable("dynamic-wind", args[2])?;
    let wind = Wind {
        before,
        thunk,
        after,
    };

    // executes as: before, push extent, thunk, pop extent, after
    // (with the thunk's values preserved across the after call)
    interp.vm.code.push(Code::Op(Op::SaveAndCall(after)));
    interp.vm.code.push(Code::Op(Op::LeaveWinding));
    interp.vm.code.push(Code::Op(Op::CallThunk(thunk)));
    interp.vm.code.push(Code::Op(Op::PushWinding(wind)));
    interp.vm.code.push(Code::Op(Op::CallThunk(before)));
    Ok(Value::Undefined)
}

pub static FORCE: NativeProc = NativeProc {
    name: "force",
    fun: force,
    info: ProcInfo::fixed(1).keep_vals(),
};

fn force(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let Value::Promise(h) = args[0] else {
        // forcing a non-promise yields it unchanged
        interp.vm.set_val(args[0]);
        return Ok(Value::Undefined);
    };
    match *interp.heap.promise(h) {
        Promise::Forced(v) => {
            interp.vm.set_val(v);
            Ok(Value::Undefined)
        }
        Promise::Pending { expr, env } => {
            let saved = interp.vm.frame;
            interp.vm.frame = env;
            interp.vm.code.push(Code::Op(Op::Force(h)));
            interp.vm.code.push(Code::Op(Op::LeaveFrame(saved)));
            interp.vm.code.push(Code::Form(expr));
            Ok(Value::Undefined)
        }
    }
}

pub static WITH_EXCEPTION_HANDLER: NativeProc = NativeProc {
    name: "with-exception-handler",
    fun: with_exception_handler,
    info: ProcInfo::fixed(2).keep_vals(),
};

fn with_exception_handler(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let handler = want_callable("with-exception-handler", args[0])?;
    let thunk = want_callable("with-exception-handler", args[1])?;

    let depth = interp.vm.handlers.len();
    interp.vm.handlers.push(handler);
    interp.vm.code.push(Code::Op(Op::PopHandler(depth)));
    interp.vm.data.push(Entry::Count(0));
    interp.vm.code.push(Code::Op(Op::Enter(thunk)));
    Ok(Value::Undefined)
}

pub static RAISE: NativeProc = NativeProc {
    name: "raise",
    fun: |_, args| Err(crate::value::Signal::Raise(args[0])),
    info: ProcInfo::fixed(1),
};
