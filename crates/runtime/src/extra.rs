//! Interaction-environment extras
//!
//! Debugging and extension bindings beyond the report set: gensym, the
//! identifier/syntactic-closure introspection procedures, `eval` with
//! explicit environments, and `exit`.

use crate::heap::Obj;
use crate::interp::Interpreter;
use crate::procedure::{Args, NativeProc, ProcInfo};
use crate::sclosure::{SynClosure, identifier_eq, is_identifier};
use crate::value::{EvalResult, Value};
use crate::vm::{Code, Op};
use rill_core::error::{Condition, ErrorKind, type_error};

pub static GENSYM: NativeProc = NativeProc {
    name: "gensym",
    fun: |interp, _| Ok(Value::Sym(interp.symbols.gensym())),
    info: ProcInfo::fixed(0),
};

pub static IDENTIFIER_P: NativeProc = NativeProc {
    name: "identifier?",
    fun: |interp, args| Ok(Value::Bool(is_identifier(&interp.heap, args[0]))),
    info: ProcInfo::fixed(1),
};

pub static IDENTIFIER_EQ: NativeProc = NativeProc {
    name: "identifier=?",
    fun: |interp, args| {
        let (Value::Env(e1), Value::Env(e2)) = (args[0], args[2]) else {
            return Err(type_error("identifier=?", "environment", "other").into());
        };
        Ok(Value::Bool(identifier_eq(
            &interp.heap,
            e1,
            args[1],
            e2,
            args[3],
        )))
    },
    info: ProcInfo::fixed(4),
};

pub static MAKE_SYNTACTIC_CLOSURE: NativeProc = NativeProc {
    name: "make-syntactic-closure",
    fun: |interp, args| {
        let Value::Env(env) = args[0] else {
            return Err(
                type_error("make-syntactic-closure", "environment", args[0].kind_name()).into(),
            );
        };
        Ok(Value::SynClosure(interp.heap.alloc(Obj::SynClosure(
            SynClosure {
                env,
                free_names: args[1],
                expr: args[2],
            },
        ))))
    },
    info: ProcInfo::fixed(3),
};

pub static CURRENT_ENVIRONMENT: NativeProc = NativeProc {
    name: "%current-environment",
    fun: |interp, _| Ok(Value::Env(interp.vm.frame)),
    info: ProcInfo::fixed(0),
};

pub static EVAL: NativeProc = NativeProc {
    name: "eval",
    fun: eval_native,
    info: ProcInfo::fixed(2).keep_vals(),
};

fn eval_native(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let Value::Env(env) = args[1] else {
        return Err(type_error("eval", "environment", args[1].kind_name()).into());
    };
    let saved = interp.vm.frame;
    interp.vm.frame = env;
    interp.vm.code.push(Code::Op(Op::LeaveFrame(saved)));
    interp.vm.code.push(Code::Form(args[0]));
    Ok(Value::Undefined)
}

fn want_report_version(who: &str, v: Value) -> Result<(), Condition> {
    match v {
        Value::Int(5) => Ok(()),
        other => Err(Condition::new(
            ErrorKind::Type,
            format!("{who}: expected the exact integer 5, got {}", other.kind_name()),
        )),
    }
}

pub static NULL_ENVIRONMENT: NativeProc = NativeProc {
    name: "null-environment",
    fun: |interp, args| {
        want_report_version("null-environment", args[0])?;
        Ok(Value::Env(interp.null_env))
    },
    info: ProcInfo::fixed(1),
};

pub static SCHEME_REPORT_ENVIRONMENT: NativeProc = NativeProc {
    name: "scheme-report-environment",
    fun: |interp, args| {
        want_report_version("scheme-report-environment", args[0])?;
        Ok(Value::Env(interp.report_env))
    },
    info: ProcInfo::fixed(1),
};

pub static INTERACTION_ENVIRONMENT: NativeProc = NativeProc {
    name: "interaction-environment",
    fun: |interp, _| Ok(Value::Env(interp.interaction_env)),
    info: ProcInfo::fixed(0),
};

pub static EXIT: NativeProc = NativeProc {
    name: "exit",
    fun: |interp, args| {
        let code = match args.get(0) {
            None | Some(Value::Bool(true)) => 0,
            Some(Value::Bool(false)) => 1,
            Some(Value::Int(n)) => n as i32,
            Some(other) => {
                return Err(type_error("exit", "integer or boolean", other.kind_name()).into());
            }
        };
        interp.request_exit(code);
        Ok(Value::Undefined)
    },
    info: ProcInfo::between(0, 1),
};
