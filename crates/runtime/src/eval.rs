//! The evaluator: one instruction step of the code/data stack machine
//!
//! The code stack drives everything. Forms evaluate by pushing call
//! machinery; opcodes consume the return-value vector and the data stack.
//! Tail calls collapse the pending `LeaveFrame` instead of stacking a new
//! one, which is the whole of proper tail-call support.

use crate::cons::{list_from, list_to_vec};
use crate::env::{self, IdentKey};
use crate::heap::{Handle, Promise};
use crate::interp::Interpreter;
use crate::printer;
use crate::procedure::{Args, NativeProc, Passing, ProcInfo, Returning};
use crate::sclosure::{self, ident_key, is_identifier};
use crate::value::{EvalResult, Value};
use crate::vm::{Code, Entry, Op, Wind};
use rill_core::error::{Condition, ErrorKind, arity_error, syntax_error};
use tracing::trace;

/// Calling convention of an invoked continuation: any number of values,
/// delivered straight into the resumed state.
const CONT_INFO: ProcInfo = ProcInfo::at_least(0);

/// Syntax-rules transformers receive the whole form and re-evaluate
/// their expansion.
const RULES_INFO: ProcInfo = ProcInfo::whole().returning(Returning::Code);

impl Interpreter {
    /// Execute one code-stack entry.
    pub(crate) fn step(&mut self) -> EvalResult<()> {
        let delivered = std::mem::take(&mut self.vm.delivered);
        let splice = std::mem::take(&mut self.vm.splice_pending);
        let entry = self.vm.code.pop().expect("vm: step with empty code stack");
        match entry {
            Code::Form(v) => self.eval_form(v),
            Code::Lit(_) => panic!("vm: stray literal on code stack"),
            Code::Seq(list) => {
                let Value::Pair(h) = list else {
                    panic!("vm: sequence entry is not a pair");
                };
                let (car, cdr) = self.heap.pair(h);
                if !cdr.is_nil() {
                    self.vm.code.push(Code::Seq(cdr));
                }
                self.vm.code.push(Code::Form(car));
                Ok(())
            }
            Code::ArgCount(n) => {
                self.finish_args(n, splice);
                Ok(())
            }
            Code::Restore(vals) => {
                self.vm.vals = vals;
                Ok(())
            }
            Code::Op(op) => self.exec_op(op, delivered, splice),
        }
    }

    // --- forms -------------------------------------------------------------

    fn eval_form(&mut self, v: Value) -> EvalResult<()> {
        match v {
            Value::Sym(id) => match env::find(&self.heap, self.vm.frame, IdentKey::Sym(id)) {
                Some(val) => {
                    self.vm.set_val(val);
                    Ok(())
                }
                None => Err(Condition::new(
                    ErrorKind::Unbound,
                    self.symbols.name(id).to_string(),
                )
                .into()),
            },
            Value::SynClosure(h) => self.eval_sclosure(h),
            Value::Pair(h) => {
                let car = self.heap.car(h);
                self.vm.code.push(Code::Op(Op::Call));
                self.vm.code.push(Code::Form(car));
                self.vm.data.push(Entry::Val(v));
                Ok(())
            }
            Value::Undefined => {
                Err(syntax_error("eval", "the undefined value cannot be evaluated").into())
            }
            other => {
                self.vm.set_val(other);
                Ok(())
            }
        }
    }

    /// A wrapper bound as an alias in the current scope is that binding;
    /// anything else evaluates its expression in the captured environment,
    /// extended with the listed free names copied from the call site.
    fn eval_sclosure(&mut self, h: Handle) -> EvalResult<()> {
        let sc = self.heap.sclosure(h);
        let (sc_env, free_names, expr) = (sc.env, sc.free_names, sc.expr);

        if is_identifier(&self.heap, expr)
            && let Some(v) = env::find(&self.heap, self.vm.frame, IdentKey::Wrap(h))
        {
            self.vm.set_val(v);
            return Ok(());
        }

        let names: Vec<Value> = crate::cons::ConsIter::new(&self.heap, free_names).collect();
        let child = env::push_frame(&mut self.heap, sc_env);
        for name in names {
            if let Some(key) = ident_key(name)
                && let Some(v) = env::find(&self.heap, self.vm.frame, key)
            {
                env::local_set(&mut self.heap, child, key, v);
            }
        }
        let saved = self.vm.frame;
        self.vm.frame = child;
        self.vm.code.push(Code::Op(Op::LeaveFrame(saved)));
        self.vm.code.push(Code::Form(expr));
        Ok(())
    }

    /// Close an argument group: the last argument (or a splice) joins the
    /// marshalled values and the count lands on top.
    fn finish_args(&mut self, n: usize, splice: bool) {
        if splice {
            let vals = std::mem::take(&mut self.vm.vals);
            let count = n - 1 + vals.len();
            self.vm.data.extend(vals.into_iter().map(Entry::Val));
            self.vm.data.push(Entry::Count(count));
            self.vm.set_val(Value::Undefined);
        } else {
            let v = self.vm.first_val();
            self.vm.data.push(Entry::Val(v));
            self.vm.data.push(Entry::Count(n));
        }
    }

    // --- opcodes -----------------------------------------------------------

    fn exec_op(&mut self, op: Op, delivered: bool, splice: bool) -> EvalResult<()> {
        match op {
            Op::ArgPush => {
                let rest = match self.vm.code.pop() {
                    Some(Code::Lit(v)) => v,
                    _ => panic!("vm: arg-push without pending arguments"),
                };
                let pushed = if splice {
                    let vals = std::mem::take(&mut self.vm.vals);
                    let k = vals.len();
                    self.vm.data.extend(vals.into_iter().map(Entry::Val));
                    self.vm.set_val(Value::Undefined);
                    k
                } else {
                    let v = self.vm.first_val();
                    self.vm.data.push(Entry::Val(v));
                    1
                };
                match self.vm.code.last_mut() {
                    Some(Code::ArgCount(n)) => *n += pushed,
                    _ => panic!("vm: arg-push without argcount entry"),
                }
                let Value::Pair(h) = rest else {
                    panic!("vm: argument rest is not a pair");
                };
                let (arg1, more) = self.heap.pair(h);
                if more.is_nil() {
                    self.vm.code.push(Code::Form(arg1));
                } else {
                    self.vm.code.push(Code::Lit(more));
                    self.vm.code.push(Code::Op(Op::ArgPush));
                    self.vm.code.push(Code::Form(arg1));
                }
                Ok(())
            }

            Op::Call => {
                let callee = self.vm.first_val();
                let form = match self.vm.data.pop() {
                    Some(Entry::Val(v)) => v,
                    _ => panic!("vm: call without the original form"),
                };
                if !callee.is_callable() {
                    if delivered {
                        // A resumed continuation dropped a plain value into
                        // the operator hole; it becomes the pending call's
                        // result.
                        return Ok(());
                    }
                    let text = printer::write_value(self, form);
                    return Err(Condition::new(
                        ErrorKind::Type,
                        format!("operator is not a procedure: {text}"),
                    )
                    .into());
                }
                let info = self.proc_info(callee);
                match info.passing {
                    Passing::Eval => self.call_eval(callee, info, form),
                    Passing::Quote => self.call_quote(callee, info, form),
                    Passing::Whole => self.call_whole(callee, info, form),
                }
            }

            Op::Enter(callee) => {
                let argc = match self.vm.data.pop() {
                    Some(Entry::Count(n)) => n,
                    _ => panic!("vm: enter without argument count"),
                };
                match callee {
                    Value::Native(n) => self.enter_native(n, argc),
                    Value::Lambda(h) => self.enter_lambda(h, argc),
                    Value::Continuation(h) => self.enter_continuation(h, argc),
                    Value::Rules(h) => self.enter_rules(h, argc),
                    other => panic!("vm: entering non-callable {}", other.kind_name()),
                }
            }

            Op::MoveValues => {
                let vals = std::mem::take(&mut self.vm.vals);
                let n = vals.len();
                self.vm.data.extend(vals.into_iter().map(Entry::Val));
                self.vm.data.push(Entry::Count(n));
                self.vm.set_val(Value::Undefined);
                Ok(())
            }

            Op::LeaveFrame(h) => {
                self.vm.frame = h;
                Ok(())
            }

            Op::If => {
                let conseq = match self.vm.code.pop() {
                    Some(Code::Lit(v)) => v,
                    _ => panic!("vm: if without consequent"),
                };
                let alt = match self.vm.code.pop() {
                    Some(Code::Lit(v)) => v,
                    _ => panic!("vm: if without alternative"),
                };
                let chosen = if self.vm.first_val().is_true() {
                    conseq
                } else {
                    alt
                };
                if let Value::Undefined = chosen {
                    self.vm.set_val(Value::Undefined);
                } else {
                    self.vm.code.push(Code::Form(chosen));
                }
                Ok(())
            }

            Op::Set => {
                let ident = match self.vm.code.pop() {
                    Some(Code::Lit(v)) => v,
                    _ => panic!("vm: set! without identifier"),
                };
                let v = self.vm.first_val();
                match sclosure::resolve(&self.heap, self.vm.frame, ident) {
                    Some((frame, key)) => {
                        env::local_set(&mut self.heap, frame, key, v);
                        Ok(())
                    }
                    None => {
                        let name = sclosure::underlying_symbol(&self.heap, ident)
                            .map(|id| self.symbols.name(id).to_string())
                            .unwrap_or_else(|| "?".to_string());
                        Err(Condition::new(ErrorKind::Unbound, format!("set!: {name}")).into())
                    }
                }
            }

            Op::Define => {
                let ident = match self.vm.code.pop() {
                    Some(Code::Lit(v)) => v,
                    _ => panic!("vm: define without identifier"),
                };
                let key = ident_key(ident).expect("define: validated identifier");
                let v = self.vm.first_val();
                env::local_set(&mut self.heap, self.vm.frame, key, v);
                Ok(())
            }

            Op::Reevaluate => {
                let form = self.vm.first_val();
                trace!("re-evaluating macro expansion");
                self.vm.code.push(Code::Form(form));
                Ok(())
            }

            Op::LeaveWinding => {
                self.vm.winds.pop();
                Ok(())
            }

            Op::PushWinding(w) => {
                self.vm.winds.push(w);
                Ok(())
            }

            Op::PopHandler(depth) => {
                self.vm.handlers.truncate(depth);
                Ok(())
            }

            Op::CallThunk(thunk) => {
                self.vm.data.push(Entry::Count(0));
                self.vm.code.push(Code::Op(Op::Enter(thunk)));
                Ok(())
            }

            Op::SaveAndCall(thunk) => {
                let saved = self.vm.vals.clone();
                self.vm.code.push(Code::Restore(saved));
                self.vm.data.push(Entry::Count(0));
                self.vm.code.push(Code::Op(Op::Enter(thunk)));
                Ok(())
            }

            Op::ReplaceVm(h) => {
                let argc = match self.vm.data.pop() {
                    Some(Entry::Count(n)) => n,
                    _ => panic!("vm: replace-vm without delivered values"),
                };
                let args = self.drain_args(argc);
                let snapshot = self.heap.continuation(h).clone();
                let stats = self.vm.stats;
                self.vm = snapshot;
                self.vm.stats = stats;
                self.vm.vals = args;
                self.vm.delivered = true;
                Ok(())
            }

            Op::Force(h) => {
                let v = self.vm.first_val();
                *self.heap.promise_mut(h) = Promise::Forced(v);
                Ok(())
            }
        }
    }

    // --- call dispatch -----------------------------------------------------

    fn proc_info(&self, callee: Value) -> ProcInfo {
        match callee {
            Value::Native(n) => n.info,
            Value::Lambda(h) => self.heap.lambda(h).info,
            Value::Continuation(_) => CONT_INFO,
            Value::Rules(_) => RULES_INFO,
            other => panic!("vm: no proc info for {}", other.kind_name()),
        }
    }

    fn call_eval(&mut self, callee: Value, info: ProcInfo, form: Value) -> EvalResult<()> {
        if info.returning == Returning::Code {
            self.vm.code.push(Code::Op(Op::Reevaluate));
        }
        self.vm.code.push(Code::Op(Op::Enter(callee)));

        let Value::Pair(h) = form else {
            panic!("vm: call form is not a pair");
        };
        match self.heap.cdr(h) {
            Value::Nil => {
                self.vm.data.push(Entry::Count(0));
                Ok(())
            }
            Value::Pair(args) => {
                let (a1, rest) = self.heap.pair(args);
                self.vm.code.push(Code::ArgCount(1));
                if rest.is_nil() {
                    self.vm.code.push(Code::Form(a1));
                } else {
                    self.vm.code.push(Code::Lit(rest));
                    self.vm.code.push(Code::Op(Op::ArgPush));
                    self.vm.code.push(Code::Form(a1));
                }
                Ok(())
            }
            _ => Err(syntax_error("call", "improper argument list").into()),
        }
    }

    fn call_quote(&mut self, callee: Value, info: ProcInfo, form: Value) -> EvalResult<()> {
        let Value::Pair(h) = form else {
            panic!("vm: call form is not a pair");
        };
        let args = list_to_vec(&self.heap, "macro call", self.heap.cdr(h))?;
        let n = args.len();
        self.vm.data.extend(args.into_iter().map(Entry::Val));
        self.vm.data.push(Entry::Count(n));
        if info.returning == Returning::Code {
            self.vm.code.push(Code::Op(Op::Reevaluate));
        }
        self.vm.code.push(Code::Op(Op::Enter(callee)));
        Ok(())
    }

    fn call_whole(&mut self, callee: Value, info: ProcInfo, form: Value) -> EvalResult<()> {
        self.vm.data.push(Entry::Val(form));
        self.vm.data.push(Entry::Val(Value::Env(self.vm.frame)));
        self.vm.data.push(Entry::Count(2));
        if info.returning == Returning::Code {
            self.vm.code.push(Code::Op(Op::Reevaluate));
        }
        self.vm.code.push(Code::Op(Op::Enter(callee)));
        Ok(())
    }

    // --- entering callables ------------------------------------------------

    pub(crate) fn drain_args(&mut self, argc: usize) -> Vec<Value> {
        let start = self.vm.data.len() - argc;
        self.vm
            .data
            .drain(start..)
            .map(|e| match e {
                Entry::Val(v) => v,
                Entry::Count(_) => panic!("vm: argcount inside argument group"),
            })
            .collect()
    }

    fn enter_native(&mut self, native: &'static NativeProc, argc: usize) -> EvalResult<()> {
        let args = Args::new(self.drain_args(argc));
        native.info.check(native.name, argc)?;
        let result = (native.fun)(self, args)?;
        match native.info.returning {
            Returning::Splice => {
                let items = list_to_vec(&self.heap, native.name, result)?;
                self.vm.vals = items;
                self.vm.splice_pending = true;
            }
            _ => {
                if native.info.move_ret {
                    self.vm.set_val(result);
                }
            }
        }
        Ok(())
    }

    fn enter_lambda(&mut self, h: Handle, argc: usize) -> EvalResult<()> {
        let args = self.drain_args(argc);
        let lambda = self.heap.lambda(h);
        let (params, rest, body, closure_env, name, info) = (
            lambda.params.clone(),
            lambda.rest,
            lambda.body,
            lambda.env,
            lambda.name,
            lambda.info,
        );
        if !info.accepts(argc) {
            let who = name
                .map(|id| self.symbols.name(id).to_string())
                .unwrap_or_else(|| "lambda".to_string());
            return Err(arity_error(&who, info.required, info.max, argc).into());
        }

        // tail position: reuse the pending frame restore instead of
        // stacking another one
        let saved = match self.vm.code.last() {
            Some(Code::Op(Op::LeaveFrame(s))) => {
                let s = *s;
                self.vm.code.pop();
                s
            }
            _ => self.vm.frame,
        };

        let frame = env::push_frame(&mut self.heap, closure_env);
        for (param, value) in params.iter().zip(&args) {
            let key = ident_key(*param).expect("lambda: validated parameter");
            env::local_set(&mut self.heap, frame, key, *value);
        }
        if let Some(rest_ident) = rest {
            let tail = list_from(&mut self.heap, args[params.len()..].iter().copied());
            let key = ident_key(rest_ident).expect("lambda: validated rest parameter");
            env::local_set(&mut self.heap, frame, key, tail);
        }

        self.vm.frame = frame;
        self.vm.code.push(Code::Op(Op::LeaveFrame(saved)));
        self.vm.code.push(Code::Seq(body));
        Ok(())
    }

    /// Play the dynamic-wind boundary thunks, then swap in the saved VM.
    fn enter_continuation(&mut self, h: Handle, argc: usize) -> EvalResult<()> {
        let args = self.drain_args(argc);
        let target_winds = self.heap.continuation(h).winds.clone();
        let shared = common_prefix(&self.vm.winds, &target_winds);

        self.vm.code.push(Code::Op(Op::ReplaceVm(h)));
        let n = args.len();
        self.vm.data.extend(args.into_iter().map(Entry::Val));
        self.vm.data.push(Entry::Count(n));

        // entering extents: outermost runs first
        for w in target_winds[shared..].iter().rev() {
            self.vm.code.push(Code::Op(Op::CallThunk(w.before)));
        }
        // leaving extents: innermost runs first, popped before its after
        let leaving: Vec<Wind> = self.vm.winds[shared..].to_vec();
        for w in &leaving {
            self.vm.code.push(Code::Op(Op::CallThunk(w.after)));
            self.vm.code.push(Code::Op(Op::LeaveWinding));
        }
        Ok(())
    }

    fn enter_rules(&mut self, h: Handle, argc: usize) -> EvalResult<()> {
        let args = self.drain_args(argc);
        debug_assert_eq!(argc, 2, "syntax-rules transformers take (form, env)");
        let form = args[0];
        let use_env = match args[1] {
            Value::Env(e) => e,
            other => panic!("vm: transformer env is {}", other.kind_name()),
        };
        let expansion = crate::rules::expand(self, h, form, use_env)?;
        self.vm.set_val(expansion);
        Ok(())
    }
}

/// Shared depth of two wind stacks.
fn common_prefix(a: &[Wind], b: &[Wind]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefix() {
        let w = |n: i64| Wind {
            before: Value::Int(n),
            thunk: Value::Int(n),
            after: Value::Int(n),
        };
        assert_eq!(common_prefix(&[], &[]), 0);
        assert_eq!(common_prefix(&[w(1)], &[w(1), w(2)]), 1);
        assert_eq!(common_prefix(&[w(1), w(3)], &[w(1), w(2)]), 1);
        assert_eq!(common_prefix(&[w(9)], &[w(1)]), 0);
    }
}
