//! VM state: the code stack, data stack, and return-value vector
//!
//! Control flow is data: the code stack holds forms to evaluate and
//! `Op` instructions; the data stack holds argument marshalling groups
//! (values topped by an argcount). Continuations are snapshots of the
//! whole structure, so every piece here is `Clone`.

use crate::heap::Handle;
use crate::value::Value;

/// One dynamic-wind extent: `(before, thunk, after)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    pub before: Value,
    pub thunk: Value,
    pub after: Value,
}

/// VM instructions. Several carry their operand inline rather than on a
/// neighbouring stack entry; the effect is the same, the corruption
/// surface smaller.
#[derive(Debug, Clone)]
pub enum Op {
    /// Move the return value into the pending argument group and schedule
    /// the next argument expression.
    ArgPush,
    /// Dispatch a call: return value is the callable, data top the form.
    Call,
    /// Enter the carried callable; data top is the argcount.
    Enter(Value),
    /// Move all return values onto the data stack plus an argcount.
    MoveValues,
    /// Restore the carried frame on the way out of a procedure body.
    LeaveFrame(Handle),
    /// Pick a branch: two `Lit` entries below hold alternative/consequent.
    If,
    /// Rebind the identifier in the `Lit` below to the return value.
    Set,
    /// Bind the identifier in the `Lit` below in the current frame.
    Define,
    /// Push the return value back as code (macro expansion result).
    Reevaluate,
    /// Pop the top dynamic-wind extent.
    LeaveWinding,
    /// Push the carried extent onto the dynamic-wind stack.
    PushWinding(Wind),
    /// Trim the exception-handler stack back to the carried depth. A
    /// raise inside the guarded thunk pops the handler itself, so this
    /// must be idempotent rather than a blind pop.
    PopHandler(usize),
    /// Call the carried thunk with zero arguments.
    CallThunk(Value),
    /// Call the carried thunk, preserving the return values around it.
    SaveAndCall(Value),
    /// Replace the VM with the carried continuation snapshot, delivering
    /// the data-stack argument group as return values.
    ReplaceVm(Handle),
    /// Memoize the forced value into the carried promise.
    Force(Handle),
}

/// Code stack entries.
#[derive(Debug, Clone)]
pub enum Code {
    /// Evaluate this form.
    Form(Value),
    /// Inert operand consumed by the instruction beneath it.
    Lit(Value),
    /// Body sequence: evaluate the cars of this list in order.
    Seq(Value),
    /// Pending argument-count entry for the call being marshalled.
    ArgCount(usize),
    /// Saved return-value vector, reinstated when popped.
    Restore(Vec<Value>),
    Op(Op),
}

/// Data stack entries: marshalled values topped by their count.
#[derive(Debug, Clone, Copy)]
pub enum Entry {
    Val(Value),
    Count(usize),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VmStats {
    pub instructions: u64,
    pub code_high_water: usize,
    pub data_high_water: usize,
}

#[derive(Debug, Clone)]
pub struct Vm {
    pub code: Vec<Code>,
    pub data: Vec<Entry>,
    /// Return-value vector; multiple values only via `values`.
    pub vals: Vec<Value>,
    pub frame: Handle,
    pub winds: Vec<Wind>,
    pub handlers: Vec<Value>,
    /// Set when a splice-returning native just finished; consumed by the
    /// next marshalling step.
    pub splice_pending: bool,
    /// Set when a continuation was just resumed; lets a pending call
    /// accept the delivered value as its result.
    pub delivered: bool,
    pub stats: VmStats,
}

impl Vm {
    pub fn new(frame: Handle) -> Vm {
        Vm {
            code: Vec::new(),
            data: Vec::new(),
            vals: vec![Value::Undefined],
            frame,
            winds: Vec::new(),
            handlers: Vec::new(),
            splice_pending: false,
            delivered: false,
            stats: VmStats::default(),
        }
    }

    pub fn first_val(&self) -> Value {
        self.vals.first().copied().unwrap_or(Value::Undefined)
    }

    pub fn set_val(&mut self, v: Value) {
        self.vals.clear();
        self.vals.push(v);
    }

    pub fn note_high_water(&mut self) {
        self.stats.code_high_water = self.stats.code_high_water.max(self.code.len());
        self.stats.data_high_water = self.stats.data_high_water.max(self.data.len());
    }

    /// GC roots: everything the VM can still reach.
    pub fn trace(&self, work: &mut Vec<Value>) {
        for c in &self.code {
            match c {
                Code::Form(v) | Code::Lit(v) | Code::Seq(v) => work.push(*v),
                Code::Restore(vs) => work.extend(vs.iter().copied()),
                Code::ArgCount(_) => {}
                Code::Op(op) => match op {
                    Op::Enter(v) | Op::CallThunk(v) | Op::SaveAndCall(v) => work.push(*v),
                    Op::LeaveFrame(h) => work.push(Value::Env(*h)),
                    Op::ReplaceVm(h) => work.push(Value::Continuation(*h)),
                    Op::Force(h) => work.push(Value::Promise(*h)),
                    Op::PushWinding(w) => {
                        work.push(w.before);
                        work.push(w.thunk);
                        work.push(w.after);
                    }
                    _ => {}
                },
            }
        }
        for e in &self.data {
            if let Entry::Val(v) = e {
                work.push(*v);
            }
        }
        work.extend(self.vals.iter().copied());
        work.push(Value::Env(self.frame));
        for w in &self.winds {
            work.push(w.before);
            work.push(w.thunk);
            work.push(w.after);
        }
        work.extend(self.handlers.iter().copied());
    }
}
