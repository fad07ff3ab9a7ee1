//! The interpreter context
//!
//! One `Interpreter` owns everything that was process-global in classic
//! Lisp cores: the heap arena, the symbol table, the single VM, and the
//! three bootstrap environments. All operations thread `&mut Interpreter`;
//! there are no statics.

use crate::env;
use crate::heap::{Handle, Heap};
use crate::printer;
use crate::reader;
use crate::value::{Signal, Value};
use crate::vm::{Code, Entry, Vm};
use rill_core::error::{Condition, ErrorKind, Result};
use rill_core::{SymbolId, SymbolTable};
use tracing::{trace, warn};

/// Instructions between garbage-collection checks.
const GC_INTERVAL: u32 = 256;

/// Skip the collection when fewer than this many objects were allocated
/// since the last sweep; a full trace of a quiet heap buys nothing.
const GC_ALLOC_FLOOR: usize = 1024;

pub struct Interpreter {
    pub heap: Heap,
    pub symbols: SymbolTable,
    pub vm: Vm,
    pub null_env: Handle,
    pub report_env: Handle,
    pub interaction_env: Handle,
    gc_countdown: u32,
    exit_code: Option<i32>,
}

impl Interpreter {
    /// A fully booted interpreter: builtins installed, prelude loaded,
    /// current frame at the interaction environment.
    pub fn new() -> Interpreter {
        let mut heap = Heap::new();
        let null_env = env::root_frame(&mut heap);
        let vm = Vm::new(null_env);
        let mut interp = Interpreter {
            heap,
            symbols: SymbolTable::new(),
            vm,
            null_env,
            report_env: null_env,
            interaction_env: null_env,
            gc_countdown: GC_INTERVAL,
            exit_code: None,
        };
        crate::registry::install(&mut interp);
        interp
    }

    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    pub fn sym_value(&mut self, name: &str) -> Value {
        Value::Sym(self.symbols.intern(name))
    }

    /// `exit` requests a clean shutdown; the REPL polls for it.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_code = Some(code);
        self.vm.code.clear();
        self.vm.data.clear();
    }

    pub fn take_exit(&mut self) -> Option<i32> {
        self.exit_code.take()
    }

    // --- driving the VM ----------------------------------------------------

    /// Run the VM until the code stack drains. Conditions are delivered to
    /// the innermost exception handler; with no handler installed they
    /// clear the partial stacks and surface to the caller.
    pub fn run(&mut self) -> Result<Value> {
        while !self.vm.code.is_empty() {
            if self.exit_code.is_some() {
                break;
            }
            match self.step() {
                Ok(()) => {}
                Err(sig) => {
                    if let Some(handler) = self.vm.handlers.pop() {
                        let payload = self.signal_value(&sig);
                        trace!("delivering condition to handler");
                        self.push_apply(handler, &[payload]);
                    } else {
                        let cond = self.signal_condition(sig);
                        self.vm.code.clear();
                        self.vm.data.clear();
                        self.vm.set_val(Value::Undefined);
                        self.vm.splice_pending = false;
                        self.vm.delivered = false;
                        return Err(cond);
                    }
                }
            }
            self.vm.stats.instructions += 1;
            self.vm.note_high_water();
            self.gc_countdown -= 1;
            if self.gc_countdown == 0 {
                self.gc_countdown = GC_INTERVAL;
                if self.heap.allocations_since_collect() >= GC_ALLOC_FLOOR {
                    self.collect_garbage();
                }
            }
        }

        if !self.vm.data.is_empty() {
            warn!(
                depth = self.vm.data.len(),
                "vm data stack still populated after run; clearing"
            );
            self.vm.data.clear();
        }
        Ok(self.vm.first_val())
    }

    /// Evaluate one form in the current frame.
    pub fn eval_value(&mut self, form: Value) -> Result<Value> {
        self.vm.code.push(Code::Form(form));
        self.run()
    }

    /// Read and evaluate every form in `src`, yielding the last value.
    /// The forms are chained through the code stack so the unevaluated
    /// remainder stays visible to the collector.
    pub fn eval_str(&mut self, src: &str) -> Result<Value> {
        let forms = reader::read_all(self, src)?;
        if forms.is_empty() {
            return Ok(Value::Undefined);
        }
        let list = crate::cons::list_from(&mut self.heap, forms);
        self.vm.code.push(Code::Seq(list));
        self.run()
    }

    /// `load` semantics: evaluate every form; the first condition aborts
    /// the rest of the file.
    pub fn load_str(&mut self, src: &str) -> Result<()> {
        self.eval_str(src).map(|_| ())
    }

    pub fn load_path(&mut self, path: &str) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Condition::new(ErrorKind::Io, format!("load: {path}: {e}"))
        })?;
        self.load_str(&text)
    }

    /// Schedule `proc` applied to `args` on the VM stacks.
    pub fn push_apply(&mut self, proc: Value, args: &[Value]) {
        for v in args {
            self.vm.data.push(Entry::Val(*v));
        }
        self.vm.data.push(Entry::Count(args.len()));
        self.vm
            .code
            .push(Code::Op(crate::vm::Op::Enter(proc)));
    }

    // --- conditions --------------------------------------------------------

    /// The value handed to an exception handler.
    pub fn signal_value(&mut self, sig: &Signal) -> Value {
        match sig {
            Signal::Raise(v) => *v,
            Signal::Error(c) => {
                let text = c.to_string();
                self.heap.str_value(text)
            }
        }
    }

    /// The condition surfaced to the host for an unhandled signal.
    fn signal_condition(&mut self, sig: Signal) -> Condition {
        match sig {
            Signal::Error(c) => c,
            Signal::Raise(v) => {
                let text = printer::write_value(self, v);
                Condition::new(ErrorKind::Raised, format!("uncaught: {text}"))
            }
        }
    }

    // --- garbage collection ------------------------------------------------

    /// Mark from the VM and bootstrap environments, then sweep.
    pub fn collect_garbage(&mut self) -> usize {
        let mut roots = Vec::with_capacity(64);
        self.vm.trace(&mut roots);
        roots.push(Value::Env(self.null_env));
        roots.push(Value::Env(self.report_env));
        roots.push(Value::Env(self.interaction_env));
        let (freed, _) = self.heap.collect(&roots);
        freed
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
