//! Port and I/O builtins
//!
//! The current ports live as `%current-input-port` / `%current-output-port`
//! bindings in the report environment, so user code can rebind them the
//! same way any binding shadows.

use crate::env::{self, IdentKey};
use crate::heap::{Handle, Obj};
use crate::interp::Interpreter;
use crate::port::{InPort, OutPort};
use crate::printer::{display_value, write_value};
use crate::procedure::{Args, NativeProc, ProcInfo};
use crate::reader;
use crate::value::{EvalResult, Value};
use crate::vm::Code;
use rill_core::error::{Condition, ErrorKind, type_error};

pub const CURRENT_INPUT_NAME: &str = "%current-input-port";
pub const CURRENT_OUTPUT_NAME: &str = "%current-output-port";

fn io_error(who: &str, e: std::io::Error) -> Condition {
    Condition::new(ErrorKind::Io, format!("{who}: {e}"))
}

fn current_port(interp: &mut Interpreter, name: &str) -> Result<Value, Condition> {
    let sym = interp.symbols.intern(name);
    env::find(&interp.heap, interp.vm.frame, IdentKey::Sym(sym))
        .ok_or_else(|| Condition::new(ErrorKind::Io, format!("{name} is unbound")))
}

fn out_port(interp: &mut Interpreter, who: &str, arg: Option<Value>) -> Result<Handle, Condition> {
    let v = match arg {
        Some(v) => v,
        None => current_port(interp, CURRENT_OUTPUT_NAME)?,
    };
    match v {
        Value::OutPort(h) => Ok(h),
        other => Err(type_error(who, "output port", other.kind_name())),
    }
}

fn in_port(interp: &mut Interpreter, who: &str, arg: Option<Value>) -> Result<Handle, Condition> {
    let v = match arg {
        Some(v) => v,
        None => current_port(interp, CURRENT_INPUT_NAME)?,
    };
    match v {
        Value::InPort(h) => Ok(h),
        other => Err(type_error(who, "input port", other.kind_name())),
    }
}

pub static DISPLAY: NativeProc = NativeProc {
    name: "display",
    fun: |interp, args| {
        let text = display_value(interp, args[0]);
        let port = out_port(interp, "display", args.get(1))?;
        interp
            .heap
            .outport_mut(port)
            .write_str(&text)
            .map_err(|e| io_error("display", e))?;
        Ok(Value::Undefined)
    },
    info: ProcInfo::between(1, 2),
};

pub static WRITE: NativeProc = NativeProc {
    name: "write",
    fun: |interp, args| {
        let text = write_value(interp, args[0]);
        let port = out_port(interp, "write", args.get(1))?;
        interp
            .heap
            .outport_mut(port)
            .write_str(&text)
            .map_err(|e| io_error("write", e))?;
        Ok(Value::Undefined)
    },
    info: ProcInfo::between(1, 2),
};

pub static NEWLINE: NativeProc = NativeProc {
    name: "newline",
    fun: |interp, args| {
        let port = out_port(interp, "newline", args.get(0))?;
        interp
            .heap
            .outport_mut(port)
            .write_str("\n")
            .map_err(|e| io_error("newline", e))?;
        Ok(Value::Undefined)
    },
    info: ProcInfo::between(0, 1),
};

pub static WRITE_CHAR: NativeProc = NativeProc {
    name: "write-char",
    fun: |interp, args| {
        let Value::Char(c) = args[0] else {
            return Err(type_error("write-char", "character", args[0].kind_name()).into());
        };
        let port = out_port(interp, "write-char", args.get(1))?;
        interp
            .heap
            .outport_mut(port)
            .write_str(&c.to_string())
            .map_err(|e| io_error("write-char", e))?;
        Ok(Value::Undefined)
    },
    info: ProcInfo::between(1, 2),
};

pub static READ: NativeProc = NativeProc {
    name: "read",
    fun: read_native,
    info: ProcInfo::between(0, 1),
};

/// Parse one form from the port, pulling lines until the form completes.
fn read_native(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let port = in_port(interp, "read", args.get(0))?;
    loop {
        let text = interp.heap.inport_mut(port).remaining().to_string();
        match reader::read_partial(interp, &text) {
            Ok(Some((form, used))) => {
                interp.heap.inport_mut(port).consume(used);
                return Ok(form);
            }
            Ok(None) => {
                let more = interp
                    .heap
                    .inport_mut(port)
                    .fill_line()
                    .map_err(|e| io_error("read", e))?;
                if !more {
                    interp.heap.inport_mut(port).consume(text.len());
                    return Ok(Value::Eof);
                }
            }
            Err(c) if c.is_incomplete() => {
                let more = interp
                    .heap
                    .inport_mut(port)
                    .fill_line()
                    .map_err(|e| io_error("read", e))?;
                if !more {
                    return Err(Condition::new(
                        ErrorKind::Read,
                        "end of input inside a form",
                    )
                    .into());
                }
            }
            Err(c) => return Err(c.into()),
        }
    }
}

pub static READ_CHAR: NativeProc = NativeProc {
    name: "read-char",
    fun: |interp, args| {
        let port = in_port(interp, "read-char", args.get(0))?;
        match interp
            .heap
            .inport_mut(port)
            .read_char()
            .map_err(|e| io_error("read-char", e))?
        {
            Some(c) => Ok(Value::Char(c)),
            None => Ok(Value::Eof),
        }
    },
    info: ProcInfo::between(0, 1),
};

pub static PEEK_CHAR: NativeProc = NativeProc {
    name: "peek-char",
    fun: |interp, args| {
        let port = in_port(interp, "peek-char", args.get(0))?;
        match interp
            .heap
            .inport_mut(port)
            .peek_char()
            .map_err(|e| io_error("peek-char", e))?
        {
            Some(c) => Ok(Value::Char(c)),
            None => Ok(Value::Eof),
        }
    },
    info: ProcInfo::between(0, 1),
};

pub static EOF_OBJECT_P: NativeProc = NativeProc {
    name: "eof-object?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::Eof))),
    info: ProcInfo::fixed(1),
};

pub static INPUT_PORT_P: NativeProc = NativeProc {
    name: "input-port?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::InPort(_)))),
    info: ProcInfo::fixed(1),
};

pub static OUTPUT_PORT_P: NativeProc = NativeProc {
    name: "output-port?",
    fun: |_, args| Ok(Value::Bool(matches!(args[0], Value::OutPort(_)))),
    info: ProcInfo::fixed(1),
};

pub static CURRENT_INPUT_PORT: NativeProc = NativeProc {
    name: "current-input-port",
    fun: |interp, _| Ok(current_port(interp, CURRENT_INPUT_NAME)?),
    info: ProcInfo::fixed(0),
};

pub static CURRENT_OUTPUT_PORT: NativeProc = NativeProc {
    name: "current-output-port",
    fun: |interp, _| Ok(current_port(interp, CURRENT_OUTPUT_NAME)?),
    info: ProcInfo::fixed(0),
};

fn want_path(interp: &Interpreter, who: &str, v: Value) -> Result<String, Condition> {
    match v {
        Value::Str(h) => Ok(interp.heap.string(h).to_string()),
        other => Err(type_error(who, "string", other.kind_name())),
    }
}

pub static OPEN_INPUT_FILE: NativeProc = NativeProc {
    name: "open-input-file",
    fun: |interp, args| {
        let path = want_path(interp, "open-input-file", args[0])?;
        let port = InPort::file(&path).map_err(|e| io_error("open-input-file", e))?;
        Ok(Value::InPort(interp.heap.alloc(Obj::InPort(port))))
    },
    info: ProcInfo::fixed(1),
};

pub static OPEN_OUTPUT_FILE: NativeProc = NativeProc {
    name: "open-output-file",
    fun: |interp, args| {
        let path = want_path(interp, "open-output-file", args[0])?;
        let port = OutPort::file(&path).map_err(|e| io_error("open-output-file", e))?;
        Ok(Value::OutPort(interp.heap.alloc(Obj::OutPort(port))))
    },
    info: ProcInfo::fixed(1),
};

pub static CLOSE_INPUT_PORT: NativeProc = NativeProc {
    name: "close-input-port",
    fun: |interp, args| {
        let Value::InPort(h) = args[0] else {
            return Err(type_error("close-input-port", "input port", args[0].kind_name()).into());
        };
        // dropping the reader closes the file; leave an exhausted port
        *interp.heap.inport_mut(h) = InPort::text(String::new());
        Ok(Value::Undefined)
    },
    info: ProcInfo::fixed(1),
};

pub static CLOSE_OUTPUT_PORT: NativeProc = NativeProc {
    name: "close-output-port",
    fun: |interp, args| {
        let Value::OutPort(h) = args[0] else {
            return Err(type_error("close-output-port", "output port", args[0].kind_name()).into());
        };
        interp
            .heap
            .outport_mut(h)
            .flush()
            .map_err(|e| io_error("close-output-port", e))?;
        *interp.heap.outport_mut(h) = OutPort::Stderr;
        Ok(Value::Undefined)
    },
    info: ProcInfo::fixed(1),
};

pub static LOAD: NativeProc = NativeProc {
    name: "load",
    fun: load_native,
    info: ProcInfo::fixed(1).keep_vals(),
};

/// Read the whole file and schedule its forms; they run in sequence on
/// the main loop rather than through a nested driver.
fn load_native(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let path = want_path(interp, "load", args[0])?;
    let text = std::fs::read_to_string(&path).map_err(|e| io_error("load", e))?;
    let forms = reader::read_all(interp, &text)?;
    if !forms.is_empty() {
        let list = crate::cons::list_from(&mut interp.heap, forms);
        interp.vm.code.push(Code::Seq(list));
    }
    Ok(Value::Undefined)
}
