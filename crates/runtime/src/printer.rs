//! Printer: values back to text
//!
//! Two renderings, per R5RS: `write` is machine-readable (strings quoted
//! and escaped, characters as `#\x`), `display` is for humans. Opaque
//! runtime objects print as `#<...>` forms.

use crate::heap::Promise;
use crate::interp::Interpreter;
use crate::value::Value;
use rill_core::number::format_number;

/// Upper bound on printed nodes, so a cyclic structure made with
/// `set-cdr!` terminates instead of hanging the REPL.
const NODE_BUDGET: usize = 100_000;

pub fn write_value(interp: &Interpreter, v: Value) -> String {
    render(interp, v, true)
}

pub fn display_value(interp: &Interpreter, v: Value) -> String {
    render(interp, v, false)
}

fn render(interp: &Interpreter, v: Value, readable: bool) -> String {
    let mut out = String::new();
    let mut budget = NODE_BUDGET;
    fmt(interp, v, readable, &mut out, &mut budget);
    out
}

fn fmt(interp: &Interpreter, v: Value, readable: bool, out: &mut String, budget: &mut usize) {
    if *budget == 0 {
        out.push_str("...");
        return;
    }
    *budget -= 1;

    match v {
        Value::Undefined => out.push_str("#<undefined>"),
        Value::Nil => out.push_str("()"),
        Value::Eof => out.push_str("#<eof>"),
        Value::Bool(b) => out.push_str(if b { "#t" } else { "#f" }),
        Value::Char(c) => {
            if readable {
                match c {
                    ' ' => out.push_str("#\\space"),
                    '\n' => out.push_str("#\\newline"),
                    '\t' => out.push_str("#\\tab"),
                    _ => {
                        out.push_str("#\\");
                        out.push(c);
                    }
                }
            } else {
                out.push(c);
            }
        }
        Value::Int(_) | Value::Ratio(_, _) | Value::Real(_) | Value::Complex(_, _) => {
            out.push_str(&format_number(v.number().unwrap(), 10));
        }
        Value::Sym(id) => out.push_str(interp.symbols.name(id)),
        Value::Str(h) => {
            let s = interp.heap.string(h);
            if readable {
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        _ => out.push(c),
                    }
                }
                out.push('"');
            } else {
                out.push_str(s);
            }
        }
        Value::Pair(h) => {
            out.push('(');
            let (car, mut rest) = interp.heap.pair(h);
            fmt(interp, car, readable, out, budget);
            loop {
                if *budget == 0 {
                    out.push_str(" ...");
                    break;
                }
                match rest {
                    Value::Nil => break,
                    Value::Pair(h) => {
                        let (car, cdr) = interp.heap.pair(h);
                        out.push(' ');
                        fmt(interp, car, readable, out, budget);
                        rest = cdr;
                    }
                    tail => {
                        out.push_str(" . ");
                        fmt(interp, tail, readable, out, budget);
                        break;
                    }
                }
            }
            out.push(')');
        }
        Value::Vector(h) => {
            out.push_str("#(");
            let elems = interp.heap.vector(h);
            for (i, e) in elems.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                fmt(interp, *e, readable, out, budget);
            }
            out.push(')');
        }
        Value::Lambda(h) => {
            match interp.heap.lambda(h).name {
                Some(id) => {
                    out.push_str("#<procedure ");
                    out.push_str(interp.symbols.name(id));
                    out.push('>');
                }
                None => out.push_str("#<procedure>"),
            }
        }
        Value::Native(n) => {
            out.push_str("#<procedure ");
            out.push_str(n.name);
            out.push('>');
        }
        Value::Continuation(_) => out.push_str("#<continuation>"),
        Value::SynClosure(h) => {
            out.push_str("#<syntactic-closure ");
            let expr = interp.heap.sclosure(h).expr;
            fmt(interp, expr, readable, out, budget);
            out.push('>');
        }
        Value::Rules(_) => out.push_str("#<syntax-rules>"),
        Value::Promise(h) => match interp.heap.promise(h) {
            Promise::Forced(_) => out.push_str("#<promise (forced)>"),
            Promise::Pending { .. } => out.push_str("#<promise>"),
        },
        Value::Env(_) => out.push_str("#<environment>"),
        Value::InPort(_) => out.push_str("#<input-port>"),
        Value::OutPort(_) => out.push_str("#<output-port>"),
    }
}
