//! Core special forms
//!
//! Whole-passing natives that manipulate the code stack directly
//! (`quote`, `lambda`, `if`, `set!`, `define`, `begin`) or rewrite into
//! simpler forms that are re-evaluated (`let` family, `do`,
//! `quasiquote`). Rewrites splice the target native *values* into the
//! constructed forms, so a user binding named `lambda` cannot capture
//! them.

use crate::cons::{list_from, list_length, list_to_vec, nth, nth_cdr};
use crate::heap::Obj;
use crate::interp::Interpreter;
use crate::procedure::{Args, Lambda, NativeProc, ProcInfo, Returning, parse_params};
use crate::rules::SyntaxRules;
use crate::sclosure::{is_identifier, underlying_symbol};
use crate::value::{EvalResult, Value};
use crate::vm::{Code, Op};
use rill_core::error::syntax_error;

fn as_env(v: Value) -> crate::heap::Handle {
    match v {
        Value::Env(h) => h,
        other => panic!("special form: expected environment, got {}", other.kind_name()),
    }
}

/// Arguments of the call form (everything after the keyword).
fn form_args(interp: &Interpreter, who: &str, form: Value) -> rill_core::Result<Vec<Value>> {
    match form {
        Value::Pair(h) => list_to_vec(&interp.heap, who, interp.heap.cdr(h)),
        _ => Err(syntax_error(who, "not a call form")),
    }
}

// --- quote -----------------------------------------------------------------

pub static QUOTE: NativeProc = NativeProc {
    name: "quote",
    fun: quote,
    info: ProcInfo::whole(),
};

fn quote(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let datum = nth(&interp.heap, "quote", args[0], 1)
        .map_err(|_| syntax_error("quote", "missing datum"))?;
    // quoted data never carries hygiene wrappers
    Ok(strip_wrappers(interp, datum))
}

/// Replace syntactic closures with their expressions, rebuilding only
/// the spines that contain one.
fn strip_wrappers(interp: &mut Interpreter, v: Value) -> Value {
    match v {
        Value::SynClosure(h) => {
            let expr = interp.heap.sclosure(h).expr;
            strip_wrappers(interp, expr)
        }
        Value::Pair(h) => {
            let (car, cdr) = interp.heap.pair(h);
            let s_car = strip_wrappers(interp, car);
            let s_cdr = strip_wrappers(interp, cdr);
            if s_car == car && s_cdr == cdr {
                v
            } else {
                interp.heap.pair_value(s_car, s_cdr)
            }
        }
        Value::Vector(h) => {
            let elems = interp.heap.vector(h).clone();
            let stripped: Vec<Value> = elems
                .iter()
                .map(|e| strip_wrappers(interp, *e))
                .collect();
            if stripped == elems {
                v
            } else {
                interp.heap.vector_value(stripped)
            }
        }
        other => other,
    }
}

// --- lambda ----------------------------------------------------------------

pub static LAMBDA: NativeProc = NativeProc {
    name: "lambda",
    fun: lambda,
    info: ProcInfo::whole(),
};

fn lambda(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let env = as_env(args[1]);
    let params = nth(&interp.heap, "lambda", args[0], 1)
        .map_err(|_| syntax_error("lambda", "missing parameter list"))?;
    let body = nth_cdr(&interp.heap, "lambda", args[0], 2)?;
    make_lambda(interp, params, body, env, None)
}

pub(crate) fn make_lambda(
    interp: &mut Interpreter,
    params: Value,
    body: Value,
    env: crate::heap::Handle,
    name: Option<rill_core::SymbolId>,
) -> EvalResult<Value> {
    if list_length(&interp.heap, body).is_none_or(|n| n == 0) {
        return Err(syntax_error("lambda", "body must be a nonempty list").into());
    }
    let (fixed, rest) = parse_params(&interp.heap, params)?;
    let info = ProcInfo {
        required: fixed.len(),
        max: if rest.is_some() { None } else { Some(fixed.len()) },
        ..ProcInfo::fixed(0)
    };
    let lambda = Lambda {
        params: fixed,
        rest,
        body,
        env,
        name,
        info,
    };
    Ok(Value::Lambda(interp.heap.alloc(Obj::Lambda(lambda))))
}

// --- if --------------------------------------------------------------------

pub static IF: NativeProc = NativeProc {
    name: "if",
    fun: if_form,
    info: ProcInfo::whole().keep_vals(),
};

fn if_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let parts = form_args(interp, "if", args[0])?;
    if parts.len() < 2 || parts.len() > 3 {
        return Err(syntax_error("if", "expected (if test consequent [alternative])").into());
    }
    let alt = parts.get(2).copied().unwrap_or(Value::Undefined);
    interp.vm.code.push(Code::Lit(alt));
    interp.vm.code.push(Code::Lit(parts[1]));
    interp.vm.code.push(Code::Op(Op::If));
    interp.vm.code.push(Code::Form(parts[0]));
    Ok(Value::Undefined)
}

// --- set! and define -------------------------------------------------------

pub static SET: NativeProc = NativeProc {
    name: "set!",
    fun: set_form,
    info: ProcInfo::whole().keep_vals(),
};

fn set_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let parts = form_args(interp, "set!", args[0])?;
    let [ident, expr] = parts[..] else {
        return Err(syntax_error("set!", "expected (set! identifier expression)").into());
    };
    if !is_identifier(&interp.heap, ident) {
        return Err(syntax_error("set!", "target is not an identifier").into());
    }
    interp.vm.code.push(Code::Lit(ident));
    interp.vm.code.push(Code::Op(Op::Set));
    interp.vm.code.push(Code::Form(expr));
    Ok(Value::Undefined)
}

pub static DEFINE: NativeProc = NativeProc {
    name: "define",
    fun: define_form,
    info: ProcInfo::whole().keep_vals(),
};

fn define_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let form = args[0];
    let env = as_env(args[1]);
    let target = nth(&interp.heap, "define", form, 1)
        .map_err(|_| syntax_error("define", "missing target"))?;

    if is_identifier(&interp.heap, target) {
        let parts = form_args(interp, "define", form)?;
        let [_, expr] = parts[..] else {
            return Err(syntax_error("define", "expected (define identifier expression)").into());
        };
        interp.vm.code.push(Code::Lit(target));
        interp.vm.code.push(Code::Op(Op::Define));
        interp.vm.code.push(Code::Form(expr));
        return Ok(Value::Undefined);
    }

    // function shorthand: (define (name . params) body ...)
    if let Value::Pair(h) = target {
        let (name_ident, params) = interp.heap.pair(h);
        if !is_identifier(&interp.heap, name_ident) {
            return Err(syntax_error("define", "procedure name is not an identifier").into());
        }
        let body = nth_cdr(&interp.heap, "define", form, 2)?;
        let name = underlying_symbol(&interp.heap, name_ident);
        let proc = make_lambda(interp, params, body, env, name)?;
        interp.vm.code.push(Code::Lit(name_ident));
        interp.vm.code.push(Code::Op(Op::Define));
        interp.vm.code.push(Code::Form(proc));
        return Ok(Value::Undefined);
    }

    Err(syntax_error("define", "malformed target").into())
}

// --- begin -----------------------------------------------------------------

pub static BEGIN: NativeProc = NativeProc {
    name: "begin",
    fun: begin_form,
    info: ProcInfo::whole().keep_vals(),
};

fn begin_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let body = nth_cdr(&interp.heap, "begin", args[0], 1)?;
    if list_length(&interp.heap, body).is_none_or(|n| n == 0) {
        return Err(syntax_error("begin", "expected at least one expression").into());
    }
    interp.vm.code.push(Code::Seq(body));
    Ok(Value::Undefined)
}

// --- let family (rewriters) ------------------------------------------------

pub static LET: NativeProc = NativeProc {
    name: "let",
    fun: let_form,
    info: ProcInfo::whole().returning(Returning::Code),
};

fn let_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let parts = form_args(interp, "let", args[0])?;
    if parts.is_empty() {
        return Err(syntax_error("let", "missing bindings").into());
    }

    // named let loops through letrec
    if is_identifier(&interp.heap, parts[0]) {
        if parts.len() < 3 {
            return Err(syntax_error("let", "named let needs bindings and a body").into());
        }
        let name = parts[0];
        let (vars, inits) = split_bindings(interp, "let", parts[1])?;
        let body = nth_cdr(&interp.heap, "let", args[0], 3)?;

        let params = list_from(&mut interp.heap, vars);
        let mut lambda_form = vec![Value::Native(&LAMBDA), params];
        lambda_form.extend(crate::cons::ConsIter::new(&interp.heap, body).collect::<Vec<_>>());
        let lambda_form = list_from(&mut interp.heap, lambda_form);

        let binding = list_from(&mut interp.heap, vec![name, lambda_form]);
        let bindings = list_from(&mut interp.heap, vec![binding]);
        let letrec_form =
            list_from(&mut interp.heap, vec![Value::Native(&LETREC), bindings, name]);

        let mut call = vec![letrec_form];
        call.extend(inits);
        return Ok(list_from(&mut interp.heap, call));
    }

    let (vars, inits) = split_bindings(interp, "let", parts[0])?;
    let body = nth_cdr(&interp.heap, "let", args[0], 2)?;
    let params = list_from(&mut interp.heap, vars);
    let mut lambda_form = vec![Value::Native(&LAMBDA), params];
    lambda_form.extend(crate::cons::ConsIter::new(&interp.heap, body).collect::<Vec<_>>());
    let lambda_form = list_from(&mut interp.heap, lambda_form);

    let mut call = vec![lambda_form];
    call.extend(inits);
    Ok(list_from(&mut interp.heap, call))
}

/// `((v init) ...)` into parallel vectors.
fn split_bindings(
    interp: &Interpreter,
    who: &str,
    bindings: Value,
) -> rill_core::Result<(Vec<Value>, Vec<Value>)> {
    let pairs = list_to_vec(&interp.heap, who, bindings)?;
    let mut vars = Vec::with_capacity(pairs.len());
    let mut inits = Vec::with_capacity(pairs.len());
    for b in pairs {
        let parts = list_to_vec(&interp.heap, who, b)?;
        let [var, init] = parts[..] else {
            return Err(syntax_error(who, "binding is not (identifier expression)"));
        };
        if !is_identifier(&interp.heap, var) {
            return Err(syntax_error(who, "binding target is not an identifier"));
        }
        vars.push(var);
        inits.push(init);
    }
    Ok((vars, inits))
}

pub static LET_STAR: NativeProc = NativeProc {
    name: "let*",
    fun: let_star_form,
    info: ProcInfo::whole().returning(Returning::Code),
};

fn let_star_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let bindings = nth(&interp.heap, "let*", args[0], 1)
        .map_err(|_| syntax_error("let*", "missing bindings"))?;
    let body = nth_cdr(&interp.heap, "let*", args[0], 2)?;

    match bindings {
        Value::Nil => {
            let mut form = vec![Value::Native(&LET), Value::Nil];
            form.extend(crate::cons::ConsIter::new(&interp.heap, body).collect::<Vec<_>>());
            Ok(list_from(&mut interp.heap, form))
        }
        Value::Pair(h) => {
            let (first, rest) = interp.heap.pair(h);
            let inner = if rest.is_nil() {
                body
            } else {
                let mut inner_form = vec![Value::Native(&LET_STAR), rest];
                inner_form
                    .extend(crate::cons::ConsIter::new(&interp.heap, body).collect::<Vec<_>>());
                let inner_form = list_from(&mut interp.heap, inner_form);
                list_from(&mut interp.heap, vec![inner_form])
            };
            let first_bindings = list_from(&mut interp.heap, vec![first]);
            let mut form = vec![Value::Native(&LET), first_bindings];
            form.extend(crate::cons::ConsIter::new(&interp.heap, inner).collect::<Vec<_>>());
            Ok(list_from(&mut interp.heap, form))
        }
        _ => Err(syntax_error("let*", "malformed bindings").into()),
    }
}

pub static LETREC: NativeProc = NativeProc {
    name: "letrec",
    fun: letrec_form,
    info: ProcInfo::whole().returning(Returning::Code),
};

fn letrec_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let bindings = nth(&interp.heap, "letrec", args[0], 1)
        .map_err(|_| syntax_error("letrec", "missing bindings"))?;
    let body = nth_cdr(&interp.heap, "letrec", args[0], 2)?;
    if list_length(&interp.heap, body).is_none_or(|n| n == 0) {
        return Err(syntax_error("letrec", "body must be a nonempty list").into());
    }
    let (vars, inits) = split_bindings(interp, "letrec", bindings)?;

    // ((lambda () (define v init) ... body ...))
    let mut forms = vec![Value::Native(&LAMBDA), Value::Nil];
    for (v, i) in vars.iter().zip(&inits) {
        let def = list_from(&mut interp.heap, vec![Value::Native(&DEFINE), *v, *i]);
        forms.push(def);
    }
    forms.extend(crate::cons::ConsIter::new(&interp.heap, body).collect::<Vec<_>>());
    let lambda_form = list_from(&mut interp.heap, forms);
    Ok(list_from(&mut interp.heap, vec![lambda_form]))
}

pub static DO: NativeProc = NativeProc {
    name: "do",
    fun: do_form,
    info: ProcInfo::whole().returning(Returning::Code),
};

fn do_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let parts = form_args(interp, "do", args[0])?;
    if parts.len() < 2 {
        return Err(syntax_error("do", "expected (do bindings (test expr ...) command ...)").into());
    }
    let specs = list_to_vec(&interp.heap, "do", parts[0])?;
    let mut vars = Vec::new();
    let mut inits = Vec::new();
    let mut steps = Vec::new();
    for spec in specs {
        let fields = list_to_vec(&interp.heap, "do", spec)?;
        match fields[..] {
            [v, i] => {
                vars.push(v);
                inits.push(i);
                steps.push(v);
            }
            [v, i, s] => {
                vars.push(v);
                inits.push(i);
                steps.push(s);
            }
            _ => return Err(syntax_error("do", "binding is not (var init [step])").into()),
        }
    }

    let ending = list_to_vec(&interp.heap, "do", parts[1])?;
    let (test, result_exprs) = ending
        .split_first()
        .ok_or_else(|| syntax_error("do", "missing test clause"))?;
    let commands = &parts[2..];

    let loop_sym = Value::Sym(interp.symbols.gensym());

    // (loop step ...)
    let mut again = vec![loop_sym];
    again.extend(steps);
    let again = list_from(&mut interp.heap, again);

    // (begin command ... (loop step ...))
    let mut repeat = vec![Value::Native(&BEGIN)];
    repeat.extend(commands.iter().copied());
    repeat.push(again);
    let repeat = list_from(&mut interp.heap, repeat);

    // result: (begin expr ...) or the unspecified value
    let done = if result_exprs.is_empty() {
        list_from(&mut interp.heap, vec![Value::Native(&QUOTE), Value::Undefined])
    } else {
        let mut done = vec![Value::Native(&BEGIN)];
        done.extend(result_exprs.iter().copied());
        list_from(&mut interp.heap, done)
    };

    let test_form = list_from(&mut interp.heap, vec![Value::Native(&IF), *test, done, repeat]);

    // (let loop ((v init) ...) (if test done repeat))
    let mut bindings = Vec::new();
    for (v, i) in vars.iter().zip(&inits) {
        bindings.push(list_from(&mut interp.heap, vec![*v, *i]));
    }
    let bindings = list_from(&mut interp.heap, bindings);
    Ok(list_from(
        &mut interp.heap,
        vec![Value::Native(&LET), loop_sym, bindings, test_form],
    ))
}

// --- delay -----------------------------------------------------------------

pub static DELAY: NativeProc = NativeProc {
    name: "delay",
    fun: delay_form,
    info: ProcInfo::whole(),
};

fn delay_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let env = as_env(args[1]);
    let parts = form_args(interp, "delay", args[0])?;
    let [expr] = parts[..] else {
        return Err(syntax_error("delay", "expected (delay expression)").into());
    };
    Ok(Value::Promise(interp.heap.alloc(Obj::Promise(
        crate::heap::Promise::Pending { expr, env },
    ))))
}

// --- quasiquote ------------------------------------------------------------

pub static QUASIQUOTE: NativeProc = NativeProc {
    name: "quasiquote",
    fun: quasiquote_form,
    info: ProcInfo::whole().returning(Returning::Code),
};

pub static UNQUOTE: NativeProc = NativeProc {
    name: "unquote",
    fun: unquote_form,
    info: ProcInfo::fixed(1),
};

pub static UNQUOTE_SPLICING: NativeProc = NativeProc {
    name: "unquote-splicing",
    fun: unquote_splicing_form,
    info: ProcInfo::fixed(1).returning(Returning::Splice),
};

fn unquote_form(_interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    Ok(args[0])
}

fn unquote_splicing_form(_interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    Ok(args[0])
}

/// Which quasiquote escape (if any) heads this form.
fn escape_kind(interp: &Interpreter, form: Value) -> Option<(&'static NativeProc, Value)> {
    let Value::Pair(h) = form else { return None };
    let (head, tail) = interp.heap.pair(h);
    let name = underlying_symbol(&interp.heap, head)
        .map(|id| interp.symbols.name(id))?;
    let native: &'static NativeProc = match name {
        "unquote" => &UNQUOTE,
        "unquote-splicing" => &UNQUOTE_SPLICING,
        _ => return None,
    };
    let Value::Pair(th) = tail else { return None };
    let (expr, rest) = interp.heap.pair(th);
    if rest.is_nil() { Some((native, expr)) } else { None }
}

fn quasiquote_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let parts = form_args(interp, "quasiquote", args[0])?;
    let [template] = parts[..] else {
        return Err(syntax_error("quasiquote", "expected (quasiquote template)").into());
    };
    Ok(qq_rewrite(interp, template))
}

/// Rewrite a template into list*/vector construction calls, with escapes
/// evaluated (and splices spliced) at the right places.
fn qq_rewrite(interp: &mut Interpreter, template: Value) -> Value {
    if let Some((native, expr)) = escape_kind(interp, template) {
        if std::ptr::eq(native, &UNQUOTE) {
            return expr;
        }
        // a lone ,@x has no surrounding list to splice into
        return list_from(
            &mut interp.heap,
            vec![Value::Native(&UNQUOTE_SPLICING), expr],
        );
    }

    match template {
        Value::Pair(_) => {
            let mut elems = vec![Value::Native(&crate::list_ops::LIST_STAR)];
            let mut cur = template;
            loop {
                match cur {
                    Value::Pair(h) => {
                        // a dotted escape tail like (a . ,b) ends the walk
                        if escape_kind(interp, cur).is_some() {
                            elems.push(qq_element(interp, cur));
                            break;
                        }
                        let (car, cdr) = interp.heap.pair(h);
                        elems.push(qq_element(interp, car));
                        cur = cdr;
                    }
                    Value::Nil => {
                        elems.push(list_from(
                            &mut interp.heap,
                            vec![Value::Native(&QUOTE), Value::Nil],
                        ));
                        break;
                    }
                    tail => {
                        elems.push(qq_element(interp, tail));
                        break;
                    }
                }
            }
            list_from(&mut interp.heap, elems)
        }
        Value::Vector(h) => {
            let items = interp.heap.vector(h).clone();
            let mut elems = vec![Value::Native(&crate::vector_ops::VECTOR)];
            for item in items {
                elems.push(qq_element(interp, item));
            }
            list_from(&mut interp.heap, elems)
        }
        atom => list_from(&mut interp.heap, vec![Value::Native(&QUOTE), atom]),
    }
}

fn qq_element(interp: &mut Interpreter, elem: Value) -> Value {
    if let Some((native, expr)) = escape_kind(interp, elem) {
        return list_from(&mut interp.heap, vec![Value::Native(native), expr]);
    }
    list_from(&mut interp.heap, vec![Value::Native(&QUASIQUOTE), elem])
}

// --- macro definition forms ------------------------------------------------

pub static SYNTAX_RULES: NativeProc = NativeProc {
    name: "syntax-rules",
    fun: syntax_rules_form,
    info: ProcInfo::whole(),
};

fn syntax_rules_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let env = as_env(args[1]);
    let parts = form_args(interp, "syntax-rules", args[0])?;
    let (lits, rules_src) = parts
        .split_first()
        .ok_or_else(|| syntax_error("syntax-rules", "missing literal list"))?;

    let literals = list_to_vec(&interp.heap, "syntax-rules", *lits)?;
    for l in &literals {
        if !is_identifier(&interp.heap, *l) {
            return Err(syntax_error("syntax-rules", "literal is not an identifier").into());
        }
    }

    let mut rules = Vec::with_capacity(rules_src.len());
    for r in rules_src {
        let parts = list_to_vec(&interp.heap, "syntax-rules", *r)?;
        let [pattern, template] = parts[..] else {
            return Err(syntax_error("syntax-rules", "rule is not (pattern template)").into());
        };
        if !matches!(pattern, Value::Pair(_)) {
            return Err(syntax_error("syntax-rules", "pattern must be a call form").into());
        }
        rules.push((pattern, template));
    }

    Ok(Value::Rules(interp.heap.alloc(Obj::Rules(SyntaxRules {
        env,
        literals,
        rules,
    }))))
}

pub static DEFINE_SYNTAX: NativeProc = NativeProc {
    name: "define-syntax",
    fun: define_syntax_form,
    info: ProcInfo::whole().keep_vals(),
};

fn define_syntax_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let parts = form_args(interp, "define-syntax", args[0])?;
    let [ident, expr] = parts[..] else {
        return Err(
            syntax_error("define-syntax", "expected (define-syntax name transformer)").into(),
        );
    };
    if !is_identifier(&interp.heap, ident) {
        return Err(syntax_error("define-syntax", "name is not an identifier").into());
    }
    interp.vm.code.push(Code::Lit(ident));
    interp.vm.code.push(Code::Op(Op::Define));
    interp.vm.code.push(Code::Form(expr));
    Ok(Value::Undefined)
}

pub static LET_SYNTAX: NativeProc = NativeProc {
    name: "let-syntax",
    fun: let_syntax_form,
    info: ProcInfo::whole().returning(Returning::Code),
};

fn let_syntax_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let mut form = crate::cons::ConsIter::new(&interp.heap, args[0]).collect::<Vec<_>>();
    form[0] = Value::Native(&LET);
    Ok(list_from(&mut interp.heap, form))
}

pub static LETREC_SYNTAX: NativeProc = NativeProc {
    name: "letrec-syntax",
    fun: letrec_syntax_form,
    info: ProcInfo::whole().returning(Returning::Code),
};

fn letrec_syntax_form(interp: &mut Interpreter, args: Args) -> EvalResult<Value> {
    let mut form = crate::cons::ConsIter::new(&interp.heap, args[0]).collect::<Vec<_>>();
    form[0] = Value::Native(&LETREC);
    Ok(list_from(&mut interp.heap, form))
}
