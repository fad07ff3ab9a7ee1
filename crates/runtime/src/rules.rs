//! `syntax-rules` transformers
//!
//! A transformer is a definition environment, a literal list, and ordered
//! (pattern, template) rules. Expansion tries each rule: match the call
//! form against the pattern (literals compare by binding, `_` matches
//! anything, `...` captures zero or more), then instantiate the template.
//! Template-introduced identifiers are wrapped in syntactic closures over
//! the definition environment — one wrapper per distinct symbol per
//! expansion, so a template binder and its references stay unified.

use crate::cons::{ConsIter, GrowList};
use crate::heap::{Handle, Obj};
use crate::interp::Interpreter;
use crate::sclosure::{SynClosure, identifier_eq, is_identifier, underlying_symbol};
use crate::value::{EvalResult, Value};
use rill_core::SymbolId;
use rill_core::error::{Condition, ErrorKind, Result};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug)]
pub struct SyntaxRules {
    /// Environment the transformer was defined in.
    pub env: Handle,
    /// Literal identifiers, matched by binding rather than captured.
    pub literals: Vec<Value>,
    /// (pattern, template) pairs, tried in order.
    pub rules: Vec<(Value, Value)>,
}

impl SyntaxRules {
    pub fn trace(&self, work: &mut Vec<Value>) {
        work.push(Value::Env(self.env));
        work.extend(self.literals.iter().copied());
        for (p, t) in &self.rules {
            work.push(*p);
            work.push(*t);
        }
    }
}

/// Captures: plain for an ordinary variable, nested per ellipsis depth.
#[derive(Debug, Clone)]
enum Binding {
    One(Value),
    Many(Vec<Binding>),
}

type Bindings = HashMap<SymbolId, Binding>;

struct Ctx {
    def_env: Handle,
    use_env: Handle,
    /// (underlying symbol, literal identifier as written)
    literals: Vec<(SymbolId, Value)>,
    ellipsis: SymbolId,
    wildcard: SymbolId,
}

/// Expand `form` (the whole macro call) in `use_env`. The caller
/// re-pushes the result as code.
pub fn expand(
    interp: &mut Interpreter,
    rules: Handle,
    form: Value,
    use_env: Handle,
) -> EvalResult<Value> {
    let sr = interp.heap.rules(rules);
    let (def_env, literal_idents, rule_list) = (sr.env, sr.literals.clone(), sr.rules.clone());
    let ellipsis = interp.symbols.intern("...");
    let wildcard = interp.symbols.intern("_");
    let literals = literal_idents
        .iter()
        .filter_map(|l| underlying_symbol(&interp.heap, *l).map(|s| (s, *l)))
        .collect();
    let ctx = Ctx {
        def_env,
        use_env,
        literals,
        ellipsis,
        wildcard,
    };

    let form_args = match form {
        Value::Pair(h) => interp.heap.cdr(h),
        _ => {
            return Err(Condition::new(ErrorKind::Macro, "macro use is not a call form").into());
        }
    };

    for (pattern, template) in &rule_list {
        // skip the keyword position of the pattern
        let pat_args = match pattern {
            Value::Pair(h) => interp.heap.cdr(*h),
            _ => return Err(Condition::new(ErrorKind::Macro, "pattern is not a list").into()),
        };
        let mut binds = Bindings::new();
        if match_pattern(interp, &ctx, pat_args, form_args, &mut binds)? {
            trace!("syntax-rules pattern matched");
            let mut cache: HashMap<SymbolId, Value> = HashMap::new();
            return instantiate(interp, &ctx, &binds, &mut cache, *template)
                .map_err(Into::into);
        }
    }
    Err(Condition::new(ErrorKind::Macro, "no pattern matches the macro use").into())
}

// --- matching --------------------------------------------------------------

fn is_ellipsis(interp: &Interpreter, ctx: &Ctx, v: Value) -> bool {
    underlying_symbol(&interp.heap, v) == Some(ctx.ellipsis)
}

fn match_pattern(
    interp: &Interpreter,
    ctx: &Ctx,
    pat: Value,
    form: Value,
    binds: &mut Bindings,
) -> Result<bool> {
    if is_identifier(&interp.heap, pat) {
        let sym = underlying_symbol(&interp.heap, pat).unwrap();
        if sym == ctx.wildcard {
            return Ok(true);
        }
        if let Some((_, lit)) = ctx.literals.iter().find(|(s, _)| *s == sym) {
            return Ok(is_identifier(&interp.heap, form)
                && identifier_eq(&interp.heap, ctx.use_env, form, ctx.def_env, *lit));
        }
        binds.insert(sym, Binding::One(form));
        return Ok(true);
    }

    match pat {
        Value::Nil => Ok(form.is_nil()),
        Value::Pair(h) => {
            let (pcar, pcdr) = interp.heap.pair(h);
            if let Value::Pair(h2) = pcdr
                && is_ellipsis(interp, ctx, interp.heap.car(h2))
            {
                let after = interp.heap.cdr(h2);
                return match_ellipsis(interp, ctx, pcar, after, form, binds);
            }
            let Value::Pair(fh) = form else {
                return Ok(false);
            };
            let (fcar, fcdr) = interp.heap.pair(fh);
            Ok(match_pattern(interp, ctx, pcar, fcar, binds)?
                && match_pattern(interp, ctx, pcdr, fcdr, binds)?)
        }
        Value::Vector(ph) => {
            let Value::Vector(fh) = form else {
                return Ok(false);
            };
            let pats = interp.heap.vector(ph).clone();
            let forms = interp.heap.vector(fh).clone();
            match_slice(interp, ctx, &pats, &forms, binds)
        }
        datum => Ok(datum_eqv(interp, datum, form)),
    }
}

/// `sub ... after` against a form chain: the ellipsis takes whatever the
/// trailing pattern does not need.
fn match_ellipsis(
    interp: &Interpreter,
    ctx: &Ctx,
    sub: Value,
    after: Value,
    form: Value,
    binds: &mut Bindings,
) -> Result<bool> {
    let mut items = Vec::new();
    let mut it = ConsIter::new(&interp.heap, form);
    items.extend(it.by_ref());
    let tail = it.rest();

    let mut after_len = 0;
    {
        let mut it = ConsIter::new(&interp.heap, after);
        after_len += it.by_ref().count();
    }
    if items.len() < after_len {
        return Ok(false);
    }
    let n = items.len() - after_len;

    let mut vars = Vec::new();
    pattern_vars(interp, ctx, sub, &mut vars);
    let mut columns: HashMap<SymbolId, Vec<Binding>> =
        vars.iter().map(|v| (*v, Vec::new())).collect();

    for item in items.iter().take(n) {
        let mut sub_binds = Bindings::new();
        if !match_pattern(interp, ctx, sub, *item, &mut sub_binds)? {
            return Ok(false);
        }
        for v in &vars {
            let b = sub_binds.remove(v).ok_or_else(|| {
                Condition::new(ErrorKind::Macro, "pattern variable missing from submatch")
            })?;
            columns.get_mut(v).unwrap().push(b);
        }
    }
    for (v, col) in columns {
        binds.insert(v, Binding::Many(col));
    }

    // the trailing pattern consumes the rest, element-wise
    let mut ap = after;
    let mut idx = n;
    loop {
        match ap {
            Value::Pair(h) => {
                let (pcar, pcdr) = interp.heap.pair(h);
                if !match_pattern(interp, ctx, pcar, items[idx], binds)? {
                    return Ok(false);
                }
                idx += 1;
                ap = pcdr;
            }
            Value::Nil => return Ok(tail.is_nil()),
            dotted => return match_pattern(interp, ctx, dotted, tail, binds),
        }
    }
}

fn match_slice(
    interp: &Interpreter,
    ctx: &Ctx,
    pats: &[Value],
    forms: &[Value],
    binds: &mut Bindings,
) -> Result<bool> {
    if pats.len() >= 2 && is_ellipsis(interp, ctx, pats[1]) {
        let sub = pats[0];
        let after = &pats[2..];
        if forms.len() < after.len() {
            return Ok(false);
        }
        let n = forms.len() - after.len();

        let mut vars = Vec::new();
        pattern_vars(interp, ctx, sub, &mut vars);
        let mut columns: HashMap<SymbolId, Vec<Binding>> =
            vars.iter().map(|v| (*v, Vec::new())).collect();
        for form in forms.iter().take(n) {
            let mut sub_binds = Bindings::new();
            if !match_pattern(interp, ctx, sub, *form, &mut sub_binds)? {
                return Ok(false);
            }
            for v in &vars {
                let b = sub_binds.remove(v).ok_or_else(|| {
                    Condition::new(ErrorKind::Macro, "pattern variable missing from submatch")
                })?;
                columns.get_mut(v).unwrap().push(b);
            }
        }
        for (v, col) in columns {
            binds.insert(v, Binding::Many(col));
        }
        return match_slice(interp, ctx, after, &forms[n..], binds);
    }
    match (pats.first(), forms.first()) {
        (None, None) => Ok(true),
        (Some(p), Some(f)) => Ok(match_pattern(interp, ctx, *p, *f, binds)?
            && match_slice(interp, ctx, &pats[1..], &forms[1..], binds)?),
        _ => Ok(false),
    }
}

/// Pattern variables under `pat`: identifiers that are not literals, the
/// wildcard, or the ellipsis marker.
fn pattern_vars(interp: &Interpreter, ctx: &Ctx, pat: Value, out: &mut Vec<SymbolId>) {
    if is_identifier(&interp.heap, pat) {
        let sym = underlying_symbol(&interp.heap, pat).unwrap();
        if sym != ctx.wildcard
            && sym != ctx.ellipsis
            && !ctx.literals.iter().any(|(s, _)| *s == sym)
            && !out.contains(&sym)
        {
            out.push(sym);
        }
        return;
    }
    match pat {
        Value::Pair(h) => {
            let (car, cdr) = interp.heap.pair(h);
            pattern_vars(interp, ctx, car, out);
            pattern_vars(interp, ctx, cdr, out);
        }
        Value::Vector(h) => {
            for v in interp.heap.vector(h).clone() {
                pattern_vars(interp, ctx, v, out);
            }
        }
        _ => {}
    }
}

/// Literal-datum comparison for non-identifier pattern atoms.
fn datum_eqv(interp: &Interpreter, a: Value, b: Value) -> bool {
    if let (Some(x), Some(y)) = (a.number(), b.number()) {
        return rill_core::number::eqv(x, y);
    }
    if let (Value::Str(x), Value::Str(y)) = (a, b) {
        return interp.heap.string(x) == interp.heap.string(y);
    }
    a == b
}

// --- instantiation ---------------------------------------------------------

fn instantiate(
    interp: &mut Interpreter,
    ctx: &Ctx,
    binds: &Bindings,
    cache: &mut HashMap<SymbolId, Value>,
    tmpl: Value,
) -> Result<Value> {
    if is_identifier(&interp.heap, tmpl) {
        let sym = underlying_symbol(&interp.heap, tmpl).unwrap();
        if let Some(b) = binds.get(&sym) {
            return match b {
                Binding::One(v) => Ok(*v),
                Binding::Many(_) => Err(Condition::new(
                    ErrorKind::Macro,
                    "pattern variable used without ellipsis",
                )),
            };
        }
        // free identifier: hygienic wrapper over the definition env,
        // shared across this expansion
        if let Some(w) = cache.get(&sym) {
            return Ok(*w);
        }
        let wrapped = Value::SynClosure(interp.heap.alloc(Obj::SynClosure(SynClosure {
            env: ctx.def_env,
            free_names: Value::Nil,
            expr: tmpl,
        })));
        cache.insert(sym, wrapped);
        return Ok(wrapped);
    }

    match tmpl {
        Value::Pair(h) => {
            let (car, cdr) = interp.heap.pair(h);
            if let Value::Pair(h2) = cdr
                && is_ellipsis(interp, ctx, interp.heap.car(h2))
            {
                let after = interp.heap.cdr(h2);
                let n = repeat_count(interp, ctx, binds, car)?;
                let mut gl = GrowList::new();
                for i in 0..n {
                    let sub_binds = project(interp, ctx, binds, car, i);
                    let item = instantiate(interp, ctx, &sub_binds, cache, car)?;
                    gl.push(&mut interp.heap, item);
                }
                let tail = instantiate(interp, ctx, binds, cache, after)?;
                return Ok(gl.extract_with_tail(&mut interp.heap, tail));
            }
            let a = instantiate(interp, ctx, binds, cache, car)?;
            let d = instantiate(interp, ctx, binds, cache, cdr)?;
            Ok(interp.heap.pair_value(a, d))
        }
        Value::Vector(h) => {
            let elems = interp.heap.vector(h).clone();
            let mut out = Vec::new();
            let mut i = 0;
            while i < elems.len() {
                if i + 1 < elems.len() && is_ellipsis(interp, ctx, elems[i + 1]) {
                    let sub = elems[i];
                    let n = repeat_count(interp, ctx, binds, sub)?;
                    for j in 0..n {
                        let sub_binds = project(interp, ctx, binds, sub, j);
                        out.push(instantiate(interp, ctx, &sub_binds, cache, sub)?);
                    }
                    i += 2;
                } else {
                    out.push(instantiate(interp, ctx, binds, cache, elems[i])?);
                    i += 1;
                }
            }
            Ok(interp.heap.vector_value(out))
        }
        other => Ok(other),
    }
}

/// Iteration count for `sub ...`: the agreed length of every
/// ellipsis-captured variable occurring in `sub`.
fn repeat_count(
    interp: &Interpreter,
    ctx: &Ctx,
    binds: &Bindings,
    sub: Value,
) -> Result<usize> {
    let mut vars = Vec::new();
    pattern_vars(interp, ctx, sub, &mut vars);
    let mut n: Option<usize> = None;
    for v in vars {
        if let Some(Binding::Many(col)) = binds.get(&v) {
            match n {
                None => n = Some(col.len()),
                Some(len) if len == col.len() => {}
                Some(len) => {
                    return Err(Condition::new(
                        ErrorKind::Macro,
                        format!(
                            "ellipsis captures have unequal lengths ({len} vs {})",
                            col.len()
                        ),
                    ));
                }
            }
        }
    }
    n.ok_or_else(|| {
        Condition::new(
            ErrorKind::Macro,
            "ellipsis template has no ellipsis-captured variable",
        )
    })
}

/// Bindings for iteration `i`: ellipsis captures occurring in `sub` step
/// down one level, everything else passes through.
fn project(
    interp: &Interpreter,
    ctx: &Ctx,
    binds: &Bindings,
    sub: Value,
    i: usize,
) -> Bindings {
    let mut vars = Vec::new();
    pattern_vars(interp, ctx, sub, &mut vars);
    let mut out = binds.clone();
    for v in vars {
        if let Some(Binding::Many(col)) = binds.get(&v) {
            out.insert(v, col[i].clone());
        }
    }
    out
}
