//! Syntactic closures and the identifier discipline
//!
//! A syntactic closure packages an expression with the environment its
//! free identifiers should resolve in; `free_names` lists identifiers
//! that should instead keep resolving at the use site. The macro expander
//! wraps every template-introduced identifier in one of these, which is
//! the whole hygiene mechanism: the wrapper resolves (and binds) through
//! its own identity, never colliding with user symbols of the same name.

use crate::env::{IdentKey, find_frame};
use crate::heap::{Handle, Heap};
use crate::value::Value;
use rill_core::SymbolId;

#[derive(Debug)]
pub struct SynClosure {
    pub env: Handle,
    /// Proper list of identifiers resolved in the caller's environment.
    pub free_names: Value,
    pub expr: Value,
}

impl SynClosure {
    pub fn trace(&self, work: &mut Vec<Value>) {
        work.push(Value::Env(self.env));
        work.push(self.free_names);
        work.push(self.expr);
    }

    /// An alias is a closure over a bare identifier.
    pub fn is_alias(&self, heap: &Heap) -> bool {
        is_identifier(heap, self.expr)
    }
}

/// An identifier is a symbol, or a syntactic closure wrapping an
/// identifier (transitively).
pub fn is_identifier(heap: &Heap, v: Value) -> bool {
    match v {
        Value::Sym(_) => true,
        Value::SynClosure(h) => is_identifier(heap, heap.sclosure(h).expr),
        _ => false,
    }
}

/// The symbol at the bottom of any wrapping.
pub fn underlying_symbol(heap: &Heap, v: Value) -> Option<SymbolId> {
    match v {
        Value::Sym(id) => Some(id),
        Value::SynClosure(h) => underlying_symbol(heap, heap.sclosure(h).expr),
        _ => None,
    }
}

/// The binding key an identifier binds and resolves under: symbols by
/// interned id, wrappers by heap identity.
pub fn ident_key(v: Value) -> Option<IdentKey> {
    match v {
        Value::Sym(id) => Some(IdentKey::Sym(id)),
        Value::SynClosure(h) => Some(IdentKey::Wrap(h)),
        _ => None,
    }
}

/// Resolve an identifier in `frame` to its binding site. A wrapper first
/// looks for an alias binding under its own identity, then falls through
/// to its captured environment.
pub fn resolve(heap: &Heap, frame: Handle, ident: Value) -> Option<(Handle, IdentKey)> {
    match ident {
        Value::Sym(id) => {
            find_frame(heap, frame, IdentKey::Sym(id)).map(|f| (f, IdentKey::Sym(id)))
        }
        Value::SynClosure(h) => {
            if let Some(f) = find_frame(heap, frame, IdentKey::Wrap(h)) {
                return Some((f, IdentKey::Wrap(h)));
            }
            let sc = heap.sclosure(h);
            resolve(heap, sc.env, sc.expr)
        }
        _ => None,
    }
}

/// `identifier=?`: both resolve to the same binding, or neither is bound
/// and they share a name.
pub fn identifier_eq(
    heap: &Heap,
    frame_a: Handle,
    ident_a: Value,
    frame_b: Handle,
    ident_b: Value,
) -> bool {
    match (
        resolve(heap, frame_a, ident_a),
        resolve(heap, frame_b, ident_b),
    ) {
        (Some(a), Some(b)) => a == b,
        (None, None) => {
            underlying_symbol(heap, ident_a).is_some()
                && underlying_symbol(heap, ident_a) == underlying_symbol(heap, ident_b)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{local_set, push_frame, root_frame};
    use crate::heap::Obj;
    use rill_core::SymbolTable;

    fn wrap(heap: &mut Heap, env: Handle, expr: Value) -> Value {
        Value::SynClosure(heap.alloc(Obj::SynClosure(SynClosure {
            env,
            free_names: Value::Nil,
            expr,
        })))
    }

    #[test]
    fn test_identifier_recognition() {
        let mut heap = Heap::new();
        let mut syms = SymbolTable::new();
        let env = root_frame(&mut heap);
        let x = Value::Sym(syms.intern("x"));

        assert!(is_identifier(&heap, x));
        let w = wrap(&mut heap, env, x);
        assert!(is_identifier(&heap, w));
        let ww = wrap(&mut heap, env, w);
        assert!(is_identifier(&heap, ww));
        assert_eq!(underlying_symbol(&heap, ww), Some(syms.intern("x")));

        let l = heap.pair_value(x, Value::Nil);
        let wl = wrap(&mut heap, env, l);
        assert!(!is_identifier(&heap, wl));
    }

    #[test]
    fn test_identifier_eq_same_binding() {
        let mut heap = Heap::new();
        let mut syms = SymbolTable::new();
        let x = syms.intern("x");
        let outer = root_frame(&mut heap);
        local_set(&mut heap, outer, IdentKey::Sym(x), Value::Int(1));
        let inner = push_frame(&mut heap, outer);

        // same symbol seen from nested frames resolves to the same binding
        let sym = Value::Sym(x);
        assert!(identifier_eq(&heap, inner, sym, outer, sym));

        // a wrapper over x in the outer env equals bare x used inside
        let w = wrap(&mut heap, outer, sym);
        assert!(identifier_eq(&heap, inner, w, inner, sym));

        // shadowing splits the bindings apart
        local_set(&mut heap, inner, IdentKey::Sym(x), Value::Int(2));
        assert!(!identifier_eq(&heap, inner, w, inner, sym));
    }

    #[test]
    fn test_identifier_eq_unbound_by_name() {
        let mut heap = Heap::new();
        let mut syms = SymbolTable::new();
        let env = root_frame(&mut heap);
        let a = Value::Sym(syms.intern("else"));
        let b = Value::Sym(syms.intern("else"));
        let c = Value::Sym(syms.intern("=>"));
        assert!(identifier_eq(&heap, env, a, env, b));
        assert!(!identifier_eq(&heap, env, a, env, c));
    }
}
