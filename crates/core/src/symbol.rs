//! Interned symbols
//!
//! Every symbol the reader produces is interned in a `SymbolTable`; equal
//! names intern to the same `SymbolId`, so symbol equality is a u32
//! comparison. `gensym` mints ids that are *not* entered into the intern
//! map: they have a printable name but can never be produced by the reader
//! again, which is what makes them safe as macro-internal binders.

use std::collections::HashMap;

/// Index into the symbol table. Copyable, id-equal iff interned from the
/// same name (or the very same gensym call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    interned: HashMap<String, SymbolId>,
    gensym_serial: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Intern `name`, returning the existing id when the name is known.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.interned.get(name) {
            return id;
        }
        let id = SymbolId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.interned.insert(name.to_string(), id);
        id
    }

    /// Mint a fresh uninterned symbol. The name is for printing only;
    /// interning the same text yields a different id.
    pub fn gensym(&mut self) -> SymbolId {
        self.gensym_serial += 1;
        let id = SymbolId(self.names.len() as u32);
        self.names.push(format!("%g{}", self.gensym_serial));
        id
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }

    /// True when `id` came from `intern` rather than `gensym`.
    pub fn is_interned(&self, id: SymbolId) -> bool {
        self.interned.get(self.name(id)) == Some(&id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut t = SymbolTable::new();
        let a = t.intern("lambda");
        let b = t.intern("lambda");
        let c = t.intern("cons");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(t.name(a), "lambda");
    }

    #[test]
    fn test_gensym_never_collides() {
        let mut t = SymbolTable::new();
        let g1 = t.gensym();
        let g2 = t.gensym();
        assert_ne!(g1, g2);
        assert!(!t.is_interned(g1));
        // Interning the printed name yields a distinct, interned id.
        let name = t.name(g1).to_string();
        let interned = t.intern(&name);
        assert_ne!(interned, g1);
        assert!(t.is_interned(interned));
    }
}
