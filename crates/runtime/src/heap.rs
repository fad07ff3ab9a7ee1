//! Heap arena and mark-sweep garbage collector
//!
//! Every heap-allocated object lives in one slab slot addressed by a
//! `Handle`. Allocation claims a slot from the free list (growing the slab
//! when it is empty); collection marks from the VM roots over an explicit
//! worklist and sweeps every unmarked slot back onto the free list.
//!
//! The arena is the sole liveness authority: reference cycles through
//! closure environments are reclaimed by tracing alone.

use crate::env::Frame;
use crate::port::{InPort, OutPort};
use crate::procedure::Lambda;
use crate::rules::SyntaxRules;
use crate::sclosure::SynClosure;
use crate::value::Value;
use crate::vm::Vm;
use tracing::debug;

/// Index of a slab slot. Identity of a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    pub fn from_index(i: u32) -> Handle {
        Handle(i)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A promise made by `delay`, forced at most once.
#[derive(Debug)]
pub enum Promise {
    Pending { expr: Value, env: Handle },
    Forced(Value),
}

#[derive(Debug)]
pub enum Obj {
    Pair(Value, Value),
    Str(String),
    Vector(Vec<Value>),
    Frame(Frame),
    Lambda(Lambda),
    Continuation(Box<Vm>),
    SynClosure(SynClosure),
    Rules(SyntaxRules),
    Promise(Promise),
    InPort(InPort),
    OutPort(OutPort),
    /// Free slot; payload is the next slot on the free list.
    Free(Option<u32>),
}

struct Slot {
    obj: Obj,
    mark: bool,
}

#[derive(Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    live: usize,
    allocs: usize,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }

    /// Number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocations since the last sweep, for collection pacing.
    pub fn allocations_since_collect(&self) -> usize {
        self.allocs
    }

    pub fn alloc(&mut self, obj: Obj) -> Handle {
        debug_assert!(!matches!(obj, Obj::Free(_)));
        self.live += 1;
        self.allocs += 1;
        match self.free_head {
            Some(i) => {
                let slot = &mut self.slots[i as usize];
                self.free_head = match slot.obj {
                    Obj::Free(next) => next,
                    _ => unreachable!("free list points at a live slot"),
                };
                slot.obj = obj;
                slot.mark = false;
                Handle(i)
            }
            None => {
                self.slots.push(Slot { obj, mark: false });
                Handle((self.slots.len() - 1) as u32)
            }
        }
    }

    pub fn get(&self, h: Handle) -> &Obj {
        &self.slots[h.index()].obj
    }

    pub fn get_mut(&mut self, h: Handle) -> &mut Obj {
        &mut self.slots[h.index()].obj
    }

    /// True when `h` addresses a live slot; GC invariant checks.
    pub fn contains(&self, h: Handle) -> bool {
        self.slots
            .get(h.index())
            .is_some_and(|s| !matches!(s.obj, Obj::Free(_)))
    }

    // Convenience allocators for the common kinds.

    pub fn pair_value(&mut self, car: Value, cdr: Value) -> Value {
        Value::Pair(self.alloc(Obj::Pair(car, cdr)))
    }

    pub fn str_value(&mut self, s: String) -> Value {
        Value::Str(self.alloc(Obj::Str(s)))
    }

    pub fn vector_value(&mut self, v: Vec<Value>) -> Value {
        Value::Vector(self.alloc(Obj::Vector(v)))
    }

    // Typed accessors. A kind mismatch is VM corruption, which is fatal;
    // user-facing type checks happen before these are reached.

    pub fn pair(&self, h: Handle) -> (Value, Value) {
        match self.get(h) {
            Obj::Pair(car, cdr) => (*car, *cdr),
            other => panic!("heap: expected pair, found {other:?}"),
        }
    }

    pub fn car(&self, h: Handle) -> Value {
        self.pair(h).0
    }

    pub fn cdr(&self, h: Handle) -> Value {
        self.pair(h).1
    }

    pub fn set_car(&mut self, h: Handle, v: Value) {
        match self.get_mut(h) {
            Obj::Pair(car, _) => *car = v,
            other => panic!("heap: expected pair, found {other:?}"),
        }
    }

    pub fn set_cdr(&mut self, h: Handle, v: Value) {
        match self.get_mut(h) {
            Obj::Pair(_, cdr) => *cdr = v,
            other => panic!("heap: expected pair, found {other:?}"),
        }
    }

    pub fn string(&self, h: Handle) -> &str {
        match self.get(h) {
            Obj::Str(s) => s,
            other => panic!("heap: expected string, found {other:?}"),
        }
    }

    pub fn string_mut(&mut self, h: Handle) -> &mut String {
        match self.get_mut(h) {
            Obj::Str(s) => s,
            other => panic!("heap: expected string, found {other:?}"),
        }
    }

    pub fn vector(&self, h: Handle) -> &Vec<Value> {
        match self.get(h) {
            Obj::Vector(v) => v,
            other => panic!("heap: expected vector, found {other:?}"),
        }
    }

    pub fn vector_mut(&mut self, h: Handle) -> &mut Vec<Value> {
        match self.get_mut(h) {
            Obj::Vector(v) => v,
            other => panic!("heap: expected vector, found {other:?}"),
        }
    }

    pub fn frame(&self, h: Handle) -> &Frame {
        match self.get(h) {
            Obj::Frame(f) => f,
            other => panic!("heap: expected frame, found {other:?}"),
        }
    }

    pub fn frame_mut(&mut self, h: Handle) -> &mut Frame {
        match self.get_mut(h) {
            Obj::Frame(f) => f,
            other => panic!("heap: expected frame, found {other:?}"),
        }
    }

    pub fn lambda(&self, h: Handle) -> &Lambda {
        match self.get(h) {
            Obj::Lambda(l) => l,
            other => panic!("heap: expected lambda, found {other:?}"),
        }
    }

    pub fn continuation(&self, h: Handle) -> &Vm {
        match self.get(h) {
            Obj::Continuation(vm) => vm.as_ref(),
            other => panic!("heap: expected continuation, found {other:?}"),
        }
    }

    pub fn sclosure(&self, h: Handle) -> &SynClosure {
        match self.get(h) {
            Obj::SynClosure(sc) => sc,
            other => panic!("heap: expected syntactic closure, found {other:?}"),
        }
    }

    pub fn rules(&self, h: Handle) -> &SyntaxRules {
        match self.get(h) {
            Obj::Rules(r) => r,
            other => panic!("heap: expected syntax rules, found {other:?}"),
        }
    }

    pub fn promise(&self, h: Handle) -> &Promise {
        match self.get(h) {
            Obj::Promise(p) => p,
            other => panic!("heap: expected promise, found {other:?}"),
        }
    }

    pub fn promise_mut(&mut self, h: Handle) -> &mut Promise {
        match self.get_mut(h) {
            Obj::Promise(p) => p,
            other => panic!("heap: expected promise, found {other:?}"),
        }
    }

    pub fn inport_mut(&mut self, h: Handle) -> &mut InPort {
        match self.get_mut(h) {
            Obj::InPort(p) => p,
            other => panic!("heap: expected input port, found {other:?}"),
        }
    }

    pub fn outport_mut(&mut self, h: Handle) -> &mut OutPort {
        match self.get_mut(h) {
            Obj::OutPort(p) => p,
            other => panic!("heap: expected output port, found {other:?}"),
        }
    }

    // --- collection --------------------------------------------------------

    /// Mark from `roots` and sweep. Returns (freed, surviving).
    pub fn collect(&mut self, roots: &[Value]) -> (usize, usize) {
        let mut work: Vec<Value> = roots.to_vec();

        while let Some(v) = work.pop() {
            let Some(h) = heap_handle(v) else { continue };
            let slot = &mut self.slots[h.index()];
            if slot.mark {
                continue;
            }
            slot.mark = true;
            match &slot.obj {
                Obj::Pair(car, cdr) => {
                    work.push(*car);
                    work.push(*cdr);
                }
                Obj::Vector(elems) => work.extend(elems.iter().copied()),
                Obj::Frame(f) => f.trace(&mut work),
                Obj::Lambda(l) => l.trace(&mut work),
                Obj::Continuation(vm) => vm.trace(&mut work),
                Obj::SynClosure(sc) => sc.trace(&mut work),
                Obj::Rules(r) => r.trace(&mut work),
                Obj::Promise(Promise::Pending { expr, env }) => {
                    work.push(*expr);
                    work.push(Value::Env(*env));
                }
                Obj::Promise(Promise::Forced(v)) => work.push(*v),
                // atomic heap kinds: marked, no descent
                Obj::Str(_) | Obj::InPort(_) | Obj::OutPort(_) => {}
                Obj::Free(_) => panic!("heap: reachable handle addresses a free slot"),
            }
        }

        let mut freed = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if matches!(slot.obj, Obj::Free(_)) {
                continue;
            }
            if slot.mark {
                slot.mark = false;
            } else {
                slot.obj = Obj::Free(self.free_head);
                self.free_head = Some(i as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        self.allocs = 0;
        debug!(freed, live = self.live, "gc cycle");
        (freed, self.live)
    }
}

/// The handle inside a heap-kind value, if any.
pub fn heap_handle(v: Value) -> Option<Handle> {
    match v {
        Value::Pair(h)
        | Value::Str(h)
        | Value::Vector(h)
        | Value::Lambda(h)
        | Value::Continuation(h)
        | Value::SynClosure(h)
        | Value::Rules(h)
        | Value::Promise(h)
        | Value::Env(h)
        | Value::InPort(h)
        | Value::OutPort(h) => Some(h),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_reuses_freed_slots() {
        let mut heap = Heap::new();
        let a = heap.alloc(Obj::Str("a".into()));
        let b = heap.pair_value(Value::Str(a), Value::Nil);
        assert_eq!(heap.len(), 2);

        // only the pair is rooted; both survive (pair references the string)
        let (freed, live) = heap.collect(&[b]);
        assert_eq!(freed, 0);
        assert_eq!(live, 2);

        // nothing rooted: everything is reclaimed and slots recycle
        let (freed, _) = heap.collect(&[]);
        assert_eq!(freed, 2);
        assert!(heap.is_empty());

        let c = heap.alloc(Obj::Str("c".into()));
        assert!(c.index() < 2, "slot should be recycled");
    }

    #[test]
    fn test_cycles_are_collected() {
        let mut heap = Heap::new();
        let a = heap.alloc(Obj::Pair(Value::Nil, Value::Nil));
        let b = heap.alloc(Obj::Pair(Value::Pair(a), Value::Nil));
        heap.set_cdr(a, Value::Pair(b));
        assert_eq!(heap.len(), 2);
        let (freed, live) = heap.collect(&[]);
        assert_eq!(freed, 2);
        assert_eq!(live, 0);
    }

    #[test]
    fn test_contains_tracks_liveness() {
        let mut heap = Heap::new();
        let a = heap.alloc(Obj::Str("x".into()));
        assert!(heap.contains(a));
        heap.collect(&[]);
        assert!(!heap.contains(a));
    }
}
