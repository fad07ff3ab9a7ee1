//! Cons cells and list plumbing
//!
//! Helpers over `Heap` pairs: construction, bounded traversal, the
//! `ConsIter` forward iterator (whose `rest()` exposes an improper tail),
//! and the `GrowList` append-efficient builder used everywhere a list is
//! assembled front to back.

use crate::heap::{Handle, Heap};
use crate::value::Value;
use rill_core::error::{Condition, ErrorKind, Result};

pub fn cons(heap: &mut Heap, car: Value, cdr: Value) -> Value {
    heap.pair_value(car, cdr)
}

/// Build a proper list from the values in order.
pub fn list_from<I>(heap: &mut Heap, items: I) -> Value
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut out = Value::Nil;
    for v in items.into_iter().rev() {
        out = cons(heap, v, out);
    }
    out
}

/// Forward iterator over the cars of a cons chain. Stops at the first
/// non-pair cdr; `rest()` then holds NIL for a proper list or the
/// improper terminator.
pub struct ConsIter<'a> {
    heap: &'a Heap,
    cur: Value,
}

impl<'a> ConsIter<'a> {
    pub fn new(heap: &'a Heap, list: Value) -> Self {
        ConsIter { heap, cur: list }
    }

    /// The unconsumed tail.
    pub fn rest(&self) -> Value {
        self.cur
    }
}

impl Iterator for ConsIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self.cur {
            Value::Pair(h) => {
                let (car, cdr) = self.heap.pair(h);
                self.cur = cdr;
                Some(car)
            }
            _ => None,
        }
    }
}

/// Length of a proper list; `None` when the chain ends improperly.
pub fn list_length(heap: &Heap, list: Value) -> Option<usize> {
    let mut it = ConsIter::new(heap, list);
    let n = it.by_ref().count();
    if it.rest().is_nil() { Some(n) } else { None }
}

/// Collect a proper list into a vector; improper lists are a type error.
pub fn list_to_vec(heap: &Heap, who: &str, list: Value) -> Result<Vec<Value>> {
    let mut it = ConsIter::new(heap, list);
    let out: Vec<Value> = it.by_ref().collect();
    if it.rest().is_nil() {
        Ok(out)
    } else {
        Err(Condition::new(
            ErrorKind::Type,
            format!("{who}: improper list"),
        ))
    }
}

/// `n` cdrs into `list`; errors when the walk leaves the pair chain.
pub fn nth_cdr(heap: &Heap, who: &str, list: Value, n: usize) -> Result<Value> {
    let mut cur = list;
    for i in 0..n {
        match cur {
            Value::Pair(h) => cur = heap.cdr(h),
            _ => {
                return Err(Condition::new(
                    ErrorKind::Range,
                    format!("{who}: list ends after {i} cdrs (wanted {n})"),
                ));
            }
        }
    }
    Ok(cur)
}

/// Element `n` of `list`.
pub fn nth(heap: &Heap, who: &str, list: Value, n: usize) -> Result<Value> {
    match nth_cdr(heap, who, list, n)? {
        Value::Pair(h) => Ok(heap.car(h)),
        _ => Err(Condition::new(
            ErrorKind::Range,
            format!("{who}: no element {n}"),
        )),
    }
}

/// Append-efficient list builder: keeps the head plus the tail cell so
/// each push is O(1). `extract` closes the list; the builder is spent
/// afterwards.
pub struct GrowList {
    head: Value,
    tail: Option<Handle>,
}

impl GrowList {
    pub fn new() -> GrowList {
        GrowList {
            head: Value::Nil,
            tail: None,
        }
    }

    pub fn push(&mut self, heap: &mut Heap, v: Value) {
        let cell = match heap.pair_value(v, Value::Nil) {
            Value::Pair(h) => h,
            _ => unreachable!(),
        };
        match self.tail {
            Some(t) => heap.set_cdr(t, Value::Pair(cell)),
            None => self.head = Value::Pair(cell),
        }
        self.tail = Some(cell);
    }

    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    /// Close with NIL, yielding a proper list.
    pub fn extract(self) -> Value {
        self.head
    }

    /// Close with an arbitrary final cdr. With no pushed elements the
    /// tail itself is the result.
    pub fn extract_with_tail(self, heap: &mut Heap, tail: Value) -> Value {
        match self.tail {
            Some(t) => {
                heap.set_cdr(t, tail);
                self.head
            }
            None => tail,
        }
    }
}

impl Default for GrowList {
    fn default() -> Self {
        GrowList::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_list_builds_in_order() {
        let mut heap = Heap::new();
        let mut gl = GrowList::new();
        for i in 0..3 {
            gl.push(&mut heap, Value::Int(i));
        }
        let l = gl.extract();
        let items: Vec<Value> = ConsIter::new(&heap, l).collect();
        assert_eq!(items, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
        assert_eq!(list_length(&heap, l), Some(3));
    }

    #[test]
    fn test_extract_with_tail_makes_improper_list() {
        let mut heap = Heap::new();
        let mut gl = GrowList::new();
        gl.push(&mut heap, Value::Int(1));
        let l = gl.extract_with_tail(&mut heap, Value::Int(2));
        let mut it = ConsIter::new(&heap, l);
        assert_eq!(it.next(), Some(Value::Int(1)));
        assert_eq!(it.next(), None);
        assert_eq!(it.rest(), Value::Int(2));
        assert_eq!(list_length(&heap, l), None);
    }

    #[test]
    fn test_empty_grow_list_with_tail_is_the_tail() {
        let mut heap = Heap::new();
        let gl = GrowList::new();
        let v = gl.extract_with_tail(&mut heap, Value::Int(9));
        assert_eq!(v, Value::Int(9));
    }

    #[test]
    fn test_nth_walks_and_bounds() {
        let mut heap = Heap::new();
        let l = list_from(&mut heap, (0..4).map(Value::Int));
        assert_eq!(nth(&heap, "t", l, 2).unwrap(), Value::Int(2));
        assert!(nth(&heap, "t", l, 9).is_err());
        assert_eq!(nth_cdr(&heap, "t", l, 4).unwrap(), Value::Nil);
    }
}
