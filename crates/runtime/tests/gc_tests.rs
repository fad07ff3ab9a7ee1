//! Garbage collector behaviour through the public interpreter surface.

use rill_runtime::{Interpreter, Value, write_value};

#[test]
fn test_heap_stays_bounded_across_garbage() {
    let mut interp = Interpreter::new();
    interp
        .eval_str("(define (churn i) (if (= i 0) 'done (begin (list 1 2 3 4) (churn (- i 1)))))")
        .unwrap();
    let baseline = interp.heap.len();

    // each iteration allocates list cells that die immediately; the
    // counter-driven collector must keep the heap near the baseline
    interp.eval_str("(churn 50000)").unwrap();
    interp.collect_garbage();
    let after = interp.heap.len();
    assert!(
        after < baseline + 256,
        "heap grew from {baseline} to {after} despite collection"
    );
}

#[test]
fn test_reachable_values_survive_collection() {
    let mut interp = Interpreter::new();
    interp
        .eval_str("(define keep (list 1 (list 2 3) \"s\"))")
        .unwrap();
    for _ in 0..3 {
        interp.collect_garbage();
    }
    let v = interp.eval_str("keep").unwrap();
    assert_eq!(write_value(&interp, v), "(1 (2 3) \"s\")");
}

#[test]
fn test_closure_cycles_are_reclaimed() {
    let mut interp = Interpreter::new();
    let baseline = {
        interp.collect_garbage();
        interp.heap.len()
    };

    // each pass builds a closure whose env holds the closure itself,
    // then drops the binding; only tracing can reclaim the cycle
    interp
        .eval_str(
            "(define (make-cycle)
               (define (self) self)
               self)
             (define keep (make-cycle))
             (set! keep #f)",
        )
        .unwrap();
    interp.collect_garbage();
    let after = interp.heap.len();
    assert!(
        after <= baseline + 64,
        "cycle not reclaimed: {baseline} -> {after}"
    );
}

#[test]
fn test_continuations_root_their_snapshot() {
    let mut interp = Interpreter::new();
    interp
        .eval_str(
            "(define k #f)
             (define (capture) (call/cc (lambda (c) (set! k c) 'first)))
             (capture)",
        )
        .unwrap();
    interp.collect_garbage();
    // the saved VM state must still be invokable after a collection
    let v = interp.eval_str("(if (procedure? k) 'alive 'lost)").unwrap();
    assert_eq!(write_value(&interp, v), "alive");
}

#[test]
fn test_arena_registration_invariant() {
    let mut interp = Interpreter::new();
    let v = interp.eval_str("(list 1 2)").unwrap();
    let Value::Pair(h) = v else { panic!("expected a pair") };
    assert!(interp.heap.contains(h));

    // the result is only rooted by the return-value vector; clearing it
    // and collecting must free the cells
    interp.vm.set_val(Value::Undefined);
    interp.collect_garbage();
    assert!(!interp.heap.contains(h));
}
