//! End-to-end evaluator tests: source text in, printed value out.

use rill_runtime::{Interpreter, write_value};

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    match interp.eval_str(src) {
        Ok(v) => write_value(&interp, v),
        Err(c) => panic!("evaluation of {src:?} failed: {c}"),
    }
}

fn run_err(src: &str) -> rill_core::Condition {
    let mut interp = Interpreter::new();
    match interp.eval_str(src) {
        Ok(v) => panic!("expected failure for {src:?}, got {}", write_value(&interp, v)),
        Err(c) => c,
    }
}

#[test]
fn test_self_evaluating() {
    assert_eq!(run("#t"), "#t");
    assert_eq!(run("#f"), "#f");
    assert_eq!(run("2"), "2");
    assert_eq!(run("1.01"), "1.01");
    assert_eq!(run("#\\R"), "#\\R");
    assert_eq!(run("\"sss\""), "\"sss\"");
    assert_eq!(run("#(1 2 3)"), "#(1 2 3)");
    assert_eq!(run("#(1 #(11 12 13) 3)"), "#(1 #(11 12 13) 3)");
    assert_eq!(run("()"), "()");
}

#[test]
fn test_unbound_symbol_is_an_error() {
    let c = run_err("surely-nobody-bound-this");
    assert_eq!(c.kind, rill_core::ErrorKind::Unbound);
}

#[test]
fn test_function_call() {
    assert_eq!(run("(+ 1 1)"), "2");
    assert_eq!(run("(+ 1 2 3)"), "6");
}

#[test]
fn test_quote() {
    assert_eq!(run("(quote 1)"), "1");
    assert_eq!(run("(quote (1 . 2))"), "(1 . 2)");
    assert_eq!(run("'(1 2 3)"), "(1 2 3)");
    assert_eq!(run("''a"), "(quote a)");
}

#[test]
fn test_if() {
    assert_eq!(run("(if #t 1)"), "1");
    assert_eq!(run("(if #t 1 2)"), "1");
    assert_eq!(run("(if #f 1 2)"), "2");
    assert_eq!(run("(if 0 'zero 'no)"), "zero");
    // missing alternative on a false test is the unspecified value
    assert_eq!(run("(if #f 1)"), "#<undefined>");
    assert!(run_err("(if)").kind == rill_core::ErrorKind::Syntax);
    assert!(run_err("(if 1)").kind == rill_core::ErrorKind::Syntax);
}

#[test]
fn test_define_and_set() {
    assert_eq!(run("(define x 1) x"), "1");
    assert_eq!(run("(define x 1) (+ x x)"), "2");
    assert_eq!(run("(define x 1) (set! x 100) x"), "100");
    assert_eq!(run_err("(set! never-defined 1)").kind, rill_core::ErrorKind::Unbound);
}

#[test]
fn test_begin() {
    assert_eq!(run("(begin 1)"), "1");
    assert_eq!(run("(begin 1 2)"), "2");
    assert_eq!(run("(begin 1 2 3)"), "3");
    assert_eq!(run_err("(begin)").kind, rill_core::ErrorKind::Syntax);
}

#[test]
fn test_lambda_basics() {
    assert_eq!(run("((lambda (x) (+ x 1)) 41)"), "42");
    assert_eq!(
        run("(define fun (lambda (y) (+ y y))) (fun 2)"),
        "4"
    );
    assert_eq!(run("(define (fun2 x) (+ 1 x)) (fun2 100)"), "101");
    // closures capture their definition frame
    assert_eq!(
        run("(define (adder n) (lambda (x) (+ x n))) ((adder 3) 4)"),
        "7"
    );
}

#[test]
fn test_variadic_lambda() {
    assert_eq!(run("((lambda (x . r) (cons x r)) 1 2 3)"), "(1 2 3)");
    assert_eq!(run("((lambda args args) 1 2)"), "(1 2)");
    assert_eq!(run("((lambda (a b . r) r) 1 2)"), "()");
    assert_eq!(run_err("((lambda (a b) a) 1)").kind, rill_core::ErrorKind::Arity);
    assert_eq!(run_err("((lambda (a) a) 1 2)").kind, rill_core::ErrorKind::Arity);
}

#[test]
fn test_internal_define_scopes_locally() {
    assert_eq!(
        run("(define (f) (define inner 10) (+ inner 1)) (f)"),
        "11"
    );
    // the internal binding does not leak to the top level
    assert_eq!(
        run_err("(define (f) (define inner 10) inner) (f) inner").kind,
        rill_core::ErrorKind::Unbound
    );
}

#[test]
fn test_let_family() {
    assert_eq!(run("(let ((a 1) (b 2)) (+ a b))"), "3");
    assert_eq!(run("(let ((x 1)) (let ((x 2)) x))"), "2");
    assert_eq!(run("(let ((x 1)) (let ((x 2)) x) x)"), "1");
    assert_eq!(run("(let* ((a 1) (b (+ a 1))) b)"), "2");
    assert_eq!(
        run("(letrec ((even? (lambda (n) (if (= n 0) #t (odd? (- n 1)))))
                      (odd? (lambda (n) (if (= n 0) #f (even? (- n 1))))))
              (even? 10))"),
        "#t"
    );
}

#[test]
fn test_named_let_loop() {
    assert_eq!(
        run("(let loop ((i 0) (a 0)) (if (= i 10) a (loop (+ i 1) (+ a i))))"),
        "45"
    );
}

#[test]
fn test_do_loop() {
    assert_eq!(
        run("(do ((i 0 (+ i 1)) (acc 0 (+ acc i))) ((= i 5) acc))"),
        "10"
    );
    assert_eq!(
        run("(define v (make-vector 3 0))
             (do ((i 0 (+ i 1))) ((= i 3) v) (vector-set! v i i))"),
        "#(0 1 2)"
    );
}

#[test]
fn test_tail_call_space_is_constant() {
    let mut interp = Interpreter::new();
    let v = interp
        .eval_str(
            "(define (loop i) (if (= i 1000000) i (loop (+ i 1))))
             (loop 0)",
        )
        .expect("loop failed");
    assert_eq!(write_value(&interp, v), "1000000");
    // neither stack may grow with the iteration count
    assert!(
        interp.vm.stats.code_high_water < 64,
        "code stack high water {}",
        interp.vm.stats.code_high_water
    );
    assert!(
        interp.vm.stats.data_high_water < 64,
        "data stack high water {}",
        interp.vm.stats.data_high_water
    );
}

#[test]
fn test_mutual_tail_calls_stay_bounded() {
    let mut interp = Interpreter::new();
    let v = interp
        .eval_str(
            "(define (even? n) (if (= n 0) #t (odd? (- n 1))))
             (define (odd? n) (if (= n 0) #f (even? (- n 1))))
             (even? 100001)",
        )
        .expect("mutual recursion failed");
    assert_eq!(write_value(&interp, v), "#f");
    assert!(interp.vm.stats.code_high_water < 64);
}

#[test]
fn test_apply_and_procedures() {
    assert_eq!(run("(apply + 1 2 '(3 4))"), "10");
    assert_eq!(run("(apply cons '(1 2))"), "(1 . 2)");
    assert_eq!(run("(procedure? car)"), "#t");
    assert_eq!(run("(procedure? (lambda (x) x))"), "#t");
    assert_eq!(run("(procedure? 'car)"), "#f");
}

#[test]
fn test_calling_a_non_procedure_fails() {
    assert_eq!(run_err("(1 2 3)").kind, rill_core::ErrorKind::Type);
}

#[test]
fn test_list_builtins() {
    assert_eq!(run("(car '(1 2))"), "1");
    assert_eq!(run("(cdr '(1 2))"), "(2)");
    assert_eq!(run("(cons 1 2)"), "(1 . 2)");
    assert_eq!(run("(length '(a b c))"), "3");
    assert_eq!(run("(reverse '(1 2 3))"), "(3 2 1)");
    assert_eq!(run("(append '(1 2) '(3) '(4 5))"), "(1 2 3 4 5)");
    assert_eq!(run("(list-tail '(a b c d) 2)"), "(c d)");
    assert_eq!(run("(list-ref '(a b c) 1)"), "b");
    assert_eq!(run("(memv 3 '(1 2 3 4))"), "(3 4)");
    assert_eq!(run("(memv 9 '(1 2 3))"), "#f");
    assert_eq!(run("(assv 2 '((1 a) (2 b)))"), "(2 b)");
    assert_eq!(run("(member \"b\" '(\"a\" \"b\"))"), "(\"b\")");
    assert_eq!(run("(list? '(1 2))"), "#t");
    assert_eq!(run("(list? '(1 . 2))"), "#f");
}

#[test]
fn test_map_and_for_each() {
    assert_eq!(run("(map (lambda (x) (* x x)) '(1 2 3))"), "(1 4 9)");
    assert_eq!(run("(map + '(1 2 3) '(10 20 30))"), "(11 22 33)");
    assert_eq!(
        run("(define acc '())
             (for-each (lambda (x) (set! acc (cons x acc))) '(1 2 3))
             acc"),
        "(3 2 1)"
    );
}

#[test]
fn test_delay_and_force() {
    assert_eq!(run("(force (delay (+ 1 2)))"), "3");
    assert_eq!(run("(force 7)"), "7");
    // forced once, memoized after
    assert_eq!(
        run("(define n 0)
             (define p (delay (begin (set! n (+ n 1)) n)))
             (force p)
             (force p)"),
        "1"
    );
}

#[test]
fn test_eval_and_environments() {
    assert_eq!(run("(eval '(+ 1 2) (interaction-environment))"), "3");
    assert_eq!(run("(eval '(+ 1 2) (scheme-report-environment 5))"), "3");
    assert_eq!(
        run_err("(eval 'cons (null-environment 5))").kind,
        rill_core::ErrorKind::Unbound
    );
    assert_eq!(
        run_err("(scheme-report-environment 4)").kind,
        rill_core::ErrorKind::Type
    );
}

#[test]
fn test_symbols_and_strings() {
    assert_eq!(run("(symbol->string 'abc)"), "\"abc\"");
    assert_eq!(run("(string->symbol \"abc\")"), "abc");
    assert_eq!(run("(string-append \"foo\" \"bar\")"), "\"foobar\"");
    assert_eq!(run("(substring \"hello\" 1 3)"), "\"el\"");
    assert_eq!(run("(string-length \"hello\")"), "5");
    assert_eq!(run("(string->list \"ab\")"), "(#\\a #\\b)");
    assert_eq!(run("(list->string '(#\\a #\\b))"), "\"ab\"");
    assert_eq!(run("(string<? \"abc\" \"abd\")"), "#t");
    assert_eq!(run("(string-ci=? \"AbC\" \"aBc\")"), "#t");
    assert_eq!(
        run_err("(string-ref \"abc\" 5)").kind,
        rill_core::ErrorKind::Range
    );
}

#[test]
fn test_vectors() {
    assert_eq!(run("(vector 1 2 3)"), "#(1 2 3)");
    assert_eq!(run("(make-vector 2 'x)"), "#(x x)");
    assert_eq!(run("(vector-ref #(a b c) 1)"), "b");
    assert_eq!(run("(vector->list #(1 2))"), "(1 2)");
    assert_eq!(run("(list->vector '(1 2))"), "#(1 2)");
    assert_eq!(
        run("(define v (make-vector 3 0)) (vector-fill! v 9) v"),
        "#(9 9 9)"
    );
    assert_eq!(
        run_err("(vector-ref #(1) 3)").kind,
        rill_core::ErrorKind::Range
    );
}

#[test]
fn test_chars() {
    assert_eq!(run("(char->integer #\\A)"), "65");
    assert_eq!(run("(integer->char 97)"), "#\\a");
    assert_eq!(run("(char<? #\\a #\\b)"), "#t");
    assert_eq!(run("(char-ci=? #\\a #\\A)"), "#t");
    assert_eq!(run("(char-upcase #\\a)"), "#\\A");
    assert_eq!(run("(char-alphabetic? #\\5)"), "#f");
    assert_eq!(run("(char-numeric? #\\5)"), "#t");
}

#[test]
fn test_equivalence() {
    assert_eq!(run("(eq? 'a 'a)"), "#t");
    assert_eq!(run("(eqv? 1.0 1.0)"), "#t");
    assert_eq!(run("(equal? '(1 (2 3)) '(1 (2 3)))"), "#t");
    assert_eq!(run("(equal? \"ab\" \"ab\")"), "#t");
    assert_eq!(run("(eq? (list 'a) (list 'a))"), "#f");
    assert_eq!(run("(not #f)"), "#t");
    assert_eq!(run("(not 3)"), "#f");
    assert_eq!(run("(boolean? #f)"), "#t");
    assert_eq!(run("(boolean? 0)"), "#f");
}

#[test]
fn test_gensym_and_identifiers() {
    assert_eq!(run("(symbol? (gensym))"), "#t");
    assert_eq!(run("(eq? (gensym) (gensym))"), "#f");
    assert_eq!(run("(identifier? 'x)"), "#t");
    assert_eq!(run("(identifier? 12)"), "#f");
}
