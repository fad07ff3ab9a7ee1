//! syntax-rules: matching, ellipsis, literals, and hygiene.

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
    interp
        .eval_str(src)
        .err()
        .unwrap_or_else(|| panic!("expected failure for {src:?}"))
}

#[test]
fn test_prelude_and_or() {
    assert_eq!(run("(and)"), "#t");
    assert_eq!(run("(and 1)"), "1");
    assert_eq!(run("(and 1 2 3)"), "3");
    assert_eq!(run("(and 1 #f 3)"), "#f");
    assert_eq!(run("(or)"), "#f");
    assert_eq!(run("(or #f #f 3)"), "3");
    assert_eq!(run("(or 1 (car 'boom))"), "1");
    // short circuit: the unevaluated arm must not run
    assert_eq!(run("(define n 0) (and #f (set! n 1)) n"), "0");
}

#[test]
fn test_prelude_when_unless() {
    assert_eq!(run("(when #t 1 2)"), "2");
    assert_eq!(run("(when #f 1 2)"), "#<undefined>");
    assert_eq!(run("(unless #f 'ran)"), "ran");
    assert_eq!(run("(unless #t 'ran)"), "#<undefined>");
}

#[test]
fn test_prelude_cond() {
    assert_eq!(run("(cond (#t 1))"), "1");
    assert_eq!(run("(cond (#f 1) (else 2))"), "2");
    assert_eq!(run("(cond (#f 1) (2) (else 3))"), "2");
    assert_eq!(run("(cond ((assv 2 '((1 a) (2 b))) => cdr) (else 'no))"), "(b)");
    assert_eq!(run("(cond (#f 1))"), "#<undefined>");
}

#[test]
fn test_prelude_case() {
    assert_eq!(
        run("(case (* 2 3) ((2 3 5 7) 'prime) ((1 4 6 8 9) 'composite))"),
        "composite"
    );
    assert_eq!(run("(case 9 ((1) 'one) (else 'other))"), "other");
}

#[test]
fn test_user_macro_with_ellipsis() {
    assert_eq!(
        run("(define-syntax my-list
               (syntax-rules ()
                 ((_ x ...) (list x ...))))
             (my-list 1 2 3)"),
        "(1 2 3)"
    );
    assert_eq!(
        run("(define-syntax swap-pairs
               (syntax-rules ()
                 ((_ (a b) ...) (list (cons b a) ...))))
             (swap-pairs (1 2) (3 4))"),
        "((2 . 1) (4 . 3))"
    );
}

#[test]
fn test_macro_recursion() {
    assert_eq!(
        run("(define-syntax my-and
               (syntax-rules ()
                 ((_) #t)
                 ((_ e) e)
                 ((_ e1 e2 ...) (if e1 (my-and e2 ...) #f))))
             (my-and 1 2 'last)"),
        "last"
    );
}

#[test]
fn test_no_matching_pattern_is_a_macro_error() {
    let c = run_err(
        "(define-syntax pairs-only
           (syntax-rules ()
             ((_ (a b)) (cons a b))))
         (pairs-only 17)",
    );
    assert_eq!(c.kind, rill_core::ErrorKind::Macro);
}

#[test]
fn test_unequal_ellipsis_lengths_fail() {
    let c = run_err(
        "(define-syntax zip
           (syntax-rules ()
             ((_ (a ...) (b ...)) (list (cons a b) ...))))
         (zip (1 2 3) (x y))",
    );
    assert_eq!(c.kind, rill_core::ErrorKind::Macro);
}

#[test]
fn test_literal_matching_by_binding() {
    assert_eq!(
        run("(define-syntax arrowy
               (syntax-rules (=>)
                 ((_ a => b) 'arrow)
                 ((_ a b c) 'plain)))
             (arrowy 1 => 2)"),
        "arrow"
    );
    assert_eq!(
        run("(define-syntax arrowy
               (syntax-rules (=>)
                 ((_ a => b) 'arrow)
                 ((_ a b c) 'plain)))
             (arrowy 1 2 3)"),
        "plain"
    );
}

#[test]
fn test_hygiene_template_identifiers_resolve_at_definition() {
    // the canonical hygiene check
    assert_eq!(
        run("(let ((x 1))
               (let-syntax ((m (syntax-rules () ((_) x))))
                 (let ((x 2)) (m))))"),
        "1"
    );
}

#[test]
fn test_hygiene_template_binders_do_not_capture() {
    // `or` expands through a template-introduced binding named x; the
    // user's x must be untouched
    assert_eq!(run("(let ((x 'mine)) (or #f x))"), "mine");
    assert_eq!(
        run("(define-syntax shadowing
               (syntax-rules ()
                 ((_ e) (let ((tmp 'macro)) (list tmp e)))))
             (let ((tmp 'user)) (shadowing tmp))"),
        "(macro user)"
    );
}

#[test]
fn test_nested_ellipsis() {
    assert_eq!(
        run("(define-syntax flatten2
               (syntax-rules ()
                 ((_ ((x ...) ...)) (list (list x ...) ...))))
             (flatten2 ((1 2) (3) ()))"),
        "((1 2) (3) ())"
    );
}

#[test]
fn test_wildcard_pattern() {
    assert_eq!(
        run("(define-syntax second-of
               (syntax-rules ()
                 ((_ _ b) b)))
             (second-of (car 'boom) 5)"),
        "5"
    );
}

#[test]
fn test_define_syntax_in_scope_chain() {
    // a transformer defined at top level sees report bindings through
    // its definition environment
    assert_eq!(
        run("(define-syntax plus1
               (syntax-rules ()
                 ((_ e) (+ e 1))))
             (let ((+ 'shadowed)) (plus1 4))"),
        "5"
    );
}

#[test]
fn test_identifier_eq_builtin() {
    assert_eq!(
        run("(identifier=? (%current-environment) 'car (%current-environment) 'car)"),
        "#t"
    );
    assert_eq!(
        run("(identifier=? (%current-environment) 'car (%current-environment) 'cdr)"),
        "#f"
    );
}

#[test]
fn test_make_syntactic_closure_evaluates_in_wrapped_env() {
    assert_eq!(
        run("(define wrapped
               (let ((secret 41))
                 (make-syntactic-closure (%current-environment) '() 'secret)))
             (eval wrapped (interaction-environment))"),
        "41"
    );
}
