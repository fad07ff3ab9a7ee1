//! Boot prelude, loaded while the starting environments are built
//!
//! The derived syntax here is installed by evaluating `define-syntax`
//! source through the macro expander itself, and the list utilities are
//! plain Scheme over the primitive builtins. Loading these at boot is
//! also the expander's permanent smoke test.

/// Derived syntax (report environment). The `and`/`or`/`cond`/`case`
/// definitions follow R5RS §7.3.
pub const SYNTAX_PRELUDE: &str = r#"
(define-syntax and
  (syntax-rules ()
    ((and) #t)
    ((and test) test)
    ((and test1 test2 ...) (if test1 (and test2 ...) #f))))

(define-syntax or
  (syntax-rules ()
    ((or) #f)
    ((or test) test)
    ((or test1 test2 ...)
     (let ((x test1)) (if x x (or test2 ...))))))

(define-syntax when
  (syntax-rules ()
    ((when test expr1 expr2 ...)
     (if test (begin expr1 expr2 ...)))))

(define-syntax unless
  (syntax-rules ()
    ((unless test expr1 expr2 ...)
     (if test (if #f #f) (begin expr1 expr2 ...)))))

(define-syntax cond
  (syntax-rules (else =>)
    ((cond) (if #f #f))
    ((cond (else result1 result2 ...))
     (begin result1 result2 ...))
    ((cond (test => result))
     (let ((temp test)) (if temp (result temp))))
    ((cond (test => result) clause1 clause2 ...)
     (let ((temp test)) (if temp (result temp) (cond clause1 clause2 ...))))
    ((cond (test))
     test)
    ((cond (test) clause1 clause2 ...)
     (let ((temp test)) (if temp temp (cond clause1 clause2 ...))))
    ((cond (test result1 result2 ...))
     (if test (begin result1 result2 ...)))
    ((cond (test result1 result2 ...) clause1 clause2 ...)
     (if test (begin result1 result2 ...) (cond clause1 clause2 ...)))))

(define-syntax case
  (syntax-rules (else)
    ((case (key ...) clauses ...)
     (let ((atom-key (key ...))) (case atom-key clauses ...)))
    ((case key) (if #f #f))
    ((case key (else result1 result2 ...))
     (begin result1 result2 ...))
    ((case key ((atoms ...) result1 result2 ...))
     (if (memv key (quote (atoms ...))) (begin result1 result2 ...)))
    ((case key ((atoms ...) result1 result2 ...) clause clauses ...)
     (if (memv key (quote (atoms ...)))
         (begin result1 result2 ...)
         (case key clause clauses ...)))))
"#;

/// List utilities (report environment).
pub const PROC_PRELUDE: &str = r#"
(define (caar x) (car (car x)))
(define (cadr x) (car (cdr x)))
(define (cdar x) (cdr (car x)))
(define (cddr x) (cdr (cdr x)))
(define (caaar x) (car (caar x)))
(define (caddr x) (car (cddr x)))
(define (cdddr x) (cdr (cddr x)))
(define (cadddr x) (car (cdddr x)))

(define (append . ls)
  (define (app2 a b)
    (if (null? a) b (cons (car a) (app2 (cdr a) b))))
  (if (null? ls)
      (quote ())
      (let loop ((ls ls))
        (if (null? (cdr ls))
            (car ls)
            (app2 (car ls) (loop (cdr ls)))))))

(define (map f . ls)
  (define (map1 f l)
    (if (null? l) (quote ()) (cons (f (car l)) (map1 f (cdr l)))))
  (define (any-null? ls)
    (if (null? ls) #f (if (null? (car ls)) #t (any-null? (cdr ls)))))
  (if (null? (cdr ls))
      (map1 f (car ls))
      (let loop ((ls ls))
        (if (any-null? ls)
            (quote ())
            (cons (apply f (map1 car ls))
                  (loop (map1 cdr ls)))))))

(define (for-each f . ls)
  (apply map f ls)
  (if #f #f))
"#;

/// Interaction-environment syntax; needs `with-exception-handler`, which
/// only exists there.
pub const EXTRA_PRELUDE: &str = r#"
(define-syntax guard
  (syntax-rules ()
    ((guard (var clause ...) body ...)
     ((call-with-current-continuation
        (lambda (k)
          (with-exception-handler
            (lambda (var)
              (k (lambda () (cond clause ... (else (raise var))))))
            (lambda ()
              (let ((result (begin body ...)))
                (k (lambda () result)))))))))))
"#;
