//! The numeric tower, end to end: coercion, exactness, promotion.

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
fn test_basic_arithmetic() {
    assert_eq!(run("(+)"), "0");
    assert_eq!(run("(*)"), "1");
    assert_eq!(run("(+ 1 2 3)"), "6");
    assert_eq!(run("(- 10 1 2)"), "7");
    assert_eq!(run("(- 5)"), "-5");
    assert_eq!(run("(* 2 3 4)"), "24");
    assert_eq!(run("(/ 6 3)"), "2");
    assert_eq!(run("(/ 2)"), "1/2");
}

#[test]
fn test_division_yields_rationals() {
    assert_eq!(run("(/ 1 3)"), "1/3");
    assert_eq!(run("(/ 4 6)"), "2/3");
    assert_eq!(run("(+ 1/3 1/6)"), "1/2");
    assert_eq!(run("(* 2/3 3/2)"), "1");
    assert_eq!(run_err("(/ 1 0)").kind, rill_core::ErrorKind::Numeric);
}

#[test]
fn test_coercion_to_join() {
    assert_eq!(run("(+ 1 0.5)"), "1.5");
    assert_eq!(run("(+ 1/2 0.25)"), "0.75");
    assert_eq!(run("(* 2 1.5)"), "3.0");
}

#[test]
fn test_exactness_predicates_and_eqv() {
    assert_eq!(run("(eqv? 1 1.0)"), "#f");
    assert_eq!(run("(= 1 1.0)"), "#t");
    assert_eq!(run("(exact? 1)"), "#t");
    assert_eq!(run("(exact? 1/2)"), "#t");
    assert_eq!(run("(inexact? 1.5)"), "#t");
    assert_eq!(run("(exact->inexact 1/2)"), "0.5");
    assert_eq!(run("(inexact->exact 0.5)"), "1/2");
}

#[test]
fn test_overflow_promotes_to_real() {
    let mut interp = Interpreter::new();
    let v = interp
        .eval_str("(* 4611686018427387904 4)")
        .expect("promotion failed");
    let rill_runtime::Value::Real(f) = v else {
        panic!("expected a real, got {}", write_value(&interp, v));
    };
    let expect = 4611686018427387904f64 * 4.0;
    assert!((f - expect).abs() <= expect * f64::EPSILON);
}

#[test]
fn test_comparisons_chain() {
    assert_eq!(run("(< 1 2 3)"), "#t");
    assert_eq!(run("(< 1 3 2)"), "#f");
    assert_eq!(run("(<= 1 1 2)"), "#t");
    assert_eq!(run("(> 3 2 1)"), "#t");
    assert_eq!(run("(>= 3 3)"), "#t");
    assert_eq!(run("(= 1/2 0.5)"), "#t");
    assert_eq!(run("(< 1/3 1/2)"), "#t");
}

#[test]
fn test_complex_cannot_be_ordered() {
    assert_eq!(run_err("(< 1+2i 3)").kind, rill_core::ErrorKind::Numeric);
    assert_eq!(run("(= 1+0i 1+0i)"), "#t");
}

#[test]
fn test_integer_kernels() {
    assert_eq!(run("(quotient 7 2)"), "3");
    assert_eq!(run("(remainder -7 2)"), "-1");
    assert_eq!(run("(modulo -7 2)"), "1");
    assert_eq!(run("(gcd 12 18)"), "6");
    assert_eq!(run("(lcm 4 6)"), "12");
    assert_eq!(run("(gcd)"), "0");
    assert_eq!(run("(lcm)"), "1");
    assert_eq!(run_err("(quotient 1.0 2)").kind, rill_core::ErrorKind::Type);
    assert_eq!(run_err("(modulo 1 0)").kind, rill_core::ErrorKind::Numeric);
}

#[test]
fn test_predicate_tower() {
    assert_eq!(run("(integer? 3)"), "#t");
    assert_eq!(run("(integer? 3.0)"), "#t");
    assert_eq!(run("(rational? 1/2)"), "#t");
    assert_eq!(run("(real? 1/2)"), "#t");
    assert_eq!(run("(complex? 3)"), "#t");
    assert_eq!(run("(number? 'a)"), "#f");
    assert_eq!(run("(odd? 3)"), "#t");
    assert_eq!(run("(even? 3)"), "#f");
    assert_eq!(run("(zero? 0)"), "#t");
    assert_eq!(run("(positive? 1/2)"), "#t");
    assert_eq!(run("(negative? -2)"), "#t");
}

#[test]
fn test_rounding() {
    assert_eq!(run("(floor 7/2)"), "3");
    assert_eq!(run("(ceiling 7/2)"), "4");
    assert_eq!(run("(truncate -7/2)"), "-3");
    assert_eq!(run("(round 5/2)"), "2");
    assert_eq!(run("(round 7/2)"), "4");
    assert_eq!(run("(floor 3.7)"), "3.0");
}

#[test]
fn test_selectors() {
    assert_eq!(run("(numerator 3/4)"), "3");
    assert_eq!(run("(denominator 3/4)"), "4");
    assert_eq!(run("(denominator 5)"), "1");
    assert_eq!(run("(abs -3/4)"), "3/4");
    assert_eq!(run("(max 1 2 3)"), "3");
    assert_eq!(run("(min 2 1/2 3)"), "1/2");
    assert_eq!(run("(max 1 2.0)"), "2.0");
}

#[test]
fn test_exponentials() {
    assert_eq!(run("(expt 2 10)"), "1024");
    assert_eq!(run("(expt 2 -2)"), "1/4");
    assert_eq!(run("(expt 2/3 2)"), "4/9");
    assert_eq!(run("(sqrt 16)"), "4");
    assert_eq!(run("(sqrt 2.25)"), "1.5");
    assert_eq!(run("(exp 0)"), "1.0");
    assert_eq!(run("(log 1)"), "0.0");
    assert_eq!(run("(atan 0)"), "0.0");
    assert_eq!(run("(sin 0)"), "0.0");
}

#[test]
fn test_complex_accessors() {
    assert_eq!(run("(real-part 1+2i)"), "1.0");
    assert_eq!(run("(imag-part 1+2i)"), "2.0");
    assert_eq!(run("(imag-part 5)"), "0");
    assert_eq!(run("(magnitude 3+4i)"), "5.0");
    assert_eq!(run("(make-rectangular 1 2)"), "1.0+2.0i");
    assert_eq!(run("(sqrt -4)"), "0.0+2.0i");
}

#[test]
fn test_number_string_round_trip() {
    assert_eq!(run("(number->string 255 16)"), "\"ff\"");
    assert_eq!(run("(number->string 5 2)"), "\"101\"");
    assert_eq!(run("(number->string 3/4)"), "\"3/4\"");
    assert_eq!(run("(string->number \"#xff\")"), "255");
    assert_eq!(run("(string->number \"1/2\")"), "1/2");
    assert_eq!(run("(string->number \"2.5e1\")"), "25.0");
    assert_eq!(run("(string->number \"ff\" 16)"), "255");
    assert_eq!(run("(string->number \"not-a-number\")"), "#f");
}

#[test]
fn test_rationalize() {
    assert_eq!(run("(rationalize 3/10 1/10)"), "1/3");
}
