//! Loading source files and driving ports.

use rill_runtime::{Interpreter, write_value};
use std::io::Write;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("temp file");
    f.write_all(contents.as_bytes()).expect("write");
    f.flush().expect("flush");
    f
}

#[test]
fn test_load_path_defines_into_the_session() {
    let f = write_temp("(define loaded-value 41)\n(define (loaded-inc x) (+ x 1))\n");
    let mut interp = Interpreter::new();
    interp
        .load_path(f.path().to_str().unwrap())
        .expect("load failed");
    let v = interp.eval_str("(loaded-inc loaded-value)").unwrap();
    assert_eq!(write_value(&interp, v), "42");
}

#[test]
fn test_load_builtin_runs_in_place() {
    let f = write_temp("(define from-file 'yes)\n");
    let mut interp = Interpreter::new();
    let src = format!("(load \"{}\") from-file", f.path().display());
    let v = interp.eval_str(&src).unwrap();
    assert_eq!(write_value(&interp, v), "yes");
}

#[test]
fn test_load_stops_at_first_condition() {
    let f = write_temp("(define ok 1)\n(car 5)\n(define never 2)\n");
    let mut interp = Interpreter::new();
    assert!(interp.load_path(f.path().to_str().unwrap()).is_err());
    // forms before the error took effect; forms after did not
    let ok = interp.eval_str("ok").unwrap();
    assert_eq!(write_value(&interp, ok), "1");
    assert!(interp.eval_str("never").is_err());
}

#[test]
fn test_read_from_file_port() {
    let f = write_temp("(+ 1\n   2)\n42 final");
    let mut interp = Interpreter::new();
    let src = format!(
        "(define p (open-input-file \"{}\"))
         (list (read p) (read p) (read p) (eof-object? (read p)))",
        f.path().display()
    );
    let v = interp.eval_str(&src).unwrap();
    assert_eq!(write_value(&interp, v), "((+ 1 2) 42 final #t)");
}

#[test]
fn test_char_level_port_reads() {
    let f = write_temp("ab");
    let mut interp = Interpreter::new();
    let src = format!(
        "(define p (open-input-file \"{}\"))
         (list (peek-char p) (read-char p) (read-char p) (eof-object? (read-char p)))",
        f.path().display()
    );
    let v = interp.eval_str(&src).unwrap();
    assert_eq!(write_value(&interp, v), "(#\\a #\\a #\\b #t)");
}

#[test]
fn test_write_to_file_port_and_read_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("out.scm");
    let mut interp = Interpreter::new();
    let src = format!(
        "(define p (open-output-file \"{}\"))
         (write '(1 \"two\" #\\3) p)
         (newline p)
         (display \"plain\" p)
         (close-output-port p)",
        path.display()
    );
    interp.eval_str(&src).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "(1 \"two\" #\\3)\nplain");
}

#[test]
fn test_port_predicates() {
    let mut interp = Interpreter::new();
    let v = interp
        .eval_str("(list (input-port? (current-input-port)) (output-port? (current-output-port)) (input-port? 5))")
        .unwrap();
    assert_eq!(write_value(&interp, v), "(#t #t #f)");
}
