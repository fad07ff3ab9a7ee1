//! Reader: tokens to s-expression trees
//!
//! Builds `Value` trees from the core scanner: lists (with dotted pairs),
//! vectors, and the quotation sugar marks, which expand to their
//! `(quote x)`-family forms at read time.

use crate::cons::GrowList;
use crate::interp::Interpreter;
use crate::value::Value;
use rill_core::error::{Condition, ErrorKind, Result};
use rill_core::{Lexer, Token};

/// Read every form in `src`.
pub fn read_all(interp: &mut Interpreter, src: &str) -> Result<Vec<Value>> {
    let mut lexer = Lexer::new(src);
    let mut out = Vec::new();
    while let Some(form) = read_form(interp, &mut lexer)? {
        out.push(form);
    }
    Ok(out)
}

/// Read one form plus the byte offset consumed, for port-driven reads
/// that hand the rest of the buffer back.
pub fn read_partial(interp: &mut Interpreter, src: &str) -> Result<Option<(Value, usize)>> {
    let mut lexer = Lexer::new(src);
    let form = read_form(interp, &mut lexer)?;
    Ok(form.map(|f| (f, lexer.offset())))
}

fn read_form(interp: &mut Interpreter, lexer: &mut Lexer<'_>) -> Result<Option<Value>> {
    match lexer.next_token()? {
        None => Ok(None),
        Some(tok) => parse(interp, lexer, tok).map(Some),
    }
}

fn incomplete(what: &str) -> Condition {
    Condition::new(
        ErrorKind::Incomplete,
        format!("unexpected end of input in {what}"),
    )
}

fn parse(interp: &mut Interpreter, lexer: &mut Lexer<'_>, tok: Token) -> Result<Value> {
    match tok {
        Token::Ident(name) => Ok(Value::Sym(interp.intern(&name))),
        Token::Bool(b) => Ok(Value::Bool(b)),
        Token::Num(n) => Ok(Value::from_number(n)),
        Token::Char(c) => Ok(Value::Char(c)),
        Token::Str(s) => Ok(interp.heap.str_value(s)),
        Token::Open => read_list(interp, lexer),
        Token::VecOpen => read_vector(interp, lexer),
        Token::Close => Err(Condition::new(ErrorKind::Read, "unbalanced ')'")),
        Token::Dot => Err(Condition::new(ErrorKind::Read, "'.' outside a list")),
        Token::Quote => sugar(interp, lexer, "quote"),
        Token::Quasiquote => sugar(interp, lexer, "quasiquote"),
        Token::Unquote => sugar(interp, lexer, "unquote"),
        Token::UnquoteSplicing => sugar(interp, lexer, "unquote-splicing"),
    }
}

/// `'x` reads as `(quote x)`, and likewise for the quasiquote family.
fn sugar(interp: &mut Interpreter, lexer: &mut Lexer<'_>, name: &str) -> Result<Value> {
    let tok = lexer.next_token()?.ok_or_else(|| incomplete(name))?;
    let inner = parse(interp, lexer, tok)?;
    let tag = interp.sym_value(name);
    let tail = interp.heap.pair_value(inner, Value::Nil);
    Ok(interp.heap.pair_value(tag, tail))
}

fn read_list(interp: &mut Interpreter, lexer: &mut Lexer<'_>) -> Result<Value> {
    let mut gl = GrowList::new();
    loop {
        match lexer.next_token()?.ok_or_else(|| incomplete("list"))? {
            Token::Close => return Ok(gl.extract()),
            Token::Dot => {
                if gl.is_empty() {
                    return Err(Condition::new(ErrorKind::Read, "'.' with no preceding element"));
                }
                let tok = lexer.next_token()?.ok_or_else(|| incomplete("dotted list"))?;
                let tail = parse(interp, lexer, tok)?;
                match lexer.next_token()?.ok_or_else(|| incomplete("dotted list"))? {
                    Token::Close => return Ok(gl.extract_with_tail(&mut interp.heap, tail)),
                    _ => {
                        return Err(Condition::new(
                            ErrorKind::Read,
                            "more than one element after '.'",
                        ));
                    }
                }
            }
            tok => {
                let v = parse(interp, lexer, tok)?;
                gl.push(&mut interp.heap, v);
            }
        }
    }
}

fn read_vector(interp: &mut Interpreter, lexer: &mut Lexer<'_>) -> Result<Value> {
    let mut elems = Vec::new();
    loop {
        match lexer.next_token()?.ok_or_else(|| incomplete("vector"))? {
            Token::Close => return Ok(interp.heap.vector_value(elems)),
            Token::Dot => return Err(Condition::new(ErrorKind::Read, "'.' inside a vector")),
            tok => elems.push(parse(interp, lexer, tok)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cons::{ConsIter, list_length};
    use crate::printer::write_value;

    fn read_one(interp: &mut Interpreter, src: &str) -> Value {
        let forms = read_all(interp, src).unwrap();
        assert_eq!(forms.len(), 1, "expected exactly one form from {src}");
        forms[0]
    }

    #[test]
    fn test_reads_nested_lists() {
        let mut interp = Interpreter::new();
        let v = read_one(&mut interp, "(a (b c) . d)");
        let mut it = ConsIter::new(&interp.heap, v);
        assert!(matches!(it.next(), Some(Value::Sym(_))));
        let inner = it.next().unwrap();
        assert_eq!(list_length(&interp.heap, inner), Some(2));
        assert_eq!(it.next(), None);
        assert!(matches!(it.rest(), Value::Sym(_)));
    }

    #[test]
    fn test_quote_sugar_expands() {
        let mut interp = Interpreter::new();
        let v = read_one(&mut interp, "'x");
        assert_eq!(write_value(&interp, v), "(quote x)");
        let v = read_one(&mut interp, "`(,a ,@b)");
        assert_eq!(
            write_value(&interp, v),
            "(quasiquote ((unquote a) (unquote-splicing b)))"
        );
    }

    #[test]
    fn test_vector_and_datum_round_trip() {
        let mut interp = Interpreter::new();
        let v = read_one(&mut interp, "#(1 #\\a \"s\" 2/4)");
        assert_eq!(write_value(&interp, v), "#(1 #\\a \"s\" 1/2)");
    }

    #[test]
    fn test_incomplete_and_malformed() {
        let mut interp = Interpreter::new();
        assert!(read_all(&mut interp, "(a b").unwrap_err().is_incomplete());
        assert!(read_all(&mut interp, "'").unwrap_err().is_incomplete());
        assert!(!read_all(&mut interp, ")").unwrap_err().is_incomplete());
        assert!(read_all(&mut interp, "(1 . 2 3)").is_err());
    }

    #[test]
    fn test_read_partial_reports_consumption() {
        let mut interp = Interpreter::new();
        let src = "(+ 1 2) (extra";
        let (form, used) = read_partial(&mut interp, src).unwrap().unwrap();
        assert_eq!(write_value(&interp, form), "(+ 1 2)");
        assert!(read_partial(&mut interp, &src[used..]).unwrap_err().is_incomplete());
    }
}
