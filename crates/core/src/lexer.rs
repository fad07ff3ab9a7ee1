//! Lexical scanner for Scheme source text
//!
//! Splits source into tokens: identifiers, literals (booleans, numbers,
//! characters, strings), list/vector punctuation, and the quotation sugar
//! marks. The scanner is line-agnostic; the REPL feeds it accumulated
//! input and retries on `Incomplete`.

use crate::error::{Condition, ErrorKind, Result};
use crate::number::{Number, parse_number};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Bool(bool),
    Num(Number),
    Char(char),
    Str(String),
    /// `(`
    Open,
    /// `)`
    Close,
    /// `#(`
    VecOpen,
    /// `'`
    Quote,
    /// `` ` ``
    Quasiquote,
    /// `,`
    Unquote,
    /// `,@`
    UnquoteSplicing,
    /// `.` standing alone inside a list
    Dot,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

fn is_delimiter(c: u8) -> bool {
    c.is_ascii_whitespace() || matches!(c, b'(' | b')' | b'"' | b';')
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_atmosphere(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else if c == b';' {
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Byte offset of the scan position, for error reporting.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Next token, or `None` at clean end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_atmosphere();
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        match c {
            b'(' => {
                self.pos += 1;
                Ok(Some(Token::Open))
            }
            b')' => {
                self.pos += 1;
                Ok(Some(Token::Close))
            }
            b'\'' => {
                self.pos += 1;
                Ok(Some(Token::Quote))
            }
            b'`' => {
                self.pos += 1;
                Ok(Some(Token::Quasiquote))
            }
            b',' => {
                self.pos += 1;
                if self.peek() == Some(b'@') {
                    self.pos += 1;
                    Ok(Some(Token::UnquoteSplicing))
                } else {
                    Ok(Some(Token::Unquote))
                }
            }
            b'"' => self.scan_string().map(Some),
            b'#' => self.scan_hash().map(Some),
            _ => self.scan_atom().map(Some),
        }
    }

    fn scan_string(&mut self) -> Result<Token> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(Condition::new(
                        ErrorKind::Incomplete,
                        "unexpected end of input inside string",
                    ));
                }
                Some(b'"') => return Ok(Token::Str(out)),
                Some(b'\\') => match self.bump() {
                    Some(b'"') => out.push('"'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'n') => out.push('\n'),
                    Some(b't') => out.push('\t'),
                    Some(b'r') => out.push('\r'),
                    Some(c) => {
                        return Err(Condition::new(
                            ErrorKind::Read,
                            format!("unknown string escape '\\{}'", c as char),
                        ));
                    }
                    None => {
                        return Err(Condition::new(
                            ErrorKind::Incomplete,
                            "unexpected end of input inside string",
                        ));
                    }
                },
                Some(c) => out.push(c as char),
            }
        }
    }

    fn scan_hash(&mut self) -> Result<Token> {
        match self.src.get(self.pos + 1).copied() {
            Some(b'(') => {
                self.pos += 2;
                Ok(Token::VecOpen)
            }
            Some(b't') | Some(b'f')
                if self
                    .src
                    .get(self.pos + 2)
                    .copied()
                    .is_none_or(is_delimiter) =>
            {
                let val = self.src[self.pos + 1] == b't';
                self.pos += 2;
                Ok(Token::Bool(val))
            }
            Some(b'\\') => {
                self.pos += 2;
                self.scan_character()
            }
            Some(_) => self.scan_atom(),
            None => Err(Condition::new(
                ErrorKind::Incomplete,
                "unexpected end of input after '#'",
            )),
        }
    }

    fn scan_character(&mut self) -> Result<Token> {
        let Some(first) = self.bump() else {
            return Err(Condition::new(
                ErrorKind::Incomplete,
                "unexpected end of input in character literal",
            ));
        };
        // a letter may start a character name; anything else is itself
        if first.is_ascii_alphabetic() {
            let start = self.pos - 1;
            while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                self.pos += 1;
            }
            let name = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
            if name.len() == 1 {
                return Ok(Token::Char(first as char));
            }
            match name.to_ascii_lowercase().as_str() {
                "space" => Ok(Token::Char(' ')),
                "newline" => Ok(Token::Char('\n')),
                "tab" => Ok(Token::Char('\t')),
                _ => Err(Condition::new(
                    ErrorKind::Read,
                    format!("unknown character name '#\\{name}'"),
                )),
            }
        } else {
            Ok(Token::Char(first as char))
        }
    }

    fn scan_atom(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|c| !is_delimiter(c)) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| Condition::new(ErrorKind::Read, "non-ascii atom"))?;

        if text == "." {
            return Ok(Token::Dot);
        }
        if let Some(n) = parse_number(text, 10) {
            return Ok(Token::Num(n));
        }
        if text.starts_with('#') {
            return Err(Condition::new(
                ErrorKind::Read,
                format!("unreadable token '{text}'"),
            ));
        }
        Ok(Token::Ident(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(src: &str) -> Vec<Token> {
        let mut lx = Lexer::new(src);
        let mut out = Vec::new();
        while let Some(t) = lx.next_token().unwrap() {
            out.push(t);
        }
        out
    }

    #[test]
    fn test_punctuation_and_sugar() {
        assert_eq!(
            all("(a . b) '() `(,x ,@y) #(1)"),
            vec![
                Token::Open,
                Token::Ident("a".into()),
                Token::Dot,
                Token::Ident("b".into()),
                Token::Close,
                Token::Quote,
                Token::Open,
                Token::Close,
                Token::Quasiquote,
                Token::Open,
                Token::Unquote,
                Token::Ident("x".into()),
                Token::UnquoteSplicing,
                Token::Ident("y".into()),
                Token::Close,
                Token::VecOpen,
                Token::Num(Number::Int(1)),
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_numbers_and_identifiers() {
        assert_eq!(all("42")[0], Token::Num(Number::Int(42)));
        assert_eq!(all("-3/4")[0], Token::Num(Number::Ratio(-3, 4)));
        assert_eq!(all("#xff")[0], Token::Num(Number::Int(255)));
        assert_eq!(all("+")[0], Token::Ident("+".into()));
        assert_eq!(all("...")[0], Token::Ident("...".into()));
        assert_eq!(all("list->vector")[0], Token::Ident("list->vector".into()));
    }

    #[test]
    fn test_booleans_and_characters() {
        assert_eq!(all("#t #f"), vec![Token::Bool(true), Token::Bool(false)]);
        assert_eq!(all("#\\a")[0], Token::Char('a'));
        assert_eq!(all("#\\A")[0], Token::Char('A'));
        assert_eq!(all("#\\space")[0], Token::Char(' '));
        assert_eq!(all("#\\Newline")[0], Token::Char('\n'));
        assert_eq!(all("#\\(")[0], Token::Char('('));
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(all("\"abc\"")[0], Token::Str("abc".into()));
        assert_eq!(all("\"a\\\"b\\\\c\"")[0], Token::Str("a\"b\\c".into()));
        assert_eq!(all("\"x\\ny\"")[0], Token::Str("x\ny".into()));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            all("1 ; the rest is noise\n2"),
            vec![Token::Num(Number::Int(1)), Token::Num(Number::Int(2))]
        );
    }

    #[test]
    fn test_unterminated_string_is_incomplete() {
        let mut lx = Lexer::new("\"abc");
        let err = lx.next_token().unwrap_err();
        assert!(err.is_incomplete());
    }
}
