//! I/O ports
//!
//! Input ports keep a line buffer so the reader can ask for "one more
//! line" when a form continues past what has been consumed; output ports
//! are thin writers. Both are heap objects so they participate in value
//! identity, but the GC treats them as atomic.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};

#[derive(Debug)]
enum InSrc {
    Stdin,
    File(BufReader<File>),
    /// Fixed text, used by tests and string-driven loads.
    Text,
}

#[derive(Debug)]
pub struct InPort {
    src: InSrc,
    buf: String,
    pos: usize,
    eof_seen: bool,
    pub name: String,
}

impl InPort {
    pub fn stdin() -> InPort {
        InPort {
            src: InSrc::Stdin,
            buf: String::new(),
            pos: 0,
            eof_seen: false,
            name: "stdin".to_string(),
        }
    }

    pub fn file(path: &str) -> std::io::Result<InPort> {
        let f = File::open(path)?;
        Ok(InPort {
            src: InSrc::File(BufReader::new(f)),
            buf: String::new(),
            pos: 0,
            eof_seen: false,
            name: path.to_string(),
        })
    }

    pub fn text(contents: String) -> InPort {
        InPort {
            src: InSrc::Text,
            buf: contents,
            pos: 0,
            eof_seen: true,
            name: "string".to_string(),
        }
    }

    /// Unconsumed buffered text.
    pub fn remaining(&self) -> &str {
        &self.buf[self.pos..]
    }

    pub fn consume(&mut self, bytes: usize) {
        self.pos = (self.pos + bytes).min(self.buf.len());
        // keep the buffer from growing without bound across a session
        if self.pos > 4096 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }

    /// Pull one more line into the buffer. `false` once the source is
    /// exhausted.
    pub fn fill_line(&mut self) -> std::io::Result<bool> {
        if self.eof_seen {
            return Ok(false);
        }
        let mut line = String::new();
        let n = match &mut self.src {
            InSrc::Stdin => std::io::stdin().lock().read_line(&mut line)?,
            InSrc::File(r) => r.read_line(&mut line)?,
            InSrc::Text => 0,
        };
        if n == 0 {
            self.eof_seen = true;
            return Ok(false);
        }
        self.buf.push_str(&line);
        Ok(true)
    }

    /// One character, refilling as needed. `None` at end of input.
    pub fn read_char(&mut self) -> std::io::Result<Option<char>> {
        loop {
            if let Some(c) = self.remaining().chars().next() {
                self.consume(c.len_utf8());
                return Ok(Some(c));
            }
            if !self.fill_line()? {
                return Ok(None);
            }
        }
    }

    pub fn peek_char(&mut self) -> std::io::Result<Option<char>> {
        loop {
            if let Some(c) = self.remaining().chars().next() {
                return Ok(Some(c));
            }
            if !self.fill_line()? {
                return Ok(None);
            }
        }
    }

    /// Read everything left in the source.
    pub fn read_to_end(&mut self) -> std::io::Result<String> {
        let mut rest = String::new();
        match &mut self.src {
            InSrc::Stdin => {
                std::io::stdin().lock().read_to_string(&mut rest)?;
            }
            InSrc::File(r) => {
                r.read_to_string(&mut rest)?;
            }
            InSrc::Text => {}
        }
        self.eof_seen = true;
        self.buf.push_str(&rest);
        let out = self.buf[self.pos..].to_string();
        self.pos = self.buf.len();
        Ok(out)
    }
}

#[derive(Debug)]
pub enum OutPort {
    Stdout,
    Stderr,
    File {
        name: String,
        writer: BufWriter<File>,
    },
}

impl OutPort {
    pub fn file(path: &str) -> std::io::Result<OutPort> {
        let f = File::create(path)?;
        Ok(OutPort::File {
            name: path.to_string(),
            writer: BufWriter::new(f),
        })
    }

    pub fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        match self {
            OutPort::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(s.as_bytes())?;
                out.flush()
            }
            OutPort::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(s.as_bytes())?;
                err.flush()
            }
            OutPort::File { writer, .. } => writer.write_all(s.as_bytes()),
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self {
            OutPort::Stdout | OutPort::Stderr => Ok(()),
            OutPort::File { writer, .. } => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_port_chars() {
        let mut p = InPort::text("ab".to_string());
        assert_eq!(p.peek_char().unwrap(), Some('a'));
        assert_eq!(p.read_char().unwrap(), Some('a'));
        assert_eq!(p.read_char().unwrap(), Some('b'));
        assert_eq!(p.read_char().unwrap(), None);
    }

    #[test]
    fn test_file_port_lines() {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "(1 2").unwrap();
        writeln!(tmp, " 3)").unwrap();
        let mut p = InPort::file(tmp.path().to_str().unwrap()).unwrap();
        assert!(p.fill_line().unwrap());
        assert_eq!(p.remaining(), "(1 2\n");
        assert!(p.fill_line().unwrap());
        assert_eq!(p.remaining(), "(1 2\n 3)\n");
        p.consume(p.remaining().len());
        assert!(!p.fill_line().unwrap());
    }
}
