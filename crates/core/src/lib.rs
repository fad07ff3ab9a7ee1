//! Rill Core: foundation types for the Rill Scheme interpreter
//!
//! Everything here is independent of the evaluator and its heap:
//! - `number`: the four-kind numeric tower (integer, rational, real,
//!   complex) with coercion, parsing, and formatting
//! - `symbol`: interned symbols and gensym
//! - `error`: condition types shared by reader, evaluator, and builtins
//! - `lexer`: the lexical scanner producing tokens from source text
//!
//! The runtime crate builds the tagged `Value`, the GC heap, and the VM
//! on top of these.

pub mod error;
pub mod lexer;
pub mod number;
pub mod symbol;

pub use error::{Condition, ErrorKind, Result};
pub use lexer::{Lexer, Token};
pub use number::Number;
pub use symbol::{SymbolId, SymbolTable};
