//! Condition types shared by every layer of the interpreter
//!
//! A `Condition` is the payload of any exceptional exit: reader errors,
//! type/arity mismatches from builtins, numeric domain errors, and macro
//! expansion failures all funnel through it. The evaluator decides whether
//! a condition is delivered to a user-installed handler or escapes to the
//! host; this module only describes the condition itself.

use std::fmt;

/// Classification of a condition, used for diagnostics and for tests that
/// assert a particular failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value had the wrong tag for the operation.
    Type,
    /// Argument count outside the callable's required/max range.
    Arity,
    /// Index out of bounds (string-ref, vector-ref, list-tail, ...).
    Range,
    /// Numeric domain error (division by zero, ordering complex numbers).
    Numeric,
    /// Reference to an identifier with no visible binding.
    Unbound,
    /// Malformed special form.
    Syntax,
    /// No syntax-rules pattern matched, or ellipsis capture mismatch.
    Macro,
    /// Port/file failure.
    Io,
    /// The reader saw text it cannot parse.
    Read,
    /// The reader ran out of input mid-form; the driver may ask for more.
    Incomplete,
    /// A user condition from `raise` that no handler caught.
    Raised,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Type => "type error",
            ErrorKind::Arity => "arity error",
            ErrorKind::Range => "range error",
            ErrorKind::Numeric => "numeric error",
            ErrorKind::Unbound => "unbound variable",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Macro => "macro error",
            ErrorKind::Io => "io error",
            ErrorKind::Read => "read error",
            ErrorKind::Incomplete => "read error (incomplete)",
            ErrorKind::Raised => "raised condition",
        }
    }
}

/// One exceptional exit, with enough context to print a useful diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: ErrorKind,
    pub message: String,
}

impl Condition {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Condition {
            kind,
            message: message.into(),
        }
    }

    /// True when the reader stopped because the input ended mid-form.
    /// The REPL uses this to prompt for a continuation line instead of
    /// reporting an error.
    pub fn is_incomplete(&self) -> bool {
        self.kind == ErrorKind::Incomplete
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for Condition {}

pub type Result<T> = std::result::Result<T, Condition>;

// Shorthand constructors, named after the failure class they report.

pub fn type_error(who: &str, expected: &str, got: impl fmt::Display) -> Condition {
    Condition::new(
        ErrorKind::Type,
        format!("{who}: expected {expected}, got {got}"),
    )
}

pub fn arity_error(who: &str, required: usize, max: Option<usize>, passed: usize) -> Condition {
    let expected = match max {
        Some(max) if max == required => format!("{required}"),
        Some(max) => format!("{required}..{max}"),
        None => format!("at least {required}"),
    };
    Condition::new(
        ErrorKind::Arity,
        format!("{who}: expected {expected} args, got {passed}"),
    )
}

pub fn range_error(who: &str, index: impl fmt::Display, len: usize) -> Condition {
    Condition::new(
        ErrorKind::Range,
        format!("{who}: index {index} out of range (length {len})"),
    )
}

pub fn numeric_error(who: &str, message: impl fmt::Display) -> Condition {
    Condition::new(ErrorKind::Numeric, format!("{who}: {message}"))
}

pub fn syntax_error(who: &str, message: impl fmt::Display) -> Condition {
    Condition::new(ErrorKind::Syntax, format!("{who}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_forms() {
        let fixed = arity_error("car", 1, Some(1), 2);
        assert_eq!(fixed.to_string(), "arity error: car: expected 1 args, got 2");

        let ranged = arity_error("atan", 1, Some(2), 3);
        assert!(ranged.message.contains("1..2"));

        let variadic = arity_error("+", 0, None, 0);
        assert!(variadic.message.contains("at least 0"));
    }

    #[test]
    fn test_incomplete_is_distinguished() {
        let eof = Condition::new(ErrorKind::Incomplete, "unexpected end of input");
        assert!(eof.is_incomplete());
        let bad = Condition::new(ErrorKind::Read, "unbalanced ')'");
        assert!(!bad.is_incomplete());
    }
}
