//! Builtin registry
//!
//! Builds the three starting environments in order: the null environment
//! holds the core special forms, the report environment layers the
//! standard procedures plus the prelude-defined derived syntax and list
//! utilities, and the interaction environment adds the debugging and
//! extension bindings.

use crate::env::{self, IdentKey};
use crate::heap::Obj;
use crate::interp::Interpreter;
use crate::port::{InPort, OutPort};
use crate::procedure::NativeProc;
use crate::value::Value;
use crate::{
    arithmetic, char_ops, control, equivalence, extra, io, list_ops, prelude, string_ops, syntax,
    vector_ops,
};
use tracing::debug;

static SYNTAX_TABLE: &[&NativeProc] = &[
    &syntax::QUOTE,
    &syntax::LAMBDA,
    &syntax::IF,
    &syntax::SET,
    &syntax::DEFINE,
    &syntax::BEGIN,
    &syntax::LET,
    &syntax::LET_STAR,
    &syntax::LETREC,
    &syntax::DO,
    &syntax::DELAY,
    &syntax::QUASIQUOTE,
    &syntax::UNQUOTE,
    &syntax::UNQUOTE_SPLICING,
    &syntax::SYNTAX_RULES,
    &syntax::DEFINE_SYNTAX,
    &syntax::LET_SYNTAX,
    &syntax::LETREC_SYNTAX,
];

static REPORT_TABLE: &[&NativeProc] = &[
    // equivalence and booleans
    &equivalence::EQ_P,
    &equivalence::EQV_P,
    &equivalence::EQUAL_P,
    &equivalence::NOT,
    &equivalence::BOOLEAN_P,
    // numeric tower
    &arithmetic::NUMBER_P,
    &arithmetic::COMPLEX_P,
    &arithmetic::REAL_P,
    &arithmetic::RATIONAL_P,
    &arithmetic::INTEGER_P,
    &arithmetic::EXACT_P,
    &arithmetic::INEXACT_P,
    &arithmetic::ZERO_P,
    &arithmetic::POSITIVE_P,
    &arithmetic::NEGATIVE_P,
    &arithmetic::ODD_P,
    &arithmetic::EVEN_P,
    &arithmetic::NUM_EQ,
    &arithmetic::NUM_LT,
    &arithmetic::NUM_GT,
    &arithmetic::NUM_LE,
    &arithmetic::NUM_GE,
    &arithmetic::MAX,
    &arithmetic::MIN,
    &arithmetic::ADD,
    &arithmetic::MUL,
    &arithmetic::SUB,
    &arithmetic::DIV,
    &arithmetic::ABS,
    &arithmetic::QUOTIENT,
    &arithmetic::REMAINDER,
    &arithmetic::MODULO,
    &arithmetic::GCD,
    &arithmetic::LCM,
    &arithmetic::FLOOR,
    &arithmetic::CEILING,
    &arithmetic::TRUNCATE,
    &arithmetic::ROUND,
    &arithmetic::NUMERATOR,
    &arithmetic::DENOMINATOR,
    &arithmetic::RATIONALIZE,
    &arithmetic::EXP,
    &arithmetic::LOG,
    &arithmetic::SIN,
    &arithmetic::COS,
    &arithmetic::TAN,
    &arithmetic::ASIN,
    &arithmetic::ACOS,
    &arithmetic::ATAN,
    &arithmetic::SQRT,
    &arithmetic::EXPT,
    &arithmetic::MAKE_RECTANGULAR,
    &arithmetic::MAKE_POLAR,
    &arithmetic::REAL_PART,
    &arithmetic::IMAG_PART,
    &arithmetic::MAGNITUDE,
    &arithmetic::ANGLE,
    &arithmetic::EXACT_TO_INEXACT,
    &arithmetic::INEXACT_TO_EXACT,
    &arithmetic::NUMBER_TO_STRING,
    &arithmetic::STRING_TO_NUMBER,
    // pairs and lists
    &list_ops::PAIR_P,
    &list_ops::NULL_P,
    &list_ops::CONS,
    &list_ops::CAR,
    &list_ops::CDR,
    &list_ops::SET_CAR,
    &list_ops::SET_CDR,
    &list_ops::LIST_P,
    &list_ops::LIST,
    &list_ops::LIST_STAR,
    &list_ops::LENGTH,
    &list_ops::REVERSE,
    &list_ops::LIST_TAIL,
    &list_ops::LIST_REF,
    &list_ops::MEMQ,
    &list_ops::MEMV,
    &list_ops::MEMBER,
    &list_ops::ASSQ,
    &list_ops::ASSV,
    &list_ops::ASSOC,
    // symbols and strings
    &string_ops::SYMBOL_P,
    &string_ops::SYMBOL_TO_STRING,
    &string_ops::STRING_TO_SYMBOL,
    &string_ops::STRING_P,
    &string_ops::MAKE_STRING,
    &string_ops::STRING,
    &string_ops::STRING_LENGTH,
    &string_ops::STRING_REF,
    &string_ops::STRING_SET,
    &string_ops::STRING_EQ,
    &string_ops::STRING_LT,
    &string_ops::STRING_GT,
    &string_ops::STRING_LE,
    &string_ops::STRING_GE,
    &string_ops::STRING_CI_EQ,
    &string_ops::STRING_CI_LT,
    &string_ops::STRING_CI_GT,
    &string_ops::STRING_CI_LE,
    &string_ops::STRING_CI_GE,
    &string_ops::SUBSTRING,
    &string_ops::STRING_APPEND,
    &string_ops::STRING_TO_LIST,
    &string_ops::LIST_TO_STRING,
    &string_ops::STRING_COPY,
    &string_ops::STRING_FILL,
    // characters
    &char_ops::CHAR_P,
    &char_ops::CHAR_EQ,
    &char_ops::CHAR_LT,
    &char_ops::CHAR_GT,
    &char_ops::CHAR_LE,
    &char_ops::CHAR_GE,
    &char_ops::CHAR_CI_EQ,
    &char_ops::CHAR_CI_LT,
    &char_ops::CHAR_CI_GT,
    &char_ops::CHAR_CI_LE,
    &char_ops::CHAR_CI_GE,
    &char_ops::CHAR_ALPHABETIC_P,
    &char_ops::CHAR_NUMERIC_P,
    &char_ops::CHAR_WHITESPACE_P,
    &char_ops::CHAR_UPPER_CASE_P,
    &char_ops::CHAR_LOWER_CASE_P,
    &char_ops::CHAR_TO_INTEGER,
    &char_ops::INTEGER_TO_CHAR,
    &char_ops::CHAR_UPCASE,
    &char_ops::CHAR_DOWNCASE,
    // vectors
    &vector_ops::VECTOR_P,
    &vector_ops::MAKE_VECTOR,
    &vector_ops::VECTOR,
    &vector_ops::VECTOR_LENGTH,
    &vector_ops::VECTOR_REF,
    &vector_ops::VECTOR_SET,
    &vector_ops::VECTOR_TO_LIST,
    &vector_ops::LIST_TO_VECTOR,
    &vector_ops::VECTOR_FILL,
    // control
    &control::PROCEDURE_P,
    &control::APPLY,
    &control::VALUES,
    &control::CALL_WITH_VALUES,
    &control::CALL_CC,
    &control::CALL_CC_SHORT,
    &control::DYNAMIC_WIND,
    &control::FORCE,
    // evaluation and the starting environments
    &extra::EVAL,
    &extra::NULL_ENVIRONMENT,
    &extra::SCHEME_REPORT_ENVIRONMENT,
    &extra::INTERACTION_ENVIRONMENT,
    // ports
    &io::DISPLAY,
    &io::WRITE,
    &io::NEWLINE,
    &io::WRITE_CHAR,
    &io::READ,
    &io::READ_CHAR,
    &io::PEEK_CHAR,
    &io::EOF_OBJECT_P,
    &io::INPUT_PORT_P,
    &io::OUTPUT_PORT_P,
    &io::CURRENT_INPUT_PORT,
    &io::CURRENT_OUTPUT_PORT,
    &io::OPEN_INPUT_FILE,
    &io::OPEN_OUTPUT_FILE,
    &io::CLOSE_INPUT_PORT,
    &io::CLOSE_OUTPUT_PORT,
    &io::LOAD,
];

static INTERACTION_TABLE: &[&NativeProc] = &[
    &extra::GENSYM,
    &extra::IDENTIFIER_P,
    &extra::IDENTIFIER_EQ,
    &extra::MAKE_SYNTACTIC_CLOSURE,
    &extra::CURRENT_ENVIRONMENT,
    &extra::EXIT,
    &control::WITH_EXCEPTION_HANDLER,
    &control::RAISE,
];

fn bind_table(interp: &mut Interpreter, frame: crate::heap::Handle, table: &[&'static NativeProc]) {
    for &native in table {
        let sym = interp.symbols.intern(native.name);
        env::local_set(&mut interp.heap, frame, IdentKey::Sym(sym), Value::Native(native));
    }
}

fn boot_load(interp: &mut Interpreter, what: &str, src: &str) {
    if let Err(c) = interp.load_str(src) {
        panic!("boot: {what} failed to load: {c}");
    }
}

/// Build the three starting environments, leaving the current frame at
/// the interaction environment.
pub fn install(interp: &mut Interpreter) {
    let null_env = interp.null_env;
    bind_table(interp, null_env, SYNTAX_TABLE);

    let report = env::push_frame(&mut interp.heap, null_env);
    interp.report_env = report;
    interp.vm.frame = report;
    bind_table(interp, report, REPORT_TABLE);

    let stdin = interp.heap.alloc(Obj::InPort(InPort::stdin()));
    let stdout = interp.heap.alloc(Obj::OutPort(OutPort::Stdout));
    let in_sym = interp.symbols.intern(io::CURRENT_INPUT_NAME);
    let out_sym = interp.symbols.intern(io::CURRENT_OUTPUT_NAME);
    env::local_set(&mut interp.heap, report, IdentKey::Sym(in_sym), Value::InPort(stdin));
    env::local_set(&mut interp.heap, report, IdentKey::Sym(out_sym), Value::OutPort(stdout));

    boot_load(interp, "derived syntax", prelude::SYNTAX_PRELUDE);
    boot_load(interp, "list utilities", prelude::PROC_PRELUDE);

    let interaction = env::push_frame(&mut interp.heap, report);
    interp.interaction_env = interaction;
    interp.vm.frame = interaction;
    bind_table(interp, interaction, INTERACTION_TABLE);
    boot_load(interp, "extras", prelude::EXTRA_PRELUDE);

    debug!(
        symbols = interp.symbols.len(),
        heap = interp.heap.len(),
        "environments installed"
    );
}
