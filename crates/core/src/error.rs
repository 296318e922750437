use thiserror::Error;

/// Every way a value operation, a call, or a built-in can fail at script
/// run time.
///
/// Each variant corresponds to one `die_with_stacktrace` call site in the
/// original value/array/builtin operations. The caller (the VM) is
/// responsible for attaching the current call-stack trace before printing
/// one of these to the user; this type carries only the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("can only negate numbers, not {0}")]
    NegateNonNumber(&'static str),

    #[error("can only not booleans, not {0}")]
    NotNonBoolean(&'static str),

    #[error("can only add numbers, arrays, and strings, not {0}")]
    AddUnsupportedKind(&'static str),

    #[error("can only add like kinds together, or strings to other types, not {lhs} to {rhs}")]
    AddMismatchedKinds { lhs: &'static str, rhs: &'static str },

    #[error("can only subtract numbers from numbers, not {rhs} from {lhs}")]
    SubtractNonNumber { lhs: &'static str, rhs: &'static str },

    #[error("can only multiply numbers, strings, and arrays, not {0}")]
    MultiplyUnsupportedKind(&'static str),

    #[error("can only multiply numbers, strings, and arrays by numbers, not {0}")]
    MultiplyByNonNumber(&'static str),

    #[error("can only multiply strings by nonnegative integers ({0} invalid)")]
    NegativeStringReplication(i64),

    #[error("can only multiply arrays by nonnegative integers ({0} invalid)")]
    NegativeArrayReplication(i64),

    #[error("can only divide numbers by numbers, not {lhs} from {rhs}")]
    DivideNonNumber { lhs: &'static str, rhs: &'static str },

    #[error("division by zero")]
    DivideByZero,

    #[error("can only modulo numbers by numbers, not {lhs} from {rhs}")]
    ModuloNonNumber { lhs: &'static str, rhs: &'static str },

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("can only compare like kinds together, not {lhs} to {rhs}")]
    CompareMismatchedKinds { lhs: &'static str, rhs: &'static str },

    #[error("can only compare numbers, arrays, and strings, not {0}")]
    CompareUnsupportedKind(&'static str),

    #[error("you must index with numbers, not {0}")]
    IndexWithNonNumber(&'static str),

    #[error("can only index into arrays or strings, not {0}")]
    IndexUnsupportedKind(&'static str),

    #[error("index {index} out of bounds for string of length {length}")]
    StringIndexOutOfBounds { index: i64, length: usize },

    #[error("index {index} out of bounds for array of length {length}")]
    ArrayIndexOutOfBounds { index: i64, length: usize },

    #[error("can only index assign into arrays, not {0}")]
    IndexAssignUnsupportedKind(&'static str),

    #[error("cannot assign to negative indices larger than the array's length: {0}")]
    IndexAssignNegativeOutOfRange(i64),

    #[error("cannot call a value of kind {0}")]
    NotCallable(&'static str),

    #[error("argument mismatch for {name}: expected {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("no conversion to string defined for {0}")]
    NoStringConversion(&'static str),

    #[error("stack level too deep ({0} levels deep)")]
    StackOverflow(usize),

    #[error("can only get the length of arrays and strings, not {0}")]
    LengthUnsupportedKind(&'static str),

    #[error("can only `delete` from arrays, not {0}")]
    DeleteNonArray(&'static str),

    #[error("can only `insert` into arrays, not {0}")]
    InsertNonArray(&'static str),

    #[error("index needs to be an integer for `{op}`, not {kind}")]
    IndexArgumentNonNumber { op: &'static str, kind: &'static str },

    #[error("cannot insert at a negative index larger than the array's length: {0}")]
    InsertNegativeOutOfRange(i64),

    #[error("can only convert strings to numbers, not {0}")]
    ToNumberNonString(&'static str),

    #[error("can only exit with an integer status code, not {0}")]
    ExitNonNumber(&'static str),

    #[error("can only sleep for a number of seconds, not {0}")]
    SleepNonNumber(&'static str),

    #[error("unable to read a line from standard input")]
    PromptIoFailure,
}
