use thiserror::Error;

/// Every way the front end can fail before a single instruction runs.
///
/// Each variant carries the file and line it was raised at, matching the
/// original's `parse_error`/`die` convention of always reporting
/// `file:line` ahead of the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("syntax error at {file}:{line}: {message}")]
    Lex { file: String, line: u32, message: String },

    #[error("syntax error at {file}:{line}: {message}")]
    Parse { file: String, line: u32, message: String },

    #[error("compile error at {file}:{line}: {message}")]
    Semantic { file: String, line: u32, message: String },

    #[error("unable to read import '{path}': {message}")]
    ImportIo { path: String, message: String },
}
