//! Front end for the Fen scripting language: lexer, parser, AST, and
//! single-pass bytecode compiler.
//!
//! Grounded on `original_source/`'s `token.c`/`compile.c` pipeline, restated
//! as conventional Rust modules. The public entry point, [`compile`], takes
//! a shared [`fen_core::Globals`] table so the CLI and REPL-style callers
//! can compile one file, run it, then compile and run another against the
//! same global namespace.

mod ast;
mod compiler;
mod error;
mod import;
mod lexer;
mod parser;
mod token;

pub use ast::{BinaryOp, Declaration, Expr, FunctionDecl, Program, ShortCircuitOp, Stmt, UnaryOp};
pub use error::CompileError;

use fen_core::Globals;

/// Compile `source` (read as `filename`, used only for diagnostics and for
/// resolving relative `import` paths) against `globals`, declaring and
/// assigning every global the program defines.
pub fn compile(globals: &mut Globals, filename: &str, source: &[u8]) -> Result<(), CompileError> {
    import::compile_file(globals, filename, source)
}
