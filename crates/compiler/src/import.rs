//! Resolution of `import "path";` declarations.
//!
//! Grounded on `original_source/src/compile.c`'s `compile()` loop
//! (`compile.c:620-625`), which walks a file's declarations top to bottom
//! and resolves each `import` in place, at its position in the stream —
//! not in a separate pass after the rest of the file. This matters: a
//! top-of-file `import "lib";` must make `lib`'s functions visible to every
//! declaration that follows it in the *same* file, so `compile_unit` below
//! interleaves import resolution with function/global compilation in a
//! single ordered loop rather than compiling the whole program's
//! declarations first and only then walking back over it for imports.
//!
//! A set of canonical paths currently being compiled (not a memo of
//! already-finished ones) guards against import cycles: re-entering a file
//! already in flight is a harmless no-op, while re-importing a file that
//! finished earlier recompiles it in full and hits the same redefinition
//! check a literal duplicate declaration would (an Open Question resolved
//! this way in `DESIGN.md`).

use crate::ast::{Declaration, Program};
use crate::compiler::compile_function;
use crate::error::CompileError;
use crate::lexer::Lexer;
use crate::parser::Parser;
use fen_core::Globals;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn canonical_path(path: &str) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path))
}

/// Parse `source` as `filename` and compile its declarations, resolving any
/// `import` directives it contains against `globals`. The entry point for
/// both the root script and every file it transitively imports.
pub fn compile_file(globals: &mut Globals, filename: &str, source: &[u8]) -> Result<(), CompileError> {
    let mut in_progress = HashSet::new();
    in_progress.insert(canonical_path(filename));
    compile_unit(globals, filename, source, &mut in_progress)
}

fn compile_unit(
    globals: &mut Globals,
    filename: &str,
    source: &[u8],
    in_progress: &mut HashSet<PathBuf>,
) -> Result<(), CompileError> {
    let program = parse_unit(filename, source)?;

    for declaration in &program.declarations {
        match declaration {
            Declaration::Function(decl) => compile_function(globals, filename, decl)?,
            Declaration::Global { name } => {
                globals.declare(name);
            }
            Declaration::Import { path, line } => {
                resolve_import(globals, filename, path, *line, in_progress)?
            }
        }
    }

    Ok(())
}

fn parse_unit(filename: &str, source: &[u8]) -> Result<Program, CompileError> {
    let tokens = Lexer::new(filename, source).tokenize()?;
    Parser::new(filename, tokens).parse_program()
}

fn resolve_import(
    globals: &mut Globals,
    importing_file: &str,
    path: &str,
    line: u32,
    in_progress: &mut HashSet<PathBuf>,
) -> Result<(), CompileError> {
    let resolved = resolve_relative(importing_file, path);
    let canonical = canonical_path(resolved.to_string_lossy().as_ref());

    if in_progress.contains(&canonical) {
        // Already being compiled further up the import chain: cyclic
        // re-entry, treated as a no-op rather than an infinite loop.
        return Ok(());
    }

    let contents = std::fs::read(&resolved).map_err(|e| CompileError::ImportIo {
        path: path.to_string(),
        message: format!("{e} (imported at {importing_file}:{line})"),
    })?;

    in_progress.insert(canonical.clone());
    let result = compile_unit(globals, &resolved.to_string_lossy(), &contents, in_progress);
    in_progress.remove(&canonical);
    result
}

fn resolve_relative(importing_file: &str, path: &str) -> PathBuf {
    let target = Path::new(path);
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match Path::new(importing_file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(target),
        _ => target.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn import_brings_function_into_scope() {
        let dir = tempfile::tempdir().unwrap();
        let lib_path = dir.path().join("lib.fen");
        std::fs::File::create(&lib_path).unwrap().write_all(b"function helper() { return 9; }").unwrap();

        let main_src = format!("import \"{}\"; function main() {{ return helper(); }}", lib_path.display());

        let mut globals = Globals::new();
        compile_file(&mut globals, "main.fen", main_src.as_bytes()).unwrap();
        assert!(globals.lookup("helper").is_some());
        assert!(globals.lookup("main").is_some());
    }

    #[test]
    fn cyclic_import_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.fen");
        let b_path = dir.path().join("b.fen");

        std::fs::File::create(&a_path)
            .unwrap()
            .write_all(format!("import \"{}\"; function in_a() {{ return 1; }}", b_path.display()).as_bytes())
            .unwrap();
        std::fs::File::create(&b_path)
            .unwrap()
            .write_all(format!("import \"{}\"; function in_b() {{ return 2; }}", a_path.display()).as_bytes())
            .unwrap();

        let mut globals = Globals::new();
        let source = std::fs::read(&a_path).unwrap();
        compile_file(&mut globals, a_path.to_str().unwrap(), &source).unwrap();

        assert!(globals.lookup("in_a").is_some());
        assert!(globals.lookup("in_b").is_some());
    }

    #[test]
    fn missing_import_is_io_error() {
        let mut globals = Globals::new();
        let err = compile_file(&mut globals, "main.fen", b"import \"does_not_exist.fen\";").unwrap_err();
        assert!(matches!(err, CompileError::ImportIo { .. }));
    }
}
