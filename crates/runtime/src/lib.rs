//! Virtual machine, call-stack diagnostics, and built-in functions for the
//! Fen scripting language.
//!
//! Grounded on `original_source/src/codeblock.c` (VM dispatch),
//! `environment.c` (stack-trace bookkeeping), and `builtin_function.c`
//! (native operations), with the original's two pieces of global mutable
//! state folded into one owned [`RuntimeContext`] per `SPEC_FULL.md` §9.

mod builtins;
mod context;
mod environment;
mod error;
mod vm;

pub use context::{Config, RuntimeContext};
pub use environment::{Environment, StackFrame};
pub use error::ExecutionError;
pub use vm::call_value;

use fen_core::Value;

/// Register every built-in under its script-visible name. Call once, before
/// compiling any user source, so the built-ins occupy the lowest global
/// indices and are visible to every subsequently compiled file.
pub fn register_builtins(ctx: &mut RuntimeContext) {
    builtins::register(&mut ctx.globals);
}

/// Look up the `main` global and invoke it with zero arguments, matching
/// `SPEC_FULL.md` §6's "look up `main`, absence is fatal" contract. The
/// caller maps the returned [`fen_core::Value`] to a process exit status
/// (a `Number` result becomes the status; anything else is success).
pub fn run_main(ctx: &mut RuntimeContext) -> Result<Value, ExecutionError> {
    let Some(index) = ctx.globals.lookup("main") else {
        return Err(ExecutionError::MainNotFound);
    };
    let main_fn = ctx.globals.fetch(index);
    Ok(call_value(ctx, &main_fn, &[])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_main_is_an_error() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        assert!(matches!(run_main(&mut ctx), Err(ExecutionError::MainNotFound)));
    }

    #[test]
    fn end_to_end_arithmetic_program() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        fen_compiler::compile(&mut ctx.globals, "<test>", b"function main() { return 2 + 3 * 4; }").unwrap();
        assert_eq!(run_main(&mut ctx).unwrap(), Value::Number(14));
    }

    #[test]
    fn end_to_end_recursion() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        fen_compiler::compile(
            &mut ctx.globals,
            "<test>",
            b"function fact(n) { if n <= 1 { return 1; } return n * fact(n - 1); } function main() { return fact(5); }",
        )
        .unwrap();
        assert_eq!(run_main(&mut ctx).unwrap(), Value::Number(120));
    }

    #[test]
    fn end_to_end_array_index_assign_growth() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        fen_compiler::compile(
            &mut ctx.globals,
            "<test>",
            b"function main() { local a = []; a[3] = 9; return length(a); }",
        )
        .unwrap();
        assert_eq!(run_main(&mut ctx).unwrap(), Value::Number(4));
    }

    #[test]
    fn end_to_end_string_concat_with_number() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        fen_compiler::compile(&mut ctx.globals, "<test>", b"function main() { return \"n=\" + 42; }").unwrap();
        let result = run_main(&mut ctx).unwrap();
        assert_eq!(fen_core::ops::value_to_string(&result).unwrap(), "n=42");
    }

    #[test]
    fn end_to_end_short_circuit_and() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        fen_compiler::compile(
            &mut ctx.globals,
            "<test>",
            b"function main() { local hit = false; false && (hit = true); return hit; }",
        )
        .unwrap();
        assert_eq!(run_main(&mut ctx).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn end_to_end_break_and_continue() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        fen_compiler::compile(
            &mut ctx.globals,
            "<test>",
            b"function main() {
                local total = 0;
                local i = 0;
                while i < 10 {
                    i = i + 1;
                    if i == 5 { continue; }
                    if i == 8 { break; }
                    total = total + i;
                }
                return total;
            }",
        )
        .unwrap();
        // 1+2+3+4 (skip 5) +6+7 (stop before 8) = 23
        assert_eq!(run_main(&mut ctx).unwrap(), Value::Number(23));
    }

    #[test]
    fn end_to_end_type_error_reports_through_stack() {
        let mut ctx = RuntimeContext::default();
        register_builtins(&mut ctx);
        fen_compiler::compile(
            &mut ctx.globals,
            "<test>",
            b"function inner() { return 1 + true; } function main() { return inner(); }",
        )
        .unwrap();
        let err = run_main(&mut ctx).unwrap_err();
        assert!(matches!(err, ExecutionError::Runtime(_)));
    }
}
