//! End-to-end scenarios from the language's testable-properties list,
//! driven through the full compile-then-run pipeline rather than through
//! any single crate's unit tests.

use fen_core::Value;
use fen_runtime::{register_builtins, run_main, ExecutionError, RuntimeContext};

fn run(source: &str) -> Result<Value, ExecutionError> {
    let mut ctx = RuntimeContext::default();
    register_builtins(&mut ctx);
    fen_compiler::compile(&mut ctx.globals, "<test>", source.as_bytes()).unwrap();
    run_main(&mut ctx)
}

#[test]
fn arithmetic_and_return_exit() {
    let result = run("function main() { return 2 + 3 * 4; }").unwrap();
    assert_eq!(result, Value::Number(14));
}

#[test]
fn recursive_factorial() {
    let source = "
        function fact(n) { if n <= 1 { return 1; } return n * fact(n - 1); }
        function main() { return fact(6); }
    ";
    assert_eq!(run(source).unwrap(), Value::Number(720));
}

#[test]
fn array_growth_via_index_assign() {
    let source = "
        function main() {
            local a = [];
            a[3] = 9;
            return a[0] == null && a[1] == null && a[2] == null && a[3] == 9;
        }
    ";
    assert_eq!(run(source).unwrap(), Value::Boolean(true));
}

#[test]
fn string_concatenation_with_mixed_operands() {
    let result = run("function main() { return \"n=\" + 42; }").unwrap();
    assert_eq!(fen_core::ops::value_to_string(&result).unwrap(), "n=42");
}

#[test]
fn short_circuit_or_skips_right_operand() {
    // `side` would flip the global if evaluated; `true || side()` must not
    // evaluate it.
    let source = "
        global touched;
        function side() { touched = true; return true; }
        function main() {
            touched = false;
            local x = true || side();
            return touched;
        }
    ";
    assert_eq!(run(source).unwrap(), Value::Boolean(false));
}

#[test]
fn short_circuit_and_evaluates_right_operand_only_when_left_is_true() {
    let source = "
        global touched;
        function side() { touched = true; return false; }
        function main() {
            touched = false;
            local x = false && side();
            return touched;
        }
    ";
    assert_eq!(run(source).unwrap(), Value::Boolean(false));

    let source_true_lhs = "
        global touched;
        function side() { touched = true; return false; }
        function main() {
            touched = false;
            local x = true && side();
            return touched;
        }
    ";
    assert_eq!(run(source_true_lhs).unwrap(), Value::Boolean(true));
}

#[test]
fn break_leaves_counter_at_break_point_continue_reevaluates_condition() {
    let source = "
        function main() {
            local i = 0;
            while true {
                i = i + 1;
                if i == 5 { break; }
            }
            return i;
        }
    ";
    assert_eq!(run(source).unwrap(), Value::Number(5));
}

#[test]
fn runtime_type_error_reports_call_stack_through_nested_calls() {
    let mut ctx = RuntimeContext::default();
    register_builtins(&mut ctx);
    fen_compiler::compile(
        &mut ctx.globals,
        "<test>",
        b"function a() { return 1 + [2]; } function main() { return a(); }",
    )
    .unwrap();

    let err = run_main(&mut ctx).unwrap_err();
    assert!(matches!(err, ExecutionError::Runtime(_)));

    let trace = ctx.environment.render_stacktrace();
    assert!(trace.contains("main"));
    assert!(trace.contains("a"));
}

#[test]
fn multiply_string_by_count_produces_expected_length() {
    let result = run(r#"function main() { return length("ab" * 3); }"#).unwrap();
    assert_eq!(result, Value::Number(6));
}

#[test]
fn negative_array_index_reads_from_the_end() {
    let source = "
        function main() {
            local a = [1, 2, 3];
            return a[-1] == a[2];
        }
    ";
    assert_eq!(run(source).unwrap(), Value::Boolean(true));
}
