//! Command-line entry point for the Fen interpreter.
//!
//! Grounded on `original_source/src/main.c`'s control flow (init, compile,
//! look up `main`, run, map its return value to an exit status), restyled
//! with `clap`'s derive API per the teacher's `compiler/src/main.rs` and
//! `SPEC_FULL.md` §6's exact two-mutually-exclusive-flag contract.

use clap::Parser;
use fen_core::{RuntimeError, Value};
use fen_runtime::{register_builtins, run_main, ExecutionError, RuntimeContext};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: fen (-e '<source>' | -f <path>)";

#[derive(Parser)]
#[command(name = "fen", version, about = "Interpreter for the Fen scripting language", disable_help_flag = false)]
struct Args {
    /// Compile and run this source string directly.
    #[arg(short = 'e', long = "eval", value_name = "SOURCE", conflicts_with = "file")]
    expression: Option<String>,

    /// Compile and run the program at this path.
    #[arg(short = 'f', long = "file", value_name = "PATH", conflicts_with = "expression")]
    file: Option<PathBuf>,
}

fn install_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the CLI arguments to a `(filename, source bytes)` pair, or a
/// usage-failure message. Read as bytes, not `str` — source is not
/// required to be valid UTF-8 (`SPEC_FULL.md` §6).
fn read_source(args: &Args) -> Result<(String, Vec<u8>), String> {
    match (&args.expression, &args.file) {
        (Some(source), None) => Ok(("-e".to_string(), source.clone().into_bytes())),
        (None, Some(path)) => {
            let bytes = std::fs::read(path).map_err(|e| format!("unable to read '{}': {e}", path.display()))?;
            Ok((path.display().to_string(), bytes))
        }
        _ => Err(USAGE.to_string()),
    }
}

fn exit_code_from_main(value: Value) -> ExitCode {
    match value {
        Value::Number(status) => ExitCode::from(status as u8),
        _ => ExitCode::SUCCESS,
    }
}

fn main() -> ExitCode {
    install_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let (filename, source) = match read_source(&args) {
        Ok(pair) => pair,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = RuntimeContext::default();
    register_builtins(&mut ctx);

    if let Err(err) = fen_compiler::compile(&mut ctx.globals, &filename, &source) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run_main(&mut ctx) {
        Ok(value) => exit_code_from_main(value),
        Err(ExecutionError::MainNotFound) => {
            eprintln!("you must define a `main` function");
            ExitCode::FAILURE
        }
        // A stack overflow prints only its message: the call stack that
        // triggered it is ~`stack_limit` frames deep, and dumping all of
        // them would itself be the multi-thousand-line spam §4.6 calls out.
        Err(ExecutionError::Runtime(err @ RuntimeError::StackOverflow(_))) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
        Err(ExecutionError::Runtime(err)) => {
            eprintln!("{err}\n\nstacktrace:\n{}", ctx.environment.render_stacktrace());
            ExitCode::FAILURE
        }
    }
}
