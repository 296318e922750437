//! The built-in function table: native operations exposed to scripts under
//! plain, descriptive names.
//!
//! Grounded function-for-function on `original_source/src/builtin_function.c`.
//! Every original thematic name is replaced per `SPEC_FULL.md` §4.8:
//! `to_ring`→`to_number`, `sotellme`→`prompt`, `gottago`→`print`,
//! `gottagofast`→`println`, `chaos`→`random`, `shoe_size`→`length`,
//! `falloffthetrack`→`exit`, `amy`→`dump`, `buhbyenow`→`delete`,
//! `hereitgoes`→`insert`, `species`→`typeof`, `imwaiting`→`sleep`.

use fen_core::{BuiltinFunction, Globals, RuntimeError, ScriptArray, ScriptString, Value};
use std::io::Write;
use std::time::Duration;

fn builtin_to_number(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args[0].as_string().ok_or_else(|| RuntimeError::ToNumberNonString(args[0].kind_name()))?;
    Ok(Value::Number(string_to_number(s.as_bytes())))
}

/// Leading-digits-prefix parse: consumes an optional sign then as many
/// leading decimal digits as are present, matching `string_to_number`'s
/// "parse what you can, ignore the rest" contract.
fn string_to_number(bytes: &[u8]) -> i64 {
    let mut iter = bytes.iter().peekable();
    let negative = match iter.peek() {
        Some(b'-') => {
            iter.next();
            true
        }
        Some(b'+') => {
            iter.next();
            false
        }
        _ => false,
    };
    let mut value: i64 = 0;
    for &b in iter {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add((b - b'0') as i64);
    }
    if negative {
        -value
    } else {
        value
    }
}

fn builtin_prompt(_args: &[Value]) -> Result<Value, RuntimeError> {
    tracing::trace!("prompt: reading a line from stdin");
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => Ok(Value::String(ScriptString::from_str(""))),
        Ok(_) => {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(Value::String(ScriptString::from_str(&line)))
        }
        Err(_) => Err(RuntimeError::PromptIoFailure),
    }
}

fn builtin_print(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = fen_core::ops::value_to_string(&args[0])?;
    tracing::trace!(bytes = text.len(), "print");
    let mut out = std::io::stdout();
    out.write_all(text.as_bytes()).map_err(|_| RuntimeError::PromptIoFailure)?;
    out.flush().map_err(|_| RuntimeError::PromptIoFailure)?;
    Ok(Value::Null)
}

fn builtin_println(args: &[Value]) -> Result<Value, RuntimeError> {
    builtin_print(args)?;
    println!();
    Ok(Value::Null)
}

fn builtin_random(_args: &[Value]) -> Result<Value, RuntimeError> {
    let n: u32 = rand::random();
    Ok(Value::Number(n as i64))
}

fn builtin_length(args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Array(a) => Ok(Value::Number(a.len() as i64)),
        Value::String(s) => Ok(Value::Number(s.len() as i64)),
        other => Err(RuntimeError::LengthUnsupportedKind(other.kind_name())),
    }
}

fn builtin_exit(args: &[Value]) -> Result<Value, RuntimeError> {
    let status = args[0].as_number().ok_or_else(|| RuntimeError::ExitNonNumber(args[0].kind_name()))?;
    tracing::debug!(status, "exit");
    std::process::exit(status as i32);
}

fn builtin_dump(args: &[Value]) -> Result<Value, RuntimeError> {
    println!("{}", args[0].debug_dump());
    Ok(args[0].clone())
}

fn builtin_delete(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = args[0].as_array().ok_or_else(|| RuntimeError::DeleteNonArray(args[0].kind_name()))?;
    let idx = args[1]
        .as_number()
        .ok_or_else(|| RuntimeError::IndexArgumentNonNumber { op: "delete", kind: args[1].kind_name() })?;
    Ok(array.delete(idx).unwrap_or(Value::Null))
}

fn builtin_insert(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = args[0].as_array().ok_or_else(|| RuntimeError::InsertNonArray(args[0].kind_name()))?;
    let idx = args[1]
        .as_number()
        .ok_or_else(|| RuntimeError::IndexArgumentNonNumber { op: "insert", kind: args[1].kind_name() })?;
    if !array.insert(idx, args[2].clone()) {
        return Err(RuntimeError::InsertNegativeOutOfRange(idx));
    }
    Ok(args[0].clone())
}

fn builtin_typeof(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(ScriptString::from_str(args[0].kind_name())))
}

fn builtin_sleep(args: &[Value]) -> Result<Value, RuntimeError> {
    let seconds = args[0].as_number().ok_or_else(|| RuntimeError::SleepNonNumber(args[0].kind_name()))?;
    tracing::debug!(seconds, "sleep");
    if seconds > 0 {
        std::thread::sleep(Duration::from_secs(seconds as u64));
    }
    Ok(Value::Number(0))
}

static TO_NUMBER: BuiltinFunction = BuiltinFunction { name: "to_number", required_argument_count: 1, call: builtin_to_number };
static PROMPT: BuiltinFunction = BuiltinFunction { name: "prompt", required_argument_count: 0, call: builtin_prompt };
static PRINT: BuiltinFunction = BuiltinFunction { name: "print", required_argument_count: 1, call: builtin_print };
static PRINTLN: BuiltinFunction = BuiltinFunction { name: "println", required_argument_count: 1, call: builtin_println };
static RANDOM: BuiltinFunction = BuiltinFunction { name: "random", required_argument_count: 0, call: builtin_random };
static LENGTH: BuiltinFunction = BuiltinFunction { name: "length", required_argument_count: 1, call: builtin_length };
static EXIT: BuiltinFunction = BuiltinFunction { name: "exit", required_argument_count: 1, call: builtin_exit };
static DUMP: BuiltinFunction = BuiltinFunction { name: "dump", required_argument_count: 1, call: builtin_dump };
static DELETE: BuiltinFunction = BuiltinFunction { name: "delete", required_argument_count: 2, call: builtin_delete };
static INSERT: BuiltinFunction = BuiltinFunction { name: "insert", required_argument_count: 3, call: builtin_insert };
static TYPEOF: BuiltinFunction = BuiltinFunction { name: "typeof", required_argument_count: 1, call: builtin_typeof };
static SLEEP: BuiltinFunction = BuiltinFunction { name: "sleep", required_argument_count: 1, call: builtin_sleep };

const ALL: &[&BuiltinFunction] =
    &[&TO_NUMBER, &PROMPT, &PRINT, &PRINTLN, &RANDOM, &LENGTH, &EXIT, &DUMP, &DELETE, &INSERT, &TYPEOF, &SLEEP];

/// Declare every built-in under its script-visible name and bind it to the
/// corresponding global slot. Called once at startup, before any user
/// source is compiled, so built-ins occupy the lowest global indices.
pub fn register(globals: &mut Globals) {
    for &builtin in ALL {
        let index = globals.declare(builtin.name);
        globals.assign(index, Value::BuiltinFunction(builtin));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_declares_every_builtin() {
        let mut globals = Globals::new();
        register(&mut globals);
        for builtin in ALL {
            assert!(globals.lookup(builtin.name).is_some(), "{} not declared", builtin.name);
        }
    }

    #[test]
    fn to_number_parses_leading_digits() {
        let arg = Value::String(ScriptString::from_str("42abc"));
        assert_eq!(builtin_to_number(&[arg]).unwrap(), Value::Number(42));
    }

    #[test]
    fn to_number_handles_negative_sign() {
        let arg = Value::String(ScriptString::from_str("-7"));
        assert_eq!(builtin_to_number(&[arg]).unwrap(), Value::Number(-7));
    }

    #[test]
    fn to_number_rejects_non_string() {
        assert!(builtin_to_number(&[Value::Number(1)]).is_err());
    }

    #[test]
    fn length_of_array_and_string() {
        let arr = Value::Array(ScriptArray::from_values(vec![Value::Number(1), Value::Number(2)]));
        assert_eq!(builtin_length(&[arr]).unwrap(), Value::Number(2));
        let s = Value::String(ScriptString::from_str("hey"));
        assert_eq!(builtin_length(&[s]).unwrap(), Value::Number(3));
    }

    #[test]
    fn length_rejects_number() {
        assert!(builtin_length(&[Value::Number(1)]).is_err());
    }

    #[test]
    fn typeof_reports_kind_name() {
        assert_eq!(builtin_typeof(&[Value::Null]).unwrap(), Value::String(ScriptString::from_str("null")));
    }

    #[test]
    fn delete_out_of_bounds_is_null() {
        let arr = Value::Array(ScriptArray::from_values(vec![Value::Number(1)]));
        assert_eq!(builtin_delete(&[arr, Value::Number(9)]).unwrap(), Value::Null);
    }

    #[test]
    fn insert_extends_and_returns_array() {
        let arr = Value::Array(ScriptArray::new());
        let result = builtin_insert(&[arr.clone(), Value::Number(1), Value::Number(5)]).unwrap();
        assert_eq!(result, arr);
        assert_eq!(arr.as_array().unwrap().get(1), Some(Value::Number(5)));
    }

    #[test]
    fn dump_returns_a_clone() {
        assert_eq!(builtin_dump(&[Value::Number(3)]).unwrap(), Value::Number(3));
    }
}
