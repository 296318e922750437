//! The value-operation contract of `SPEC_FULL.md` §4.2: arithmetic,
//! comparison, equality, indexing, calling, and string conversion.
//!
//! Grounded function-for-function on `original_source/src/value.c`. Every
//! function here takes borrowed values and returns an owned result, which is
//! the natural Rust shape for the original's "does not take ownership of
//! its inputs, returns an owned result" contract — there is no manual
//! clone/free bookkeeping to replicate, since `Value::clone`/`Drop` already
//! provide it.

use crate::array::ScriptArray;
use crate::error::RuntimeError;
use crate::function::BuiltinFunction;
use crate::string_obj::ScriptString;
use crate::value::{Kind, Value};
use std::cmp::Ordering;
use std::rc::Rc;

pub fn negate(val: &Value) -> Result<Value, RuntimeError> {
    match val {
        Value::Number(n) => Ok(Value::Number(-n)),
        other => Err(RuntimeError::NegateNonNumber(other.kind_name())),
    }
}

pub fn not(val: &Value) -> Result<Value, RuntimeError> {
    match val {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => Err(RuntimeError::NotNonBoolean(other.kind_name())),
    }
}

pub fn add_values(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    if lhs.is_string() || rhs.is_string() {
        let l = value_to_script_string(lhs)?;
        let r = value_to_script_string(rhs)?;
        return Ok(Value::String(l.concat(&r)));
    }

    if lhs.classify() != rhs.classify() {
        return Err(RuntimeError::AddMismatchedKinds {
            lhs: lhs.kind_name(),
            rhs: rhs.kind_name(),
        });
    }

    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.wrapping_add(*b))),
        (Value::Array(a), Value::Array(b)) => Ok(Value::Array(a.concat(b))),
        _ => Err(RuntimeError::AddUnsupportedKind(lhs.kind_name())),
    }
}

pub fn subtract_values(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.wrapping_sub(*b))),
        _ => Err(RuntimeError::SubtractNonNumber {
            lhs: lhs.kind_name(),
            rhs: rhs.kind_name(),
        }),
    }
}

pub fn multiply_values(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let amount = match rhs {
        Value::Number(n) => *n,
        other => return Err(RuntimeError::MultiplyByNonNumber(other.kind_name())),
    };

    match lhs {
        Value::Number(n) => Ok(Value::Number(n.wrapping_mul(amount))),
        Value::String(s) => {
            if amount < 0 {
                return Err(RuntimeError::NegativeStringReplication(amount));
            }
            Ok(Value::String(s.replicate(amount as u64)))
        }
        Value::Array(a) => {
            if amount < 0 {
                return Err(RuntimeError::NegativeArrayReplication(amount));
            }
            Ok(Value::Array(a.replicate(amount as u64)))
        }
        other => Err(RuntimeError::MultiplyUnsupportedKind(other.kind_name())),
    }
}

pub fn divide_values(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            Ok(Value::Number(a.wrapping_div(*b)))
        }
        _ => Err(RuntimeError::DivideNonNumber {
            lhs: lhs.kind_name(),
            rhs: rhs.kind_name(),
        }),
    }
}

pub fn modulo_values(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            if *b == 0 {
                return Err(RuntimeError::ModuloByZero);
            }
            Ok(Value::Number(a.wrapping_rem(*b)))
        }
        _ => Err(RuntimeError::ModuloNonNumber {
            lhs: lhs.kind_name(),
            rhs: rhs.kind_name(),
        }),
    }
}

pub fn compare_values(lhs: &Value, rhs: &Value) -> Result<Ordering, RuntimeError> {
    if lhs.classify() != rhs.classify() {
        return Err(RuntimeError::CompareMismatchedKinds {
            lhs: lhs.kind_name(),
            rhs: rhs.kind_name(),
        });
    }

    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(a.compare(b)),
        (Value::Array(a), Value::Array(b)) => a.compare(b),
        _ => Err(RuntimeError::CompareUnsupportedKind(lhs.kind_name())),
    }
}

/// Never errors: different kinds are unequal, identical representation is
/// equal, and strings/arrays compare structurally.
pub fn equal_values(lhs: &Value, rhs: &Value) -> bool {
    if lhs.is_identical(rhs) {
        return true;
    }
    if lhs.classify() != rhs.classify() {
        return false;
    }
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => a.equal(b),
        // Booleans/null/numbers/functions already handled by `is_identical`.
        _ => false,
    }
}

pub fn index_value(val: &Value, idx: &Value) -> Result<Value, RuntimeError> {
    let idx = match idx {
        Value::Number(n) => *n,
        other => return Err(RuntimeError::IndexWithNonNumber(other.kind_name())),
    };

    match val {
        Value::String(s) => s
            .index(idx)
            .map(Value::String)
            .ok_or(RuntimeError::StringIndexOutOfBounds { index: idx, length: s.len() }),
        Value::Array(a) => a
            .get(idx)
            .ok_or(RuntimeError::ArrayIndexOutOfBounds { index: idx, length: a.len() }),
        other => Err(RuntimeError::IndexUnsupportedKind(other.kind_name())),
    }
}

pub fn index_assign_value(container: &Value, idx: &Value, value: Value) -> Result<(), RuntimeError> {
    let array = match container {
        Value::Array(a) => a,
        other => return Err(RuntimeError::IndexAssignUnsupportedKind(other.kind_name())),
    };
    let idx = match idx {
        Value::Number(n) => *n,
        other => return Err(RuntimeError::IndexWithNonNumber(other.kind_name())),
    };
    if array.index_assign(idx, value) {
        Ok(())
    } else {
        Err(RuntimeError::IndexAssignNegativeOutOfRange(idx))
    }
}

/// Resolved call target, returned by `resolve_call` for the VM to dispatch
/// (user functions need the environment/stack-frame machinery that lives in
/// the `runtime` crate, so `core` only resolves *what* to call, not how to
/// run it).
pub enum CallTarget {
    Function(Rc<crate::function::Function>),
    Builtin(&'static BuiltinFunction),
    NotCallable(&'static str),
}

pub fn resolve_call(callee: &Value) -> Result<CallTarget, RuntimeError> {
    match callee {
        Value::Function(f) => Ok(CallTarget::Function(f.clone())),
        Value::BuiltinFunction(b) => Ok(CallTarget::Builtin(b)),
        other => Err(RuntimeError::NotCallable(other.kind_name())),
    }
}

pub fn value_to_string(val: &Value) -> Result<String, RuntimeError> {
    match val {
        Value::String(s) => Ok(s.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Boolean(true) => Ok("good".to_string()),
        Value::Boolean(false) => Ok("evil".to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(a) => Ok(a.to_script_string()),
        other => Err(RuntimeError::NoStringConversion(other.kind_name())),
    }
}

/// Byte-level `to_string`, used by [`add_values`]'s string-coercion rule.
///
/// A string operand is passed through untouched — `value_to_string` goes
/// through Rust `String` (`ScriptString`'s `Display` is `from_utf8_lossy`),
/// which would replace any non-UTF-8 byte (e.g. a `\xff` escape) with
/// U+FFFD before concatenation. Scripting strings are raw byte sequences
/// (§3/§6), not required to be valid UTF-8, so `"\xff" + "a"` must keep the
/// `0xff` byte intact. Every other kind's string form is plain ASCII, so
/// routing it through `value_to_string` is lossless.
fn value_to_script_string(val: &Value) -> Result<ScriptString, RuntimeError> {
    match val {
        Value::String(s) => Ok(s.clone()),
        other => Ok(ScriptString::from_str(&value_to_string(other)?)),
    }
}

/// `inspect`: identical to `to_string` except a string value is rendered
/// quoted-and-escaped. Used when rendering array elements, matching
/// `inspect_value` in the original (arrays call `inspect_value` on their
/// elements so that a string element is visibly distinguishable from its
/// unquoted contents).
pub fn inspect_value(val: &Value) -> String {
    match val {
        Value::String(s) => s.inspect(),
        other => value_to_string(other).unwrap_or_else(|e| e.to_string()),
    }
}

#[allow(dead_code)]
fn _kind_assert(_k: Kind) {}
