use crate::codeblock::CodeBlock;
use crate::error::RuntimeError;
use crate::value::Value;
use std::rc::Rc;

/// A user-defined function: its compiled body plus the diagnostic metadata
/// needed to report argument-count mismatches and stack traces.
///
/// Held behind an `Rc` inside `Value::Function` so that cloning a function
/// value (e.g. passing it as an argument) is a refcount bump, matching
/// `clone_function` in the original.
#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub body: CodeBlock,
    pub argument_names: Vec<String>,
    pub source_filename: Rc<str>,
    pub source_line: u32,
}

impl Function {
    pub fn argument_count(&self) -> usize {
        self.argument_names.len()
    }

    pub fn debug_dump(&self) -> String {
        format!("Function({}, args=[{}])", self.name, self.argument_names.join(", "))
    }
}

/// A native operation exposed to scripts under a fixed name, such as
/// `print` or `length`.
///
/// `'static` lifetime: built-in functions are registered once at process
/// startup and live for the program's whole run, exactly like the
/// original's statically-allocated `builtin_function` table.
#[derive(PartialEq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub required_argument_count: usize,
    pub call: fn(&[Value]) -> Result<Value, RuntimeError>,
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinFunction").field("name", &self.name).finish()
    }
}

impl BuiltinFunction {
    pub fn call(&self, arguments: &[Value]) -> Result<Value, RuntimeError> {
        if arguments.len() != self.required_argument_count {
            return Err(RuntimeError::ArityMismatch {
                name: self.name.to_string(),
                expected: self.required_argument_count,
                got: arguments.len(),
            });
        }
        (self.call)(arguments)
    }
}
