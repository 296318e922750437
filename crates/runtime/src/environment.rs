//! Per-execution call-stack, kept only for error-time diagnostics.
//!
//! Grounded on `original_source/src/environment.c`/`environment.h`: a
//! thread-local stack of source locations pushed on call entry and popped on
//! exit, with a configurable depth limit whose overflow is fatal but does
//! not itself dump a (potentially multi-thousand-line) stack trace.

use fen_core::RuntimeError;

#[derive(Debug, Clone)]
pub struct StackFrame {
    pub filename: String,
    pub function_name: String,
    pub line: u32,
}

/// Not actually thread-local: `SPEC_FULL.md` §9 replaces the original's
/// `_Thread_local` global with an owned value threaded through
/// [`crate::context::RuntimeContext`], so a caller that wants per-thread
/// isolation just constructs one `Environment` per thread.
#[derive(Debug)]
pub struct Environment {
    frames: Vec<StackFrame>,
    limit: usize,
}

impl Environment {
    pub fn new(limit: usize) -> Self {
        Environment { frames: Vec::new(), limit }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn enter(&mut self, frame: StackFrame) -> Result<(), RuntimeError> {
        if self.frames.len() == self.limit {
            return Err(RuntimeError::StackOverflow(self.limit));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn leave(&mut self) {
        self.frames.pop().expect("leave() without a matching enter()");
    }

    /// `"{i}: {file}:{line} in {function}"` per frame, one per line, matching
    /// `dump_stacktrace`'s format string exactly.
    pub fn render_stacktrace(&self) -> String {
        self.frames
            .iter()
            .enumerate()
            .map(|(i, frame)| format!("{i}: {}:{} in {}", frame.filename, frame.line, frame.function_name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_past_limit_overflows() {
        let mut env = Environment::new(2);
        env.enter(StackFrame { filename: "a".into(), function_name: "f".into(), line: 1 }).unwrap();
        env.enter(StackFrame { filename: "a".into(), function_name: "g".into(), line: 2 }).unwrap();
        assert!(matches!(
            env.enter(StackFrame { filename: "a".into(), function_name: "h".into(), line: 3 }),
            Err(RuntimeError::StackOverflow(2))
        ));
    }

    #[test]
    fn leave_balances_enter() {
        let mut env = Environment::new(10);
        env.enter(StackFrame { filename: "a".into(), function_name: "f".into(), line: 1 }).unwrap();
        assert_eq!(env.depth(), 1);
        env.leave();
        assert_eq!(env.depth(), 0);
    }

    #[test]
    fn render_stacktrace_format() {
        let mut env = Environment::new(10);
        env.enter(StackFrame { filename: "main.fen".into(), function_name: "main".into(), line: 4 }).unwrap();
        env.enter(StackFrame { filename: "main.fen".into(), function_name: "helper".into(), line: 9 }).unwrap();
        assert_eq!(
            env.render_stacktrace(),
            "0: main.fen:4 in main\n1: main.fen:9 in helper"
        );
    }
}
