//! Runtime configuration and the context threaded through compilation and
//! execution.
//!
//! Grounded on the teacher's `compiler/src/config.rs` pattern of a plain
//! struct of tunables passed by reference, adapted per `SPEC_FULL.md` §7/§9
//! to replace the original's two pieces of global mutable state (the
//! globals table and the thread-local call-stack) with one owned value.

use crate::environment::Environment;
use fen_core::Globals;

/// Tunables controlling interpreter behavior. Constructed once in `cli`.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum call-stack depth before a fatal stack-overflow error.
    /// Matches the original's `STACKFRAME_LIMIT`.
    pub stack_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config { stack_limit: 1000 }
    }
}

/// Everything a script execution needs: the global namespace, the call
/// stack used for diagnostics, and the tunables governing both.
pub struct RuntimeContext {
    pub globals: Globals,
    pub environment: Environment,
    pub config: Config,
}

impl RuntimeContext {
    pub fn new(config: Config) -> Self {
        RuntimeContext {
            globals: Globals::new(),
            environment: Environment::new(config.stack_limit),
            config,
        }
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        RuntimeContext::new(Config::default())
    }
}
