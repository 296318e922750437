use fen_core::RuntimeError;
use thiserror::Error;

/// Failures that can only happen at the runtime-crate level, above a single
/// value operation: right now, just "there's nothing to run".
///
/// Grounded on `original_source/src/main.c`'s own check before invoking the
/// compiled `main` global (see `SPEC_FULL.md` §6).
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("you must define a `main` function")]
    MainNotFound,

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
