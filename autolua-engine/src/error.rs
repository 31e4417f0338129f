//! Errors raised by automation primitives.

use thiserror::Error;

/// Failure of an automation primitive.
///
/// These are recoverable from the script's point of view: the bridge converts
/// them into interpreter exceptions that `pcall` can catch.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no window matching {0:?}")]
    WindowNotFound(String),

    #[error("{command}: invalid argument {position}: {detail}")]
    BadArgument {
        command: &'static str,
        position: usize,
        detail: String,
    },
}
