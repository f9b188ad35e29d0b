//! file: core/src/engine.rs
//! description: adapter from `mlua` failures to the crate's error codes.
//!
//! Lua raises native argument faults by unwinding; `mlua` already turns
//! those into `mlua::Error`. This is the only place that maps them into
//! `ErrorCode`, so nothing engine-specific leaks past the public functions.

use crate::error::{Error, ErrorCode};

/// Message Lua stores when the message handler itself fails (`LUA_ERRERR`).
/// `mlua` folds that status into `RuntimeError`; only a message equal to
/// this text maps to `ErrorInHandler`. Script errors carry a position
/// prefix, so `error()` calls never match.
const ERROR_IN_HANDLER: &str = "error in error handling";

pub(crate) fn classify(err: &mlua::Error) -> ErrorCode {
    match err {
        mlua::Error::SyntaxError { .. } => ErrorCode::SyntaxError,
        other => classify_fault(other),
    }
}

// Callback and context wrappers are transparent: the inner cause decides.
fn classify_fault(err: &mlua::Error) -> ErrorCode {
    match err {
        mlua::Error::MemoryError(_) => ErrorCode::MemoryError,
        mlua::Error::RuntimeError(msg) if msg == ERROR_IN_HANDLER => {
            ErrorCode::ErrorInHandler
        }
        mlua::Error::CallbackError { cause, .. } => classify_fault(cause),
        mlua::Error::WithContext { cause, .. } => classify_fault(cause),
        _ => ErrorCode::RuntimeError,
    }
}

pub(crate) fn to_error(err: mlua::Error) -> Error {
    Error::with_detail(classify(&err), err.to_string())
}

/// Argument fault raised from inside a native, formatted like `luaL_argerror`.
pub(crate) fn argument_error(
    func: &str,
    position: usize,
    expected: &str,
    got: &str,
) -> mlua::Error {
    mlua::Error::RuntimeError(format!(
        "bad argument #{} to '{}' ({} expected, got {})",
        position, func, expected, got
    ))
}
