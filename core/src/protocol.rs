//! file: core/src/protocol.rs
//! description: host-side setup, registration and batch processing.
//!
//! These functions work on any `mlua::Lua` the host owns. `setup` must run
//! first; afterwards `register` binds Lua callbacks to lambda ids and
//! `process` runs batches through them. None of them is reentrant across
//! threads, and none of them retries.

use log::{debug, info, warn};
use mlua::{Lua, MultiValue};

use crate::batch::{Batch, Lambda};
use crate::context::{Config, ContextHandle};
use crate::engine::to_error;
use crate::error::{Error, ErrorCode, Result};
use crate::value::ScriptValue;

/// Global name script code reaches the context through.
pub const GLOBAL_NAME: &str = "lcm";

/// Binds a fresh execution context, its natives and an empty registry into
/// `lua`.
///
/// Calling this twice on one state leaves two contexts; the second one
/// shadows the first, whose registered lambdas become unreachable.
pub fn setup(lua: &Lua, config: Config) -> Result<ContextHandle> {
    let handle = ContextHandle::new(config);
    lua.globals()
        .set(GLOBAL_NAME, handle.clone())
        .map_err(to_error)?;
    if lua.set_app_data(handle.clone()).is_some() {
        warn!("lcm setup ran twice on one Lua state; previous context shadowed");
    }
    debug!("lcm context bound to Lua state");
    Ok(handle)
}

/// Context bound by [`setup`], if any.
pub fn context_of(lua: &Lua) -> Result<ContextHandle> {
    lua.app_data_ref::<ContextHandle>()
        .map(|handle| ContextHandle::clone(&handle))
        .ok_or_else(|| Error::new(ErrorCode::NotInitialized))
}

/// Runs `lambda.source` once; afterwards a callback must be registered
/// under `lambda.lambda_id`.
pub fn register(lua: &Lua, lambda: &Lambda<'_>) -> Result<()> {
    let ctx = context_of(lua)?;
    let lambda_id = lambda.lambda_id;
    ctx.enter(lambda_id, 0);
    debug!("registering lambda {}", lambda_id);

    lua.load(lambda.source)
        .set_name(format!("lambda:{}", lambda_id))
        .exec()
        .map_err(|e| {
            let err = to_error(e);
            warn!("lambda {} failed during registration: {}", lambda_id, err);
            err
        })?;

    // A callback stored under this id by an earlier registration satisfies
    // the check as well.
    match ctx.callback(lua, lambda_id).map_err(to_error)? {
        Some(ScriptValue::Callable(_)) => {
            info!("registered lambda {}", lambda_id);
            Ok(())
        }
        _ => {
            warn!("lambda {} never called lcm:register()", lambda_id);
            Err(Error::new(ErrorCode::NoRegistrationCall))
        }
    }
}

/// Runs `batch` through its lambda and hands the result to `result_sink`.
///
/// The sink is called at most once, before this returns, and only when the
/// callback returned a string. The batch it receives borrows from the Lua
/// state.
pub fn process<F>(lua: &Lua, batch: &Batch<'_>, result_sink: F) -> Result<()>
where
    F: FnOnce(&Batch<'_>),
{
    let ctx = context_of(lua)?;
    let (lambda_id, batch_id) = (batch.lambda_id, batch.batch_id);
    ctx.enter(lambda_id, batch_id);
    debug!("processing batch {} with lambda {}", batch_id, lambda_id);

    let callback = match ctx.callback(lua, lambda_id).map_err(to_error)? {
        Some(ScriptValue::Callable(f)) => f,
        Some(_) | None => {
            warn!("batch {}: lambda {} not registered", batch_id, lambda_id);
            return Err(Error::new(ErrorCode::LambdaNotFound));
        }
    };

    let payload = lua.create_string(batch.payload).map_err(to_error)?;
    let returned: MultiValue = callback.call(payload).map_err(|e| {
        let err = to_error(e);
        warn!("batch {}: lambda {} failed: {}", batch_id, lambda_id, err);
        err
    })?;

    let result = match returned.into_iter().next().map(ScriptValue::from) {
        Some(ScriptValue::String(s)) => s,
        Some(other) => {
            return Err(Error::with_detail(
                ErrorCode::NoResult,
                format!("lambda returned a {}", other.type_name()),
            ));
        }
        None => {
            return Err(Error::with_detail(
                ErrorCode::NoResult,
                "lambda returned nothing",
            ));
        }
    };

    let bytes = result.as_bytes();
    result_sink(&Batch::new(lambda_id, batch_id, &bytes));
    Ok(())
}
