//! file: core/src/context.rs
//! description: per-interpreter execution context and the Lua natives.
//!
//! `ContextHandle` is bound into a Lua state twice: as the `lcm` global,
//! which script code calls `lcm:register()` and `lcm:log()` on, and as app
//! data, which the host functions read. Both point at the same
//! `ExecutionContext`. The handle is `!Send`; one state, one thread.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::{debug, info};
use mlua::{Lua, UserData, UserDataMethods};

use crate::batch::LogEntry;
use crate::engine::argument_error;
use crate::registry::LambdaRegistry;
use crate::value::ScriptValue;

/// Receiver for `lcm:log()` calls. The entry only lives for the call.
pub struct LogSink(Box<dyn Fn(&LogEntry<'_>)>);

impl LogSink {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&LogEntry<'_>) + 'static,
    {
        LogSink(Box::new(f))
    }

    /// Forwards lambda messages to the `log` facade under `lcm::lambda`.
    pub fn to_log() -> Self {
        LogSink::new(|entry| {
            info!(
                target: "lcm::lambda",
                "[lambda {} batch {}] {}",
                entry.lambda_id,
                entry.batch_id,
                entry.message_lossy()
            );
        })
    }

    fn forward(&self, entry: &LogEntry<'_>) {
        (self.0)(entry)
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

/// Settings applied once at [`crate::setup`].
#[derive(Debug, Default)]
pub struct Config {
    /// Without a sink, `lcm:log()` calls are dropped.
    pub log_sink: Option<LogSink>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn with_log_fn<F>(self, f: F) -> Self
    where
        F: Fn(&LogEntry<'_>) + 'static,
    {
        self.with_log_sink(LogSink::new(f))
    }
}

pub struct ExecutionContext {
    lambda_id: Cell<i32>,
    batch_id: Cell<i32>,
    log_sink: Option<LogSink>,
    registry: RefCell<LambdaRegistry>,
}

impl ExecutionContext {
    fn new(config: Config) -> Self {
        ExecutionContext {
            lambda_id: Cell::new(0),
            batch_id: Cell::new(0),
            log_sink: config.log_sink,
            registry: RefCell::new(LambdaRegistry::new()),
        }
    }

    /// Sets the ids seen by natives until the next call replaces them.
    pub(crate) fn enter(&self, lambda_id: i32, batch_id: i32) {
        self.lambda_id.set(lambda_id);
        self.batch_id.set(batch_id);
    }

    pub fn current_lambda_id(&self) -> i32 {
        self.lambda_id.get()
    }

    pub fn current_batch_id(&self) -> i32 {
        self.batch_id.get()
    }

    pub fn is_registered(&self, lambda_id: i32) -> bool {
        self.registry.borrow().contains(lambda_id)
    }

    /// Classified value stored for `lambda_id`, if any.
    ///
    /// The registry borrow ends before this returns, so the caller may run
    /// Lua code that registers again.
    pub(crate) fn callback(&self, lua: &Lua, lambda_id: i32) -> mlua::Result<Option<ScriptValue>> {
        let registry = self.registry.borrow();
        let Some(key) = registry.get(lambda_id) else {
            return Ok(None);
        };
        let value: mlua::Value = lua.registry_value(key)?;
        Ok(Some(ScriptValue::from(value)))
    }

    fn store(&self, lua: &Lua, callback: mlua::Function) -> mlua::Result<()> {
        let lambda_id = self.current_lambda_id();
        let key = lua.create_registry_value(callback)?;
        self.registry.borrow_mut().insert(lambda_id, key);
        debug!("lambda {} stored its callback", lambda_id);
        Ok(())
    }

    fn log(&self, message: &[u8]) {
        let Some(sink) = &self.log_sink else {
            return;
        };
        sink.forward(&LogEntry {
            lambda_id: self.current_lambda_id(),
            batch_id: self.current_batch_id(),
            message,
        });
    }
}

/// Shared handle to an [`ExecutionContext`].
#[derive(Clone)]
pub struct ContextHandle(Rc<ExecutionContext>);

impl ContextHandle {
    pub(crate) fn new(config: Config) -> Self {
        ContextHandle(Rc::new(ExecutionContext::new(config)))
    }

    pub fn ptr_eq(&self, other: &ContextHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for ContextHandle {
    type Target = ExecutionContext;

    fn deref(&self) -> &ExecutionContext {
        &self.0
    }
}

impl UserData for ContextHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // lcm:register(callback)
        methods.add_method("register", |lua, this, callback: mlua::Value| {
            match ScriptValue::from(callback) {
                ScriptValue::Callable(f) => this.store(lua, f),
                other => Err(argument_error("register", 1, "function", other.type_name())),
            }
        });

        // lcm:log(message)
        methods.add_method("log", |_, this, message: mlua::Value| {
            match ScriptValue::from(message) {
                ScriptValue::String(s) => {
                    this.log(&s.as_bytes());
                    Ok(())
                }
                other => Err(argument_error("log", 1, "string", other.type_name())),
            }
        });
    }
}
