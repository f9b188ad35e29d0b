//! file: core/src/value.rs
//! description: classification of Lua values crossing the host boundary.
//!
//! Every protocol check (registered callback, returned result, log message)
//! matches on `ScriptValue` instead of relying on Lua's implicit coercions.

use mlua::Value as LuaValue;

#[derive(Debug, Clone)]
pub enum ScriptValue {
    String(mlua::String),
    Number(f64),
    Bool(bool),
    Callable(mlua::Function),
    Nil,
    Other(&'static str),
}

impl From<LuaValue> for ScriptValue {
    fn from(v: LuaValue) -> Self {
        match v {
            LuaValue::String(s) => ScriptValue::String(s),
            LuaValue::Integer(i) => ScriptValue::Number(i as f64),
            LuaValue::Number(n) => ScriptValue::Number(n),
            LuaValue::Boolean(b) => ScriptValue::Bool(b),
            LuaValue::Function(f) => ScriptValue::Callable(f),
            LuaValue::Nil => ScriptValue::Nil,
            other => ScriptValue::Other(other.type_name()),
        }
    }
}

impl ScriptValue {
    /// Lua name of the value's type, as used in argument errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::String(_) => "string",
            ScriptValue::Number(_) => "number",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Callable(_) => "function",
            ScriptValue::Nil => "nil",
            ScriptValue::Other(name) => *name,
        }
    }
}
