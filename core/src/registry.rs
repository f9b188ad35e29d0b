//! file: core/src/registry.rs
//! description: lambda id -> Lua callback map.
//!
//! Callbacks stay owned by the Lua state; the registry only keeps a
//! `RegistryKey` per lambda id.

use mlua::RegistryKey;
use std::collections::HashMap;

#[derive(Default)]
pub struct LambdaRegistry {
    entries: HashMap<i32, RegistryKey>,
}

impl LambdaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key` under `lambda_id`, replacing any previous entry.
    pub fn insert(&mut self, lambda_id: i32, key: RegistryKey) {
        self.entries.insert(lambda_id, key);
    }

    pub fn get(&self, lambda_id: i32) -> Option<&RegistryKey> {
        self.entries.get(&lambda_id)
    }

    pub fn contains(&self, lambda_id: i32) -> bool {
        self.entries.contains_key(&lambda_id)
    }
}
