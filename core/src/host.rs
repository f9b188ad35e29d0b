//! file: core/src/host.rs
//! description: `LambdaHost`, a Lua state that owns its lcm context.
//!
//! Thin owner over the free functions in `protocol`; use those directly
//! when the Lua state is managed elsewhere.

use log::info;
use mlua::Lua;

use crate::batch::{Batch, Lambda, OwnedBatch};
use crate::context::{Config, ContextHandle};
use crate::error::Result;
use crate::manifest::{LambdaManifest, ManifestError};
use crate::protocol;

pub struct LambdaHost {
    lua: Lua,
    context: ContextHandle,
}

impl LambdaHost {
    /// New Lua state with the safe standard libraries, already set up.
    pub fn new(config: Config) -> Result<Self> {
        let lua = Lua::new();
        let context = protocol::setup(&lua, config)?;
        Ok(LambdaHost { lua, context })
    }

    pub fn register(&self, lambda: &Lambda<'_>) -> Result<()> {
        protocol::register(&self.lua, lambda)
    }

    pub fn register_source(&self, lambda_id: i32, source: impl AsRef<[u8]>) -> Result<()> {
        self.register(&Lambda::new(lambda_id, source.as_ref()))
    }

    pub fn is_registered(&self, lambda_id: i32) -> bool {
        self.context.is_registered(lambda_id)
    }

    pub fn process<F>(&self, batch: &Batch<'_>, result_sink: F) -> Result<()>
    where
        F: FnOnce(&Batch<'_>),
    {
        protocol::process(&self.lua, batch, result_sink)
    }

    /// Like [`LambdaHost::process`], copying the result out.
    pub fn process_owned(&self, batch: &Batch<'_>) -> Result<OwnedBatch> {
        let mut out = None;
        self.process(batch, |result| out = Some(result.to_owned_batch()))?;
        // process only returns Ok after the sink ran
        Ok(out.unwrap_or_default())
    }

    /// Registers every lambda a manifest lists, in order.
    ///
    /// Fails only when a source can't be read; registration outcomes are
    /// returned per lambda id and never stop the loop.
    pub fn register_manifest(
        &self,
        manifest: &LambdaManifest,
    ) -> std::result::Result<Vec<(i32, Result<()>)>, ManifestError> {
        let sources = manifest.load_sources()?;
        let outcomes: Vec<_> = sources
            .iter()
            .map(|source| (source.lambda_id, self.register(&source.as_lambda())))
            .collect();
        let ok = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
        info!("manifest '{}': {}/{} lambdas registered", manifest.name, ok, outcomes.len());
        Ok(outcomes)
    }
}
