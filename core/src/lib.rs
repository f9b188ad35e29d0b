pub mod batch;
pub mod context;
mod engine;
pub mod error;
pub mod host;
pub mod manifest;
pub mod protocol;
pub mod registry;
pub mod script;
pub mod value;

pub use batch::{Batch, Lambda, LogEntry, OwnedBatch};
pub use context::{Config, ContextHandle, ExecutionContext, LogSink};
pub use error::{Error, ErrorCode, Level, LcmErrorExt, Result, error_to_string, status_code};
pub use host::LambdaHost;
pub use manifest::{LambdaManifest, LambdaSpec, ManifestError};
pub use protocol::{GLOBAL_NAME, context_of, process, register, setup};
pub use script::{LambdaSource, MissingScriptError};
pub use value::ScriptValue;

pub fn generate_error_report<E: LcmErrorExt + ?Sized>(error: &E) -> String {
    format!("LCM | {} | {} | {}", error.level(), error.issuer(), error.message())
}
