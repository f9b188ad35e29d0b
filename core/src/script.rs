use std::path::{Path, PathBuf};

use crate::batch::Lambda;
use crate::error::{Level, LcmErrorExt};

/// Lua source for one lambda, read from disk.
#[derive(Debug, Clone)]
pub struct LambdaSource {
    pub lambda_id: i32,
    pub path: PathBuf,
    pub content: Vec<u8>,
}

impl LambdaSource {
    pub fn from_file(lambda_id: i32, path: impl AsRef<Path>) -> Result<Self, MissingScriptError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read(&path).map_err(|e| MissingScriptError {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(LambdaSource {
            lambda_id,
            path,
            content,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.content.iter().all(u8::is_ascii_whitespace)
    }

    pub fn as_lambda(&self) -> Lambda<'_> {
        Lambda::new(self.lambda_id, &self.content)
    }
}

impl std::fmt::Display for LambdaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lambda {} at {:?}", self.lambda_id, self.path)
    }
}

#[derive(Debug, Clone)]
pub struct MissingScriptError {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for MissingScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Missing lambda source at {:?}: {}", self.path, self.reason)
    }
}

impl std::error::Error for MissingScriptError {}

impl LcmErrorExt for MissingScriptError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        "lcm.script".to_string()
    }
}
