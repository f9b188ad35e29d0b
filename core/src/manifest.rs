//! file: core/src/manifest.rs
//! description: lambda manifest types and loading helpers.
//!
//! A manifest is a JSON file listing lambdas by id and source path. Paths
//! are resolved against the manifest's directory.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Level, LcmErrorExt};
use crate::script::LambdaSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaSpec {
    pub id: i32,
    pub path: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lambdas: Vec<LambdaSpec>,
    /// Directory the manifest was loaded from; not part of the JSON.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl LambdaManifest {
    pub fn from_json_str(raw: &str) -> Result<LambdaManifest, ManifestError> {
        serde_json::from_str(raw).map_err(|e| ManifestError::new(format!("parse manifest: {}", e), None))
    }

    /// Loads and validates a manifest from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<LambdaManifest, ManifestError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::new(format!("read manifest: {}", e), Some(path)))?;
        let mut manifest = Self::from_json_str(&raw).map_err(|e| e.at(path))?;
        manifest.base_dir = path.parent().map(Path::to_path_buf);
        manifest.validate().map_err(|e| e.at(path))?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.lambdas.is_empty() {
            return Err(ManifestError::new("manifest lists no lambdas", None));
        }
        let mut seen = HashSet::new();
        for spec in &self.lambdas {
            if spec.path.trim().is_empty() {
                return Err(ManifestError::new(format!("lambda {} has an empty path", spec.id), None));
            }
            if !seen.insert(spec.id) {
                return Err(ManifestError::new(format!("duplicate lambda id {}", spec.id), None));
            }
        }
        Ok(())
    }

    pub fn resolve_path(&self, spec: &LambdaSpec) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(&spec.path),
            None => PathBuf::from(&spec.path),
        }
    }

    /// Reads every listed source, in manifest order.
    pub fn load_sources(&self) -> Result<Vec<LambdaSource>, ManifestError> {
        self.lambdas
            .iter()
            .map(|spec| {
                let path = self.resolve_path(spec);
                LambdaSource::from_file(spec.id, &path)
                    .map_err(|e| {
                        ManifestError::new(
                            format!("read lambda {}: {}", spec.id, e.reason),
                            Some(path.as_path()),
                        )
                    })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ManifestError {
    message: String,
    path: Option<PathBuf>,
}

impl ManifestError {
    fn new(message: impl Into<String>, path: Option<&Path>) -> Self {
        ManifestError {
            message: message.into(),
            path: path.map(Path::to_path_buf),
        }
    }

    fn at(mut self, path: &Path) -> Self {
        if self.path.is_none() {
            self.path = Some(path.to_path_buf());
        }
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.message, path.display()),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ManifestError {}

impl LcmErrorExt for ManifestError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        "lcm.manifest".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let m = LambdaManifest::from_json_str(r#"{"lambdas":[{"id":1,"path":"a.lua"}]}"#).unwrap();
        assert_eq!(m.name, "");
        assert_eq!(m.lambdas[0].description, "");
        assert!(m.validate().is_ok());
        assert_eq!(m.resolve_path(&m.lambdas[0]), PathBuf::from("a.lua"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let m = LambdaManifest::from_json_str(
            r#"{"lambdas":[{"id":1,"path":"a.lua"},{"id":1,"path":"b.lua"}]}"#,
        )
        .unwrap();
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate lambda id 1"), "got: {}", err);
    }

    #[test]
    fn rejects_empty_paths_and_empty_lists() {
        let m = LambdaManifest::from_json_str(r#"{"lambdas":[{"id":3,"path":"  "}]}"#).unwrap();
        assert!(m.validate().is_err());
        let m = LambdaManifest::from_json_str(r#"{"name":"empty"}"#).unwrap();
        assert!(m.validate().is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = LambdaManifest::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().starts_with("parse manifest"), "got: {}", err);
    }
}
