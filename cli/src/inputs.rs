//! Expands `lcm run` input patterns into the ordered list of batch files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Each pattern must match at least one file. Matches keep glob's sorted
/// order within a pattern; patterns keep command-line order.
pub fn expand<'a>(patterns: impl IntoIterator<Item = &'a str>) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let before = files.len();
        let entries = glob::glob(pattern).with_context(|| format!("invalid input pattern '{}'", pattern))?;
        for entry in entries {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
        if files.len() == before {
            bail!("no input files match '{}'", pattern);
        }
    }
    Ok(files)
}

/// `DIR/<file name>` for every input. Two inputs sharing a file name would
/// overwrite each other, so that is an error.
pub fn output_targets(dir: &Path, files: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen: HashMap<&std::ffi::OsStr, &Path> = HashMap::new();
    let mut targets = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name()
            .with_context(|| format!("input {} has no file name", file.display()))?;
        if let Some(first) = seen.insert(name, file) {
            bail!(
                "inputs {} and {} would both write {}",
                first.display(),
                file.display(),
                dir.join(name).display()
            );
        }
        targets.push(dir.join(name));
    }
    Ok(targets)
}
