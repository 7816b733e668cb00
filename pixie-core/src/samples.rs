//! Loader for the `.pixie` sample corpus.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::CoreError;

pub const SOURCE_EXTENSION: &str = "pixie";
pub const OUTPUT_EXTENSION: &str = "lua";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFile {
    /// Path relative to the corpus root.
    pub path: PathBuf,
    pub source: String,
    /// Contents of the sibling `.lua` file, when there is one.
    pub expected: Option<String>,
}

pub fn default_samples_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../samples")
}

/// Every `.pixie` file below `root`, sorted by path.
pub fn load_samples(root: impl AsRef<Path>) -> Result<Vec<SampleFile>, CoreError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(CoreError::MissingSamples(root.to_path_buf()));
    }

    let mut samples = Vec::new();
    for path in source_files(root) {
        let source = fs::read_to_string(&path)?;
        let expected_path = path.with_extension(OUTPUT_EXTENSION);
        let expected = if expected_path.is_file() {
            Some(fs::read_to_string(&expected_path)?)
        } else {
            None
        };
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        samples.push(SampleFile {
            path: relative,
            source,
            expected,
        });
    }

    debug!("loaded {} samples from {}", samples.len(), root.display());
    Ok(samples)
}

/// Absolute paths of every `.pixie` file below `root`, sorted.
pub fn source_files(root: impl AsRef<Path>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_source_file(path))
        .collect();
    files.sort();
    files
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}
