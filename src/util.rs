// src/util.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve a path from `grader.yaml` relative to the config file's directory.
///
/// Absolute paths are returned unchanged.
///
/// Example:
/// grader.yaml at `/course/hw1/grader.yaml`
/// output.file = "out/results.json"
/// → resolves to `/course/hw1/out/results.json`
pub fn resolve_relative_to_config(config_path: &Path, rel: &str) -> Result<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return Ok(rel_path.to_path_buf());
    }

    let base = config_path
        .parent()
        .context("Config path has no parent directory")?;
    Ok(base.join(rel_path))
}

/// Read a UTF-8 file into a String with a clear error message.
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Ensure a directory exists (create it if missing).
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {:?}", path))
}
