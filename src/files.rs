use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Resolve a path argument to the list of `.twee` files to process.
/// A file path is taken as is; a directory yields its `.twee` entries in
/// sorted order. Missing paths and empty matches are user errors.
pub fn collect_twee_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("path does not exist: {}", path.display());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)
        .with_context(|| format!("failed to read directory: {}", path.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "twee"))
        .collect();
    files.sort();

    if files.is_empty() {
        bail!("no .twee files found in: {}", path.display());
    }
    Ok(files)
}

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read: {}", path.display()))
}

pub fn write_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write: {}", path.display()))
}

/// Save `original` next to `path` with an appended `.backup` suffix
/// (`story.twee` → `story.twee.backup`). Returns the backup path.
pub fn write_backup(path: &Path, original: &str) -> Result<PathBuf> {
    let mut name = OsString::from(path.as_os_str());
    name.push(".backup");
    let backup = PathBuf::from(name);
    fs::write(&backup, original)
        .with_context(|| format!("failed to write backup: {}", backup.display()))?;
    Ok(backup)
}

// ── Tests ──
