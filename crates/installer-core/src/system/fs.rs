//! Filesystem operations used by system executors
//!
//! Every helper is idempotent: running it twice leaves the same result.

use anyhow::{Context, Result};
use nix::unistd::{chown, Gid, Uid};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Create a directory and its parents
pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Copy one file, creating the destination's parent directory
pub async fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        ensure_dir(parent).await?;
    }
    fs::copy(source, destination).await.with_context(|| {
        format!(
            "Failed to copy {} to {}",
            source.display(),
            destination.display()
        )
    })?;
    Ok(())
}

/// Recursively copy `source` into `destination`
///
/// Existing files are overwritten, extra files at the destination are kept.
/// Returns the copied file paths, relative to `source`.
pub async fn copy_tree(source: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    if !source.is_dir() {
        anyhow::bail!("Source directory does not exist: {}", source.display());
    }

    let mut copied = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Walked outside of the source tree")?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target).await?;
        } else {
            copy_file(entry.path(), &target).await?;
            copied.push(relative.to_path_buf());
        }
    }
    Ok(copied)
}

/// Set permission bits on `path` and everything below it
pub async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    for entry in WalkDir::new(path) {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(mode))
            .await
            .with_context(|| {
                format!("Failed to set mode {:o} on {}", mode, entry.path().display())
            })?;
    }
    Ok(())
}

/// Give `path` and everything below it to `root:root`
pub fn chown_root(path: &Path) -> Result<()> {
    let root = (Some(Uid::from_raw(0)), Some(Gid::from_raw(0)));
    for entry in WalkDir::new(path) {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        chown(entry.path(), root.0, root.1)
            .with_context(|| format!("Failed to change owner of {}", entry.path().display()))?;
    }
    Ok(())
}

/// Restrict a directory to root: mode `0700` and `root:root` ownership
pub async fn lock_down(path: &Path) -> Result<()> {
    set_mode(path, 0o700).await?;
    chown_root(path)
}
