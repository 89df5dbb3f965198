//! Singleton lock so only one mailcal-server instance runs.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Holds the lock until dropped.
pub struct LockGuard {
    _file: File,
}

pub fn lock_path() -> Result<PathBuf> {
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join("mailcal").join("server.lock"))
}

/// Acquire an exclusive lock at `path`, failing if another instance holds it.
pub fn acquire_lock(path: &Path) -> Result<LockGuard> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let file = File::create(path).context("Failed to create lock file")?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "Another mailcal-server instance is already running.\n\
            If you believe this is an error, remove: {}",
            path.display()
        )
    })?;

    Ok(LockGuard { _file: file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lock_fails_until_first_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("server.lock");

        let first = acquire_lock(&path).unwrap();
        let err = acquire_lock(&path).err().unwrap();
        assert!(err.to_string().contains("already running"));

        drop(first);
        assert!(acquire_lock(&path).is_ok());
    }
}
