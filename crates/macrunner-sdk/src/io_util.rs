use anyhow::{Context, Result};
use std::path::Path;
use std::{fs, thread, time::Duration};

/// Filesystem helpers for runner directories.
pub struct IOUtil;

impl IOUtil {
    /// Recursively delete a directory with retry logic.
    ///
    /// A freshly stopped runner service can still hold files open for a short
    /// while, so removal is retried up to 3 times with a small delay.
    pub fn delete_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        if path.symlink_metadata()?.file_type().is_symlink() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove symlink '{}'", path.display()))?;
            return Ok(());
        }

        let max_retries = 3;
        let mut last_err = None;

        for attempt in 0..max_retries {
            match fs::remove_dir_all(path) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(
                        "Failed to delete '{}' (attempt {}): {}",
                        path.display(),
                        attempt + 1,
                        e
                    );
                    last_err = Some(e);
                    if attempt < max_retries - 1 {
                        thread::sleep(Duration::from_millis(100 * (attempt as u64 + 1)));
                    }
                }
            }
        }

        let err = last_err.map(anyhow::Error::from).unwrap_or_else(|| {
            anyhow::anyhow!("directory removal did not report an error")
        });
        Err(err).with_context(|| {
            format!(
                "Failed to delete directory '{}' after {} retries",
                path.display(),
                max_retries
            )
        })
    }

    /// Create `path` and all of its parents if they do not exist yet.
    pub fn ensure_directory_exists(path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory '{}'", path.display()))
    }

    /// Wipe `path` (if present) and recreate it empty.
    pub fn recreate_directory(path: &Path) -> Result<()> {
        Self::delete_directory(path)?;
        Self::ensure_directory_exists(path)
    }
}
