//! Per-candidate temporary storage.
//!
//! [`Staging`] hands out one [`StagingArea`] per candidate: a private
//! temporary directory holding the staged input and the encoder output. The
//! directory is removed when the area is released or dropped, so no staged
//! file outlives its candidate regardless of how processing ends.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use cf_core::{Container, Error, Result};

/// File name of the encoder output inside a staging area.
const OUTPUT_FILE: &str = "output.mp4";

/// Factory for per-candidate staging areas.
#[derive(Debug, Clone, Default)]
pub struct Staging {
    root: Option<PathBuf>,
}

impl Staging {
    /// Stage under `root`, or the system temp directory when `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Commit in-memory upload bytes to a fresh staging area.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Staging`] if the directory cannot be created or the
    /// bytes cannot be written. Any partially written file is removed along
    /// with the directory before returning.
    pub async fn stage_bytes(&self, container: Container, bytes: &[u8]) -> Result<StagingArea> {
        let area = self.acquire(container)?;
        tokio::fs::write(&area.input, bytes).await.map_err(|e| {
            Error::Staging(format!("failed to write {}: {e}", area.input.display()))
        })?;
        Ok(area)
    }

    /// Copy an on-disk upload into a fresh staging area.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Staging`] if the source cannot be read or the copy
    /// fails.
    pub async fn stage_file(&self, container: Container, source: &Path) -> Result<StagingArea> {
        let area = self.acquire(container)?;
        tokio::fs::copy(source, &area.input).await.map_err(|e| {
            Error::Staging(format!("failed to stage {}: {e}", source.display()))
        })?;
        Ok(area)
    }

    fn acquire(&self, container: Container) -> Result<StagingArea> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("clipfit-");
        let temp_dir = match &self.root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::Staging(format!("failed to create temp dir: {e}")))?;

        let input = temp_dir.path().join(format!("input.{}", container.extension()));
        let output = temp_dir.path().join(OUTPUT_FILE);

        Ok(StagingArea {
            temp_dir,
            input,
            output,
        })
    }
}

/// Temporary input/output storage owned by a single candidate.
#[derive(Debug)]
pub struct StagingArea {
    temp_dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl StagingArea {
    /// The staged input file.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Where the encoder should write its output.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Copy the encoder output to `dest`, creating parent directories.
    ///
    /// Tries a rename first (same filesystem) and falls back to copying.
    pub async fn deliver_to(&self, dest: &Path) -> Result<PathBuf> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if tokio::fs::rename(&self.output, dest).await.is_err() {
            tokio::fs::copy(&self.output, dest).await.map_err(|e| {
                Error::Staging(format!(
                    "failed to copy output to {}: {e}",
                    dest.display()
                ))
            })?;
        }
        Ok(dest.to_path_buf())
    }

    /// Read the encoder output into memory.
    pub async fn read_output(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.output)
            .await
            .map_err(|e| Error::Staging(format!("failed to read output: {e}")))
    }

    /// Remove the staging directory now. Failures are logged, not returned;
    /// a leftover directory in the temp root is not worth failing a
    /// candidate over.
    pub fn release(self) {
        let path = self.temp_dir.path().to_path_buf();
        if let Err(e) = self.temp_dir.close() {
            tracing::warn!("failed to remove staging dir {}: {e}", path.display());
        }
    }
}
