//! Temporary artifacts: the uploaded bytes materialized as a file.
//!
//! Conversion engines need a file-system path, and most of them pick a
//! parser from the file extension, so every upload is written to a
//! uniquely-named temp file that keeps the original suffix.
//!
//! [`TempArtifact`] owns that file. It is deleted exactly once: explicitly
//! via [`TempArtifact::release`] on the normal path, or by the drop guard
//! when the owning future errors out, panics, or is cancelled (client
//! disconnect).

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const ARTIFACT_PREFIX: &str = "doctext-";

/// Extension of `filename` including the leading dot, or `""`.
///
/// Only the final path component is considered, and a name that merely
/// starts with a dot (`.bashrc`) has no extension.
pub fn file_suffix(filename: &str) -> &str {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) if idx + 1 == name.len() => "",
        Some(idx) => &name[idx..],
    }
}

/// A request-scoped temporary file holding an upload.
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
    suffix: String,
}

impl TempArtifact {
    /// Write `bytes` to a fresh temp file named after `filename`'s suffix.
    ///
    /// Runs on the blocking pool. If the calling future is dropped before the
    /// task finishes, the finished artifact is dropped with the join output
    /// and its file removed.
    pub async fn materialize(
        dir: Option<&Path>,
        filename: &str,
        bytes: bytes::Bytes,
    ) -> std::io::Result<Self> {
        let dir = dir.map(Path::to_path_buf);
        let suffix = file_suffix(filename).to_string();

        tokio::task::spawn_blocking(move || Self::create_blocking(dir.as_deref(), suffix, &bytes))
            .await
            .map_err(|e| std::io::Error::other(format!("artifact task failed: {e}")))?
    }

    /// Blocking implementation of [`TempArtifact::materialize`].
    pub fn create_blocking(dir: Option<&Path>, suffix: String, bytes: &[u8]) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(ARTIFACT_PREFIX).suffix(&suffix);

        let mut file = match dir {
            Some(d) => builder.tempfile_in(d)?,
            None => builder.tempfile()?,
        };

        file.write_all(bytes)?;
        file.flush()?;
        file.as_file().sync_data()?;

        debug!(
            "Materialized {} bytes at {}",
            bytes.len(),
            file.path().display()
        );
        Ok(Self { file, suffix })
    }

    /// Path handed to the conversion engine.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Suffix copied from the uploaded filename (may be empty).
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Delete the file now. Failures are logged, never returned.
    pub fn release(self) -> PathBuf {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!("Removed artifact {}", path.display()),
            Err(e) => warn!("Failed to remove artifact {}: {}", path.display(), e),
        }
        path
    }
}
