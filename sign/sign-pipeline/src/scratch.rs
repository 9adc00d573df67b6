//! Per-sample scratch space.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// A temporary directory owned by one sample's processing.
///
/// The directory and everything in it is removed when the value is
/// dropped, on success and failure alike.
#[derive(Debug)]
pub struct SampleScratch {
    dir: TempDir,
}

impl SampleScratch {
    /// Creates scratch space under `root`, or the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                tempfile::Builder::new().prefix("sign-sample-").tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix("sign-sample-").tempdir()?,
        };
        Ok(Self { dir })
    }

    /// Scratch directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the fetched video for `stem` goes.
    ///
    /// Only ASCII alphanumerics, `-` and `_` of `stem` are kept, so the
    /// path always names a file directly inside the scratch directory.
    #[must_use]
    pub fn video_path(&self, stem: &str) -> PathBuf {
        let safe: String = stem
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        let safe = if safe.is_empty() { "video" } else { safe.as_str() };
        self.dir.path().join(format!("{safe}.mp4"))
    }
}
