use crate::CoreError;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir, TempPath};
use tracing::{debug, info};

/// Owner of every scratch directory and file created during one run.
///
/// Each entry gets a randomized name under `root` and is deleted when the
/// arena is dropped, whether the run succeeded or not. With `keep` set the
/// entries are left on disk instead.
pub struct Scratch {
    root: PathBuf,
    keep: bool,
    dirs: Vec<TempDir>,
    files: Vec<TempPath>,
}

impl Scratch {
    pub fn new(root: impl Into<PathBuf>, keep: bool) -> Result<Self, CoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            keep,
            dirs: Vec::new(),
            files: Vec::new(),
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh directory named `<prefix><random>`.
    pub fn dir(&mut self, prefix: &str) -> Result<PathBuf, CoreError> {
        let dir = Builder::new()
            .prefix(prefix)
            .keep(self.keep)
            .tempdir_in(&self.root)?;
        let path = dir.path().to_path_buf();
        debug!("scratch dir {}", path.display());
        self.dirs.push(dir);
        Ok(path)
    }

    /// Create an empty file named `<prefix><random><suffix>`.
    pub fn file(&mut self, prefix: &str, suffix: &str) -> Result<PathBuf, CoreError> {
        let file = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .keep(self.keep)
            .tempfile_in(&self.root)?;
        let path = file.into_temp_path();
        let owned = path.to_path_buf();
        debug!("scratch file {}", owned.display());
        self.files.push(path);
        Ok(owned)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if self.keep {
            info!("keeping scratch files under {}", self.root.display());
        }
    }
}
