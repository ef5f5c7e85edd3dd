use std::path::{Path, PathBuf};

/// Folder under the working directory that holds the databases by default.
pub const DEFAULT_STORAGE_ROOT: &str = "databases";

/// Settings a [crate::Session] is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one sub-directory per database.
    pub storage_root: PathBuf,
}

impl Config {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_STORAGE_ROOT)
    }
}
