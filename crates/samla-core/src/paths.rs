//! On-disk layout of a samla installation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name of the asset root directory below the base directory.
pub const IMAGES_DIR_NAME: &str = "Images";

/// Directories and files used by one catalog.
///
/// ```text
/// <base>/
///   Data/samla.db
///   Images/<uuid>.<ext>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPaths {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppPaths {
    #[must_use]
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let data_dir = base_dir.join("Data");
        Self {
            images_dir: base_dir.join(IMAGES_DIR_NAME),
            db_path: data_dir.join("samla.db"),
            data_dir,
            base_dir,
        }
    }

    /// Create the base, data and images directories if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.base_dir, &self.data_dir, &self.images_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
