pub mod catalog;
pub mod config;
pub mod migrate;
pub mod photo;
pub mod search;

use anyhow::{Context, Result};
use samla_assets::{AssetStore, Config};
use samla_core::{AppPaths, Database};

pub use catalog::{BoxCommand, ElementCommand, LocationCommand, SetCommand};
pub use config::ConfigCommand;
pub use photo::PhotoCommand;

/// An opened, migrated catalog with its photo store.
#[derive(Debug)]
pub struct Catalog {
    pub paths: AppPaths,
    pub db: Database,
    pub assets: AssetStore,
}

impl Catalog {
    pub fn open(config: &Config) -> Result<Self> {
        let paths = config.paths();
        paths
            .ensure_dirs()
            .with_context(|| format!("Failed to create {}", paths.base_dir.display()))?;

        let db = Database::open(&paths.db_path)
            .with_context(|| format!("Failed to open catalog {}", paths.db_path.display()))?;
        let assets = AssetStore::new(paths.clone()).with_timeout(config.download_timeout());

        Ok(Self { paths, db, assets })
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
