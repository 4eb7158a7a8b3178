use anyhow::{Context, Result};
use confyg::{env, Confygery};
use samla_core::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for photo downloads.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 15;

/// Configuration for samla.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (SAMLA_* prefix)
/// 3. Config file (~/.config/samla/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `Data/samla.db` and the `Images/` asset root.
    ///
    /// Can be set via:
    /// - CLI: --base-dir /path/to/catalog
    /// - ENV: SAMLA_BASE_DIR
    /// - Config: base_dir = "/path/to/catalog"
    /// - Default: <config dir>/Samla
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Seconds before a photo download is abandoned.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Default log filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/samla/config.toml
    /// Reads environment variables with SAMLA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("samla");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration, then override the base directory.
    ///
    /// This is used when the --base-dir CLI flag is provided.
    pub fn load_with_base_dir(base_dir: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.base_dir = base_dir;
        Ok(config)
    }

    /// Directory layout derived from `base_dir`.
    #[must_use]
    pub fn paths(&self) -> AppPaths {
        AppPaths::new(&self.base_dir)
    }

    /// Download timeout; zero falls back to the default.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        match self.download_timeout_secs {
            0 => Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Samla")
}

fn default_download_timeout() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/samla/config.toml
/// - macOS: ~/Library/Application Support/samla/config.toml
/// - Windows: %APPDATA%\samla\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("samla")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Samla Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (SAMLA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Catalog directory
#
# Holds the database (Data/samla.db) and every photo (Images/).
#
# Can also be set via:
# - CLI: samla --base-dir /custom/catalog search castle
# - Environment: SAMLA_BASE_DIR=/custom/catalog
#
# Default: <platform config dir>/Samla
#base_dir = "/path/to/catalog"

# Seconds to wait for a photo download before giving up
download_timeout_secs = 15

# Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
log_level = "info"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
