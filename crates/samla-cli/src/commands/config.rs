use anyhow::Result;
use samla_assets::{config, Config};
use std::path::PathBuf;

#[derive(Debug, clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration and where it came from
    Show,
    /// Print the config file path
    Path,
    /// Create the config file with commented defaults
    Init,
    /// Print an example config file
    Example,
}

pub fn run(command: ConfigCommand, base_dir: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show => show_config(base_dir),
        ConfigCommand::Path => show_path(),
        ConfigCommand::Init => init_config(),
        ConfigCommand::Example => show_example(),
    }
}

/// Show the current effective configuration.
fn show_config(base_dir: Option<PathBuf>) -> Result<()> {
    let config = match base_dir {
        Some(dir) => Config::load_with_base_dir(dir)?,
        None => Config::load()?,
    };
    let paths = config.paths();

    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    println!(
        "File exists: {}\n",
        if config_path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  base_dir: {}", config.base_dir.display());
    println!("  download_timeout_secs: {}", config.download_timeout_secs);
    println!("  log_level: {}", config.log_level);

    println!("\nDerived paths:");
    println!("  database: {}", paths.db_path.display());
    println!("  images:   {}", paths.images_dir.display());

    println!("\nPriority: CLI args > ENV vars (SAMLA_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure samla.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
