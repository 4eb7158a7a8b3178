use anyhow::Result;
use clap::Parser;
use samla_assets::Config;
use samla_search::SortKey;
use std::path::PathBuf;

mod commands;

use commands::{BoxCommand, ConfigCommand, ElementCommand, LocationCommand, PhotoCommand, SetCommand};

#[derive(Debug, Parser)]
#[command(name = "samla", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog directory holding Data/ and Images/ (default: <config dir>/Samla)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    #[command(flatten)]
    Catalog(CatalogCommands),
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands that work on an opened catalog.
#[derive(Debug, clap::Subcommand)]
enum CatalogCommands {
    /// Apply pending schema migrations and show the migration ledger
    ///
    /// Migrations also run automatically whenever the catalog is opened, so
    /// this command mostly reports what has been applied and when. A
    /// database written by a newer samla is refused rather than modified.
    Migrate,
    /// Show catalog counts and photo consistency
    Status,
    /// Search the catalog
    ///
    /// Plain words match set names, tags, element names, box codes and
    /// names, bag serials, locations and manufacturers. Free text is then
    /// narrowed with fuzzy matching, so "cstl" finds "Castle".
    ///
    /// A leading prefix restricts the search to one field:
    ///
    ///   @box <code or name>      @tag <tag>
    ///   @produkt <element>       @hersteller <manufacturer>
    ///   @ort <location or room>
    ///
    /// (@product and @standort are accepted as aliases.)
    Search {
        /// Query words; joined with spaces
        query: Vec<String>,

        /// Sort order: name, box, location or added
        #[arg(long, default_value = "name")]
        sort: SortKey,
    },
    /// Manage storage locations
    #[command(subcommand)]
    Location(LocationCommand),
    /// Manage boxes
    #[command(subcommand)]
    Box(BoxCommand),
    /// Manage item-sets
    #[command(subcommand)]
    Set(SetCommand),
    /// Manage the elements of a set
    #[command(subcommand)]
    Element(ElementCommand),
    /// Attach, replace or remove set photos
    #[command(subcommand)]
    Photo(PhotoCommand),
}

fn load_config(base_dir: Option<PathBuf>) -> Result<Config> {
    match base_dir {
        Some(dir) => Config::load_with_base_dir(dir),
        None => Config::load(),
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(command: CatalogCommands, base_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(base_dir)?;
    init_logging(&config.log_level);

    let catalog = commands::Catalog::open(&config)?;

    match command {
        CatalogCommands::Migrate => commands::migrate::run_migrate(&catalog),
        CatalogCommands::Status => commands::migrate::show_status(&catalog, json),
        CatalogCommands::Search { query, sort } => {
            commands::search::run_search(&catalog, &query.join(" "), sort, json)
        }
        CatalogCommands::Location(command) => {
            commands::catalog::run_location(&catalog, command, json)
        }
        CatalogCommands::Box(command) => commands::catalog::run_box(&catalog, command, json),
        CatalogCommands::Set(command) => commands::catalog::run_set(&catalog, command, json),
        CatalogCommands::Element(command) => commands::catalog::run_element(&catalog, command),
        CatalogCommands::Photo(command) => commands::photo::run(&catalog, command, json),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // config subcommands must keep working when the config file is broken
        Commands::Config(command) => {
            init_logging("warn");
            commands::config::run(command, cli.base_dir)
        }
        Commands::Catalog(command) => run(command, cli.base_dir, cli.json),
    }
}
