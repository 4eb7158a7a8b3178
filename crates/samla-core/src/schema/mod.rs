pub mod catalog;
pub mod db;
pub mod migrations;
pub mod photos;

pub use db::Database;
pub use migrations::{AppliedMigration, Migration, MIGRATIONS};
