//! Forward-only schema migrations.
//!
//! Migrations are defined once, here, and are never edited after they ship:
//! a fix for a shipped migration is a new migration with the next version.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Error, Result};

/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

/// One row of the migration ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: u32,
    pub applied_at: Option<NaiveDateTime>,
}

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT DEFAULT CURRENT_TIMESTAMP
)";

const MIGRATION_001: &[&str] = &[
    LEDGER_DDL,
    "CREATE TABLE IF NOT EXISTS manufacturers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS storage_locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        friendly_name TEXT NOT NULL UNIQUE,
        note TEXT
    )",
    "CREATE TABLE IF NOT EXISTS boxes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        location_id INTEGER NOT NULL REFERENCES storage_locations(id) ON DELETE CASCADE,
        code TEXT NOT NULL UNIQUE,
        name TEXT,
        CHECK (length(trim(code)) > 0)
    )",
    "CREATE TABLE IF NOT EXISTS bags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        box_id INTEGER NOT NULL REFERENCES boxes(id) ON DELETE CASCADE,
        serial_no TEXT NOT NULL,
        UNIQUE (box_id, serial_no),
        CHECK (length(trim(serial_no)) > 0)
    )",
    "CREATE TABLE IF NOT EXISTS sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bag_id INTEGER NOT NULL UNIQUE REFERENCES bags(id) ON DELETE CASCADE,
        manufacturer_id INTEGER REFERENCES manufacturers(id) ON DELETE SET NULL,
        name TEXT NOT NULL,
        photo_path TEXT,
        photo_source TEXT,
        CHECK (length(trim(name)) > 0)
    )",
    "CREATE TABLE IF NOT EXISTS elements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        set_id INTEGER NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        kind TEXT,
        CHECK (length(trim(name)) > 0),
        CHECK (kind IN ('stempel', 'stanze') OR kind IS NULL OR length(kind) = 0)
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        CHECK (length(trim(name)) > 0)
    )",
    "CREATE TABLE IF NOT EXISTS set_tags (
        set_id INTEGER NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (set_id, tag_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_sets_name ON sets(name)",
    "CREATE INDEX IF NOT EXISTS idx_boxes_code ON boxes(code)",
    "CREATE INDEX IF NOT EXISTS idx_boxes_name ON boxes(name)",
    "CREATE INDEX IF NOT EXISTS idx_bags_serial ON bags(serial_no)",
    "CREATE INDEX IF NOT EXISTS idx_elements_name ON elements(name)",
    "CREATE INDEX IF NOT EXISTS idx_tags_name ON tags(name)",
    "CREATE INDEX IF NOT EXISTS idx_set_tags_set_id ON set_tags(set_id)",
];

const MIGRATION_002: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        CHECK (length(trim(name)) > 0)
    )",
    "ALTER TABLE sets ADD COLUMN type_id INTEGER REFERENCES types(id) ON DELETE SET NULL",
    "CREATE INDEX IF NOT EXISTS idx_types_name ON types(name)",
];

const MIGRATION_003: &[&str] = &[
    "ALTER TABLE storage_locations ADD COLUMN room TEXT",
    "ALTER TABLE storage_locations ADD COLUMN shelf TEXT",
    "ALTER TABLE storage_locations ADD COLUMN compartment TEXT",
];

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        statements: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "set_types",
        statements: MIGRATION_002,
    },
    Migration {
        version: 3,
        name: "location_details",
        statements: MIGRATION_003,
    },
];

/// The newest schema version this build knows about.
#[must_use]
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Bring `conn` up to the last migration in `migrations`.
///
/// Every pending migration runs inside a single transaction together with its
/// ledger row, so either all of them land or none do. Returns the number of
/// migrations applied; zero means the schema was already current.
pub fn apply_migrations(conn: &Connection, migrations: &[Migration]) -> Result<usize> {
    check_sequence(migrations)?;
    let latest = migrations.last().map_or(0, |m| m.version);

    let tx = conn.unchecked_transaction()?;
    tx.execute(LEDGER_DDL, [])?;

    let current: u32 = tx.query_row(
        "SELECT IFNULL(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    if current > latest {
        return Err(Error::SchemaTooNew {
            found: current,
            latest,
        });
    }

    let mut applied = 0;
    for migration in migrations.iter().filter(|m| m.version > current) {
        log::info!(
            "Applying migration {} ({})",
            migration.version,
            migration.name
        );
        for statement in migration.statements {
            tx.execute_batch(statement)
                .map_err(|source| Error::Migration {
                    version: migration.version,
                    source,
                })?;
        }
        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [migration.version],
        )
        .map_err(|source| Error::Migration {
            version: migration.version,
            source,
        })?;
        applied += 1;
    }

    tx.commit()?;
    Ok(applied)
}

/// Versions must run 1, 2, 3, ... without gaps or repeats.
fn check_sequence(migrations: &[Migration]) -> Result<()> {
    for (expected, migration) in (1..).zip(migrations) {
        if migration.version != expected {
            return Err(Error::InvalidData(format!(
                "migration {} ({}) is out of sequence, expected version {}",
                migration.version, migration.name, expected
            )));
        }
    }
    Ok(())
}

/// Read the current schema version; 0 when nothing has been applied yet.
pub fn current_version(conn: &Connection) -> Result<u32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations')",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT IFNULL(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// List the ledger in version order.
pub fn ledger(conn: &Connection) -> Result<Vec<AppliedMigration>> {
    let mut stmt =
        conn.prepare("SELECT version, applied_at FROM schema_migrations ORDER BY version")?;
    let rows = stmt
        .query_map([], |row| {
            let applied_at: Option<String> = row.get(1)?;
            Ok(AppliedMigration {
                version: row.get(0)?,
                applied_at: applied_at.and_then(|raw| {
                    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").ok()
                }),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
