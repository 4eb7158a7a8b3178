use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

use super::migrations::{self, AppliedMigration, MIGRATIONS};

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A migrated catalog database.
///
/// Both constructors run the migration engine before returning, so every
/// other operation can assume the schema is at the latest version.
#[derive(Debug)]
pub struct Database {
    pub(super) conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        register_functions(&conn)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        log::debug!("Opened catalog database (journal_mode={mode})");

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        register_functions(&conn)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Apply any pending migrations. Returns how many were applied.
    pub fn migrate(&self) -> Result<usize> {
        let applied = migrations::apply_migrations(&self.conn, MIGRATIONS)?;
        if applied > 0 {
            log::info!(
                "Schema migrated to version {} ({} migration(s) applied)",
                migrations::latest_version(),
                applied
            );
        }
        Ok(applied)
    }

    /// Current schema version according to the ledger.
    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    /// All applied migrations, oldest first.
    pub fn ledger(&self) -> Result<Vec<AppliedMigration>> {
        migrations::ledger(&self.conn)
    }
}

/// Replace SQLite's built-in `lower()`, which folds ASCII only, with one
/// that folds all of Unicode. Names in the catalog are German ("Äpfel").
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let lowered = match ctx.get_raw(0) {
                ValueRef::Null => None,
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(f) => Some(f.to_string()),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    Some(String::from_utf8_lossy(bytes).to_lowercase())
                }
            };
            Ok(lowered)
        },
    )?;
    Ok(())
}
