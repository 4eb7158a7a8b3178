//! Row-side half of the photo lifecycle.
//!
//! These methods only touch the `photo_path`/`photo_source` columns. Keeping
//! the files on disk in step with them is the job of the asset coordinator,
//! which calls in here between writing a new file and removing an old one.

use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::model::{BagId, SetId};
use crate::photo::{PhotoReference, PhotoSource};

use super::db::Database;

fn non_empty(path: Option<String>) -> Option<String> {
    path.filter(|p| !p.is_empty())
}

impl Database {
    pub fn set_exists(&self, id: SetId) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sets WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// The current photo of a set, if any.
    pub fn photo(&self, id: SetId) -> Result<Option<PhotoReference>> {
        let row: Option<(Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT photo_path, photo_source FROM sets WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (path, source) = row.ok_or_else(|| Error::not_found("set", id))?;

        Ok(non_empty(path).map(|path| {
            // rows written before provenance was tracked count as local files
            let source = source
                .and_then(|s| s.parse().ok())
                .unwrap_or(PhotoSource::File);
            PhotoReference::new(path, source)
        }))
    }

    /// Point a set at a new photo. Returns the path it pointed at before.
    ///
    /// The previous path is read and overwritten inside one transaction, so
    /// the returned value is exactly what this commit replaced.
    pub fn replace_photo(&self, id: SetId, photo: &PhotoReference) -> Result<Option<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let previous: Option<String> = tx
            .query_row("SELECT photo_path FROM sets WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| Error::not_found("set", id))?;

        tx.execute(
            "UPDATE sets SET photo_path = ?1, photo_source = ?2 WHERE id = ?3",
            rusqlite::params![photo.path, photo.source.as_str(), id],
        )?;
        tx.commit()?;
        Ok(non_empty(previous))
    }

    /// Remove the photo reference of a set. Returns the path it held.
    pub fn clear_photo(&self, id: SetId) -> Result<Option<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let previous: Option<String> = tx
            .query_row("SELECT photo_path FROM sets WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| Error::not_found("set", id))?;

        tx.execute(
            "UPDATE sets SET photo_path = NULL, photo_source = NULL WHERE id = ?1",
            [id],
        )?;
        tx.commit()?;
        Ok(non_empty(previous))
    }

    /// Delete a set together with its bag. Returns the photo path it held.
    pub fn delete_set(&self, id: SetId) -> Result<Option<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let (photo, bag): (Option<String>, BagId) = tx
            .query_row(
                "SELECT photo_path, bag_id FROM sets WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| Error::not_found("set", id))?;

        tx.execute("DELETE FROM sets WHERE id = ?1", [id])?;
        tx.execute("DELETE FROM bags WHERE id = ?1", [bag])?;
        tx.commit()?;
        Ok(non_empty(photo))
    }

    /// Whether any set still points at `path`.
    ///
    /// A scan can make two sets share one file; the file may only be removed
    /// once the last of them lets go.
    pub fn photo_in_use(&self, path: &str) -> Result<bool> {
        let in_use = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sets WHERE photo_path = ?1)",
            [path],
            |row| row.get(0),
        )?;
        Ok(in_use)
    }

    /// Every non-empty photo path referenced by a set, with its owner.
    pub fn photo_paths(&self) -> Result<Vec<(SetId, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, photo_path FROM sets
             WHERE IFNULL(photo_path, '') <> ''
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
