use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::model::{
    BagId, BagInfo, BoxId, CatalogCounts, Element, ElementId, ElementKind, LocationId,
    Location, Manufacturer, ManufacturerId, NewLocation, NewSet, SetDetails, SetId, SetType,
    StorageBox, Tag, TagId, TypeId,
};

use super::db::Database;

fn required(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid(format!("{what} is required")));
    }
    Ok(value.to_string())
}

fn ensure_valid(valid: bool, what: &str) -> Result<()> {
    if valid {
        Ok(())
    } else {
        Err(Error::invalid(format!("{what} is required")))
    }
}

/// Photo paths of every set living under the matched rows, collected before a
/// cascading delete removes them.
fn released_photos(conn: &Connection, filter: &str, id: i64) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT s.photo_path FROM sets s
         JOIN bags b ON b.id = s.bag_id
         JOIN boxes bx ON bx.id = b.box_id
         WHERE {filter} = ?1 AND IFNULL(s.photo_path, '') <> ''"
    );
    let mut stmt = conn.prepare(&sql)?;
    let paths = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(paths)
}

// Locations
impl Database {
    pub fn list_locations(&self) -> Result<Vec<Location>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, friendly_name, IFNULL(room, ''), IFNULL(shelf, ''),
                    IFNULL(compartment, ''), IFNULL(note, '')
             FROM storage_locations
             ORDER BY friendly_name",
        )?;
        let locations = stmt
            .query_map([], |row| {
                Ok(Location {
                    id: row.get(0)?,
                    friendly_name: row.get(1)?,
                    room: row.get(2)?,
                    shelf: row.get(3)?,
                    compartment: row.get(4)?,
                    note: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(locations)
    }

    pub fn create_location(&self, location: &NewLocation) -> Result<LocationId> {
        let name = required(&location.friendly_name, "friendly name")?;
        self.conn.execute(
            "INSERT INTO storage_locations (friendly_name, room, shelf, compartment, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                location.room.trim(),
                location.shelf.trim(),
                location.compartment.trim(),
                location.note.trim(),
            ],
        )?;
        Ok(LocationId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_location(&self, id: LocationId, location: &NewLocation) -> Result<()> {
        let name = required(&location.friendly_name, "friendly name")?;
        let changed = self.conn.execute(
            "UPDATE storage_locations
             SET friendly_name = ?1, room = ?2, shelf = ?3, compartment = ?4, note = ?5
             WHERE id = ?6",
            params![
                name,
                location.room.trim(),
                location.shelf.trim(),
                location.compartment.trim(),
                location.note.trim(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("location", id));
        }
        Ok(())
    }

    /// Delete a location and, by cascade, everything stored in it.
    ///
    /// Returns the photo paths the removed sets referenced; the caller owns
    /// their cleanup.
    pub fn delete_location(&self, id: LocationId) -> Result<Vec<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let photos = released_photos(&tx, "bx.location_id", id.get())?;
        let changed = tx.execute("DELETE FROM storage_locations WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::not_found("location", id));
        }
        tx.commit()?;
        Ok(photos)
    }
}

// Boxes
impl Database {
    pub fn list_boxes(&self, location: Option<LocationId>) -> Result<Vec<StorageBox>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, location_id, code, IFNULL(name, '')
             FROM boxes
             WHERE ?1 IS NULL OR location_id = ?1
             ORDER BY code",
        )?;
        let boxes = stmt
            .query_map([location], |row| {
                Ok(StorageBox {
                    id: row.get(0)?,
                    location_id: row.get(1)?,
                    code: row.get(2)?,
                    name: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(boxes)
    }

    pub fn create_box(&self, location: LocationId, code: &str, name: &str) -> Result<BoxId> {
        let code = required(code, "code")?;
        ensure_valid(location.is_valid(), "location")?;
        self.conn.execute(
            "INSERT INTO boxes (location_id, code, name) VALUES (?1, ?2, ?3)",
            params![location, code, name.trim()],
        )?;
        Ok(BoxId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_box(&self, id: BoxId, location: LocationId, code: &str, name: &str) -> Result<()> {
        let code = required(code, "code")?;
        ensure_valid(location.is_valid(), "location")?;
        let changed = self.conn.execute(
            "UPDATE boxes SET location_id = ?1, code = ?2, name = ?3 WHERE id = ?4",
            params![location, code, name.trim(), id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("box", id));
        }
        Ok(())
    }

    /// Delete a box with its bags and sets. Returns the released photo paths.
    pub fn delete_box(&self, id: BoxId) -> Result<Vec<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let photos = released_photos(&tx, "bx.id", id.get())?;
        let changed = tx.execute("DELETE FROM boxes WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::not_found("box", id));
        }
        tx.commit()?;
        Ok(photos)
    }

    /// Next free numeric bag serial in a box, zero padded to four digits.
    pub fn next_bag_serial(&self, box_id: BoxId) -> Result<String> {
        if !box_id.is_valid() {
            return Ok("0001".to_string());
        }
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(CAST(serial_no AS INTEGER)) FROM bags
             WHERE box_id = ?1 AND serial_no GLOB '[0-9]*'",
            [box_id],
            |row| row.get(0),
        )?;
        Ok(format!("{:04}", max.unwrap_or(0) + 1))
    }
}

// Manufacturers and types
impl Database {
    pub fn list_manufacturers(&self) -> Result<Vec<Manufacturer>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM manufacturers ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Manufacturer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Delete a manufacturer; sets that used it keep existing without one.
    pub fn delete_manufacturer(&self, id: ManufacturerId) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE sets SET manufacturer_id = NULL WHERE manufacturer_id = ?1",
            [id],
        )?;
        tx.execute("DELETE FROM manufacturers WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn list_types(&self) -> Result<Vec<SetType>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM types ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SetType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Delete a type; sets that used it keep existing without one.
    pub fn delete_type(&self, id: TypeId) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("UPDATE sets SET type_id = NULL WHERE type_id = ?1", [id])?;
        tx.execute("DELETE FROM types WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(())
    }
}

/// Find a row by case-insensitive name or insert it. Blank names yield `None`.
fn ensure_named(conn: &Connection, table: &str, name: &str) -> Result<Option<i64>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    let existing: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {table} WHERE LOWER(name) = LOWER(?1)"),
            [name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(Some(id));
    }
    conn.execute(&format!("INSERT INTO {table} (name) VALUES (?1)"), [name])?;
    Ok(Some(conn.last_insert_rowid()))
}

pub(crate) fn ensure_manufacturer(conn: &Connection, name: &str) -> Result<Option<ManufacturerId>> {
    Ok(ensure_named(conn, "manufacturers", name)?.map(ManufacturerId::new))
}

pub(crate) fn ensure_type(conn: &Connection, name: &str) -> Result<Option<TypeId>> {
    Ok(ensure_named(conn, "types", name)?.map(TypeId::new))
}

fn ensure_tag(conn: &Connection, name: &str) -> Result<Option<TagId>> {
    Ok(ensure_named(conn, "tags", &name.to_lowercase())?.map(TagId::new))
}

// Bags and sets
impl Database {
    /// Create a bag in a box and the set it holds, in one transaction.
    pub fn create_bag_with_set(&self, set: &NewSet) -> Result<SetId> {
        let name = required(&set.name, "set name")?;
        ensure_valid(set.box_id.is_valid(), "box")?;
        let serial = required(&set.bag_serial, "bag serial")?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO bags (box_id, serial_no) VALUES (?1, ?2)",
            params![set.box_id, serial],
        )?;
        let bag_id = BagId::new(tx.last_insert_rowid());

        let manufacturer = ensure_manufacturer(&tx, &set.manufacturer)?;
        let set_type = ensure_type(&tx, &set.set_type)?;

        tx.execute(
            "INSERT INTO sets (bag_id, manufacturer_id, type_id, name) VALUES (?1, ?2, ?3, ?4)",
            params![bag_id, manufacturer, set_type, name],
        )?;
        let set_id = SetId::new(tx.last_insert_rowid());
        tx.commit()?;
        Ok(set_id)
    }

    /// Rename a set, re-point its manufacturer and type, and move its bag.
    pub fn update_set(&self, id: SetId, set: &NewSet) -> Result<()> {
        let name = required(&set.name, "set name")?;
        ensure_valid(set.box_id.is_valid(), "box")?;
        let serial = required(&set.bag_serial, "bag serial")?;

        let tx = self.conn.unchecked_transaction()?;
        let bag_id: BagId = tx
            .query_row("SELECT bag_id FROM sets WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| Error::not_found("set", id))?;

        let manufacturer = ensure_manufacturer(&tx, &set.manufacturer)?;
        let set_type = ensure_type(&tx, &set.set_type)?;

        tx.execute(
            "UPDATE sets SET name = ?1, manufacturer_id = ?2, type_id = ?3 WHERE id = ?4",
            params![name, manufacturer, set_type, id],
        )?;
        tx.execute(
            "UPDATE bags SET box_id = ?1, serial_no = ?2 WHERE id = ?3",
            params![set.box_id, serial, bag_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_set(&self, id: SetId) -> Result<SetDetails> {
        let details = self
            .conn
            .query_row(
                "SELECT s.id, s.name, s.manufacturer_id, IFNULL(m.name, ''),
                        s.type_id, IFNULL(tp.name, ''),
                        IFNULL(s.photo_path, ''), IFNULL(s.photo_source, ''),
                        b.id, b.serial_no, bx.id, bx.code, IFNULL(bx.name, ''),
                        loc.id, IFNULL(loc.friendly_name, ''), IFNULL(loc.room, ''),
                        IFNULL(loc.shelf, ''), IFNULL(loc.compartment, ''), IFNULL(loc.note, '')
                 FROM sets s
                 JOIN bags b ON b.id = s.bag_id
                 JOIN boxes bx ON bx.id = b.box_id
                 LEFT JOIN storage_locations loc ON loc.id = bx.location_id
                 LEFT JOIN manufacturers m ON m.id = s.manufacturer_id
                 LEFT JOIN types tp ON tp.id = s.type_id
                 WHERE s.id = ?1",
                [id],
                |row| {
                    Ok(SetDetails {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        manufacturer_id: row.get(2)?,
                        manufacturer_name: row.get(3)?,
                        type_id: row.get(4)?,
                        type_name: row.get(5)?,
                        photo_path: row.get(6)?,
                        photo_source: row.get(7)?,
                        bag: BagInfo {
                            id: row.get(8)?,
                            serial_no: row.get(9)?,
                            box_id: row.get(10)?,
                            box_code: row.get(11)?,
                            box_name: row.get(12)?,
                            location_id: row.get(13)?,
                            location_name: row.get(14)?,
                            location_room: row.get(15)?,
                            location_shelf: row.get(16)?,
                            location_compartment: row.get(17)?,
                            location_note: row.get(18)?,
                        },
                        tags: Vec::new(),
                        elements: Vec::new(),
                    })
                },
            )
            .optional()?
            .ok_or_else(|| Error::not_found("set", id))?;

        Ok(SetDetails {
            tags: self.tags_for_set(id)?,
            elements: self.list_elements(id)?,
            ..details
        })
    }
}

// Elements
impl Database {
    pub fn list_elements(&self, set: SetId) -> Result<Vec<Element>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, set_id, name, IFNULL(kind, '') FROM elements WHERE set_id = ?1 ORDER BY id",
        )?;
        let elements = stmt
            .query_map([set], |row| {
                let kind: String = row.get(3)?;
                Ok(Element {
                    id: row.get(0)?,
                    set_id: row.get(1)?,
                    name: row.get(2)?,
                    kind: kind.parse().ok(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(elements)
    }

    pub fn add_element(&self, set: SetId, name: &str, kind: Option<ElementKind>) -> Result<ElementId> {
        let name = required(name, "element name")?;
        ensure_valid(set.is_valid(), "set")?;
        self.conn.execute(
            "INSERT INTO elements (set_id, name, kind) VALUES (?1, ?2, ?3)",
            params![set, name, kind.map(ElementKind::as_str)],
        )?;
        Ok(ElementId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_element(&self, id: ElementId, name: &str, kind: Option<ElementKind>) -> Result<()> {
        let name = required(name, "element name")?;
        let changed = self.conn.execute(
            "UPDATE elements SET name = ?1, kind = ?2 WHERE id = ?3",
            params![name, kind.map(ElementKind::as_str), id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("element", id));
        }
        Ok(())
    }

    pub fn delete_element(&self, id: ElementId) -> Result<()> {
        self.conn.execute("DELETE FROM elements WHERE id = ?1", [id])?;
        Ok(())
    }
}

// Tags
impl Database {
    /// Replace the tags of a set. Names are lowercased; blanks are skipped.
    pub fn set_tags<S: AsRef<str>>(&self, set: SetId, names: &[S]) -> Result<()> {
        ensure_valid(set.is_valid(), "set")?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM set_tags WHERE set_id = ?1", [set])?;
        for name in names {
            if let Some(tag) = ensure_tag(&tx, name.as_ref())? {
                tx.execute(
                    "INSERT OR IGNORE INTO set_tags (set_id, tag_id) VALUES (?1, ?2)",
                    params![set, tag],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn tags_for_set(&self, set: SetId) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name FROM set_tags st
             JOIN tags t ON t.id = st.tag_id
             WHERE st.set_id = ?1
             ORDER BY t.name",
        )?;
        let tags = stmt
            .query_map([set], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tags)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    pub fn delete_tag(&self, id: TagId) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM set_tags WHERE tag_id = ?1", [id])?;
        tx.execute("DELETE FROM tags WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(())
    }
}

impl Database {
    pub fn stats(&self) -> Result<CatalogCounts> {
        let count = |table: &str| -> Result<u64> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(u64::try_from(n).unwrap_or(0))
        };
        Ok(CatalogCounts {
            sets: count("sets")?,
            elements: count("elements")?,
            boxes: count("boxes")?,
            locations: count("storage_locations")?,
            tags: count("tags")?,
        })
    }
}
