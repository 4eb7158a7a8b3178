//! Query compilation: a parsed filter and a sort key become one static SQL
//! string plus a single bound `LIKE` pattern.
//!
//! Every fragment of the generated SQL comes from a fixed table in this
//! module. User input only ever reaches SQLite as parameter `?1`.

use std::fmt;
use std::str::FromStr;

use log::debug;
use rusqlite::{params, Connection};
use serde::Serialize;

use samla_core::model::SetId;

use crate::error::{ParseSortKeyError, Result};
use crate::filter::{FilterKind, SearchFilter};

/// Hard cap on rows returned by the SQL stage.
pub const MAX_RESULTS: u32 = 200;

/// Unit separator; cannot appear in a tag typed at the keyboard.
const TAG_SEPARATOR: char = '\u{1f}';

const SELECT: &str = "SELECT s.id, s.name,
       IFNULL(m.name, ''), IFNULL(ty.name, ''),
       bx.code, IFNULL(bx.name, ''), b.serial_no,
       IFNULL(loc.friendly_name, ''),
       (SELECT GROUP_CONCAT(t2.name, char(31))
          FROM set_tags st2 JOIN tags t2 ON t2.id = st2.tag_id
         WHERE st2.set_id = s.id),
       IFNULL(s.photo_path, '')
  FROM sets s
  JOIN bags b ON b.id = s.bag_id
  JOIN boxes bx ON bx.id = b.box_id
  LEFT JOIN storage_locations loc ON loc.id = bx.location_id
  LEFT JOIN manufacturers m ON m.id = s.manufacturer_id
  LEFT JOIN types ty ON ty.id = s.type_id
  LEFT JOIN set_tags st ON st.set_id = s.id
  LEFT JOIN tags t ON t.id = st.tag_id";

const ELEMENTS_JOIN: &str = "\n  LEFT JOIN elements e ON e.set_id = s.id";

/// How results are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Box,
    Location,
    Added,
}

impl SortKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Box => "box",
            Self::Location => "location",
            Self::Added => "added",
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::Name => "s.name COLLATE NOCASE, s.id",
            Self::Box => "bx.code COLLATE NOCASE, b.serial_no, s.id",
            Self::Location => {
                "loc.friendly_name IS NULL, loc.friendly_name COLLATE NOCASE, \
                 bx.code COLLATE NOCASE, s.id"
            }
            Self::Added => "s.id DESC",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "box" => Ok(Self::Box),
            "location" => Ok(Self::Location),
            "added" => Ok(Self::Added),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}

/// One row of a search: a set with enough context to display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub set_id: SetId,
    pub set_name: String,
    pub manufacturer_name: String,
    pub type_name: String,
    pub box_code: String,
    pub box_name: String,
    pub bag_serial: String,
    pub location_name: String,
    pub tags: Vec<String>,
    pub thumbnail_path: String,
}

/// SQL ready to run, plus the pattern to bind as `?1` when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub sql: String,
    pub pattern: Option<String>,
}

/// Columns a filter kind searches in.
fn predicate_columns(kind: FilterKind) -> &'static [&'static str] {
    match kind {
        FilterKind::None => &[
            "s.name",
            "t.name",
            "e.name",
            "bx.code",
            "bx.name",
            "b.serial_no",
            "loc.friendly_name",
            "m.name",
        ],
        FilterKind::Box => &["bx.code", "bx.name"],
        FilterKind::Product => &["e.name"],
        FilterKind::Manufacturer => &["m.name"],
        FilterKind::Tag => &["t.name"],
        FilterKind::Location => &["loc.friendly_name", "loc.room"],
    }
}

fn needs_elements(kind: FilterKind) -> bool {
    matches!(kind, FilterKind::None | FilterKind::Product)
}

/// Escape `LIKE` metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Turn a filter and sort key into SQL.
#[must_use]
pub fn compile(filter: &SearchFilter, sort: SortKey) -> CompiledQuery {
    let mut sql = String::from(SELECT);
    let mut pattern = None;

    if !filter.term.is_empty() {
        if needs_elements(filter.kind) {
            sql.push_str(ELEMENTS_JOIN);
        }
        let clauses: Vec<String> = predicate_columns(filter.kind)
            .iter()
            .map(|col| format!("LOWER({col}) LIKE ?1 ESCAPE '\\'"))
            .collect();
        sql.push_str("\n WHERE ");
        sql.push_str(&clauses.join("\n    OR "));
        pattern = Some(format!("%{}%", escape_like(&filter.term.to_lowercase())));
    }

    sql.push_str("\n GROUP BY s.id\n ORDER BY ");
    sql.push_str(sort.order_by());
    sql.push_str(if pattern.is_some() {
        "\n LIMIT ?2"
    } else {
        "\n LIMIT ?1"
    });

    CompiledQuery { sql, pattern }
}

fn split_tags(raw: Option<String>) -> Vec<String> {
    let mut tags: Vec<String> = raw
        .unwrap_or_default()
        .split(TAG_SEPARATOR)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tags.sort_by_key(|t| t.to_lowercase());
    tags
}

/// Execute a compiled query.
pub fn run(conn: &Connection, query: &CompiledQuery) -> Result<Vec<SearchResult>> {
    debug!("search sql: {}", query.sql);
    let mut stmt = conn.prepare(&query.sql)?;

    let map_row = |row: &rusqlite::Row<'_>| {
        Ok(SearchResult {
            set_id: row.get(0)?,
            set_name: row.get(1)?,
            manufacturer_name: row.get(2)?,
            type_name: row.get(3)?,
            box_code: row.get(4)?,
            box_name: row.get(5)?,
            bag_serial: row.get(6)?,
            location_name: row.get(7)?,
            tags: split_tags(row.get(8)?),
            thumbnail_path: row.get(9)?,
        })
    };

    let rows = match &query.pattern {
        Some(pattern) => stmt
            .query_map(params![pattern, MAX_RESULTS], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt
            .query_map(params![MAX_RESULTS], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };
    debug!("search returned {} candidate(s)", rows.len());
    Ok(rows)
}
