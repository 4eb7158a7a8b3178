//! Catalog search for samla.
//!
//! A search runs as a two-stage pipeline: the raw query is parsed into a
//! [`SearchFilter`], compiled into one parameterized SQL statement over the
//! fixed catalog join and executed, and then, for plain free-text queries
//! only, the candidates are re-filtered client-side with an ordered
//! subsequence match.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod compile;
pub mod error;
pub mod filter;
pub mod fuzzy;

use samla_core::Database;

pub use compile::{compile, run, CompiledQuery, SearchResult, SortKey, MAX_RESULTS};
pub use error::{ParseSortKeyError, Result, SearchError};
pub use filter::{FilterKind, SearchFilter};
pub use fuzzy::{fuzzy_match, refine, subsequence_match};

/// Search the catalog.
///
/// Structured `@prefix` filters and an empty query return the SQL stage as
/// is; free text additionally goes through [`refine`].
pub fn search(db: &Database, raw_query: &str, sort: SortKey) -> Result<Vec<SearchResult>> {
    let filter = SearchFilter::parse(raw_query);
    let candidates = run(db.conn(), &compile(&filter, sort))?;

    if filter.is_free_text() {
        Ok(refine(candidates, &filter.term))
    } else {
        Ok(candidates)
    }
}
