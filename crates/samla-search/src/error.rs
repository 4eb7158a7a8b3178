use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// An unrecognised sort key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key '{0}' (expected one of: name, box, location, added)")]
pub struct ParseSortKeyError(pub String);

pub type Result<T> = std::result::Result<T, SearchError>;
