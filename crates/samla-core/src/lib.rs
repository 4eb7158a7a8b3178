//! Core catalog model for samla.
//!
//! This crate defines the inventory containment model (Location, Box, Bag,
//! Item-set, Element, Tag), the SQLite schema with its forward-only
//! migration ledger, and the catalog store operations built on top of it.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod paths;
pub mod photo;
pub mod schema;

pub use error::{Error, Result};
pub use paths::AppPaths;
pub use schema::Database;
