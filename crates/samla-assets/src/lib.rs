//! Photo lifecycle and configuration for samla.
//!
//! A set's photo lives in two places that cannot be updated atomically: a
//! file under `<base>/Images` and the `photo_path` column of its row.
//! [`AssetStore`] orders every change so the row never points at a file
//! that does not exist.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod audit;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod source;

pub use audit::{AuditReport, DanglingReference};
pub use config::Config;
pub use coordinator::{AssetStore, AssetUpdate, Cleanup};
pub use error::{AssetError, AssetResult};
pub use fetch::Downloader;
pub use source::AssetInput;
