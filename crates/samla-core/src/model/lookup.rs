use serde::{Deserialize, Serialize};

use crate::model::ids::{ManufacturerId, TagId, TypeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
}

/// A user-defined classification of sets (kit, bundle, single, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetType {
    pub id: TypeId,
    pub name: String,
}

/// Tags are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Row counts across the catalog tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub sets: u64,
    pub elements: u64,
    pub boxes: u64,
    pub locations: u64,
    pub tags: u64,
}
