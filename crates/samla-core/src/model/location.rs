use serde::{Deserialize, Serialize};

use crate::model::ids::{BoxId, LocationId};

/// A place where boxes are stored (a room, a shelf, a cupboard).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,

    /// Unique display name.
    pub friendly_name: String,

    pub room: String,
    pub shelf: String,
    pub compartment: String,
    pub note: String,
}

/// Field values for creating or updating a location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLocation {
    pub friendly_name: String,
    pub room: String,
    pub shelf: String,
    pub compartment: String,
    pub note: String,
}

impl NewLocation {
    #[must_use]
    pub fn new(friendly_name: impl Into<String>) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    #[must_use]
    pub fn with_shelf(mut self, shelf: impl Into<String>) -> Self {
        self.shelf = shelf.into();
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// A storage box. Box codes are unique across the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBox {
    pub id: BoxId,
    pub location_id: LocationId,
    pub code: String,
    pub name: String,
}
