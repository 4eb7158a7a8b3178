use serde::{Deserialize, Serialize};

use crate::model::element::Element;
use crate::model::ids::{BagId, BoxId, LocationId, ManufacturerId, SetId, TypeId};

/// Where a set physically lives: its bag and the box and location above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagInfo {
    pub id: BagId,
    pub serial_no: String,
    pub box_id: BoxId,
    pub box_code: String,
    pub box_name: String,
    pub location_id: LocationId,
    pub location_name: String,
    pub location_room: String,
    pub location_shelf: String,
    pub location_compartment: String,
    pub location_note: String,
}

/// Full view of one item-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDetails {
    pub id: SetId,
    pub name: String,
    pub manufacturer_id: Option<ManufacturerId>,
    pub manufacturer_name: String,
    pub type_id: Option<TypeId>,
    pub type_name: String,
    pub bag: BagInfo,

    /// Path relative to the application base directory, empty when unset.
    pub photo_path: String,
    pub photo_source: String,

    pub tags: Vec<String>,
    pub elements: Vec<Element>,
}

/// Field values for creating a bag with its set, or for updating a set.
///
/// Manufacturer and type are given by name and created on demand; an empty
/// name leaves the reference unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSet {
    pub box_id: BoxId,
    pub bag_serial: String,
    pub name: String,
    pub manufacturer: String,
    pub set_type: String,
}

impl NewSet {
    #[must_use]
    pub fn new(box_id: BoxId, bag_serial: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            box_id,
            bag_serial: bag_serial.into(),
            name: name.into(),
            manufacturer: String::new(),
            set_type: String::new(),
        }
    }

    #[must_use]
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, set_type: impl Into<String>) -> Self {
        self.set_type = set_type.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_set_defaults() {
        let set = NewSet::new(BoxId::new(1), "0001", "Castle Set");
        assert_eq!(set.name, "Castle Set");
        assert!(set.manufacturer.is_empty());
        assert!(set.set_type.is_empty());
    }

    #[test]
    fn test_new_set_with_references() {
        let set = NewSet::new(BoxId::new(1), "0001", "Castle Set")
            .with_manufacturer("Acme")
            .with_type("Stamp kit");
        assert_eq!(set.manufacturer, "Acme");
        assert_eq!(set.set_type, "Stamp kit");
    }
}
