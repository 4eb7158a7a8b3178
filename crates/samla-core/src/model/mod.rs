pub mod element;
pub mod ids;
pub mod item_set;
pub mod location;
pub mod lookup;

pub use element::{Element, ElementKind};
pub use ids::{BagId, BoxId, ElementId, LocationId, ManufacturerId, SetId, TagId, TypeId};
pub use item_set::{BagInfo, NewSet, SetDetails};
pub use location::{Location, NewLocation, StorageBox};
pub use lookup::{CatalogCounts, Manufacturer, SetType, Tag};
