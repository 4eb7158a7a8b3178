//! Location, box, set and element subcommands.

use anyhow::{bail, Result};
use samla_core::model::{
    ElementKind, LocationId, NewLocation, NewSet, SetDetails, SetId, StorageBox,
};
use samla_core::Database;

use super::{print_json, Catalog};
use crate::commands::photo::report_cleanup;

#[derive(Debug, clap::Subcommand)]
pub enum LocationCommand {
    /// Add a storage location
    Add {
        /// Unique display name
        name: String,
        #[arg(long, default_value = "")]
        room: String,
        #[arg(long, default_value = "")]
        shelf: String,
        #[arg(long, default_value = "")]
        compartment: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// List locations
    List,
    /// Remove a location with all its boxes, sets and photos
    Remove { id: i64 },
}

#[derive(Debug, clap::Subcommand)]
pub enum BoxCommand {
    /// Add a box to a location
    Add {
        /// Location id
        location: i64,
        /// Unique box code, e.g. B1
        code: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// List boxes
    List {
        /// Only boxes in this location
        #[arg(long)]
        location: Option<i64>,
    },
    /// Remove a box with all its sets and photos
    Remove { code: String },
}

#[derive(Debug, clap::Subcommand)]
pub enum SetCommand {
    /// Put a new set into a new bag in a box
    Add {
        /// Box code
        #[arg(long = "box")]
        box_code: String,
        name: String,
        /// Bag serial (default: next free number in the box)
        #[arg(long)]
        serial: Option<String>,
        #[arg(long, default_value = "")]
        manufacturer: String,
        #[arg(long = "type", default_value = "")]
        set_type: String,
        /// Tag to attach; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show one set with its bag, box, location, tags and elements
    Show { id: i64 },
    /// Remove a set, its bag and its photo
    Remove { id: i64 },
    /// Replace the tags of a set
    Tag { id: i64, tags: Vec<String> },
}

#[derive(Debug, clap::Subcommand)]
pub enum ElementCommand {
    /// Add an element to a set
    Add {
        set: i64,
        name: String,
        /// stempel or stanze
        #[arg(long)]
        kind: Option<ElementKind>,
    },
}

fn find_box(db: &Database, code: &str) -> Result<StorageBox> {
    let code = code.trim();
    db.list_boxes(None)?
        .into_iter()
        .find(|b| b.code.eq_ignore_ascii_case(code))
        .ok_or_else(|| anyhow::anyhow!("No box with code '{code}'"))
}

pub fn run_location(catalog: &Catalog, command: LocationCommand, json: bool) -> Result<()> {
    let db = &catalog.db;
    match command {
        LocationCommand::Add {
            name,
            room,
            shelf,
            compartment,
            note,
        } => {
            let location = NewLocation {
                friendly_name: name,
                room,
                shelf,
                compartment,
                note,
            };
            let id = db.create_location(&location)?;
            println!("✓ Added location {id}: {}", location.friendly_name.trim());
        }
        LocationCommand::List => {
            let locations = db.list_locations()?;
            if json {
                return print_json(&locations);
            }
            for loc in &locations {
                let place: Vec<&str> = [&loc.room, &loc.shelf, &loc.compartment]
                    .into_iter()
                    .map(String::as_str)
                    .filter(|s| !s.is_empty())
                    .collect();
                println!("{:>4}  {:<24} {}", loc.id.get(), loc.friendly_name, place.join(" / "));
            }
        }
        LocationCommand::Remove { id } => {
            let cleanups = catalog.assets.delete_location(db, LocationId::new(id))?;
            println!("✓ Removed location {id}");
            cleanups.iter().for_each(report_cleanup);
        }
    }
    Ok(())
}

pub fn run_box(catalog: &Catalog, command: BoxCommand, json: bool) -> Result<()> {
    let db = &catalog.db;
    match command {
        BoxCommand::Add {
            location,
            code,
            name,
        } => {
            let id = db.create_box(LocationId::new(location), &code, &name)?;
            println!("✓ Added box {} (id {id})", code.trim());
        }
        BoxCommand::List { location } => {
            let boxes = db.list_boxes(location.map(LocationId::new))?;
            if json {
                return print_json(&boxes);
            }
            for b in &boxes {
                println!("{:<8} {:<24} location {}", b.code, b.name, b.location_id);
            }
        }
        BoxCommand::Remove { code } => {
            let found = find_box(db, &code)?;
            let cleanups = catalog.assets.delete_box(db, found.id)?;
            println!("✓ Removed box {}", found.code);
            cleanups.iter().for_each(report_cleanup);
        }
    }
    Ok(())
}

pub fn run_set(catalog: &Catalog, command: SetCommand, json: bool) -> Result<()> {
    let db = &catalog.db;
    match command {
        SetCommand::Add {
            box_code,
            name,
            serial,
            manufacturer,
            set_type,
            tags,
        } => {
            let found = find_box(db, &box_code)?;
            let serial = match serial {
                Some(serial) => serial,
                None => db.next_bag_serial(found.id)?,
            };
            let new_set = NewSet::new(found.id, serial, name)
                .with_manufacturer(manufacturer)
                .with_type(set_type);
            let id = db.create_bag_with_set(&new_set)?;
            if !tags.is_empty() {
                db.set_tags(id, tags.as_slice())?;
            }
            println!(
                "✓ Added set {id} in {}/{}",
                found.code,
                new_set.bag_serial.trim()
            );
        }
        SetCommand::Show { id } => {
            let details = db.get_set(SetId::new(id))?;
            if json {
                return print_json(&details);
            }
            print_set(&details);
        }
        SetCommand::Remove { id } => {
            let cleanup = catalog.assets.delete_set(db, SetId::new(id))?;
            println!("✓ Removed set {id}");
            report_cleanup(&cleanup);
        }
        SetCommand::Tag { id, tags } => {
            let set = SetId::new(id);
            db.set_tags(set, tags.as_slice())?;
            let stored = db.tags_for_set(set)?;
            println!("✓ Set {id} tags: {}", stored.join(", "));
        }
    }
    Ok(())
}

pub fn run_element(catalog: &Catalog, command: ElementCommand) -> Result<()> {
    match command {
        ElementCommand::Add { set, name, kind } => {
            let set = SetId::new(set);
            if !catalog.db.set_exists(set)? {
                bail!("No set with id {set}");
            }
            let id = catalog.db.add_element(set, &name, kind)?;
            println!("✓ Added element {id} to set {set}");
        }
    }
    Ok(())
}

fn print_set(set: &SetDetails) {
    let bag = &set.bag;
    println!("\n{} (#{})\n", set.name, set.id);
    println!("  Location:     {}", bag.location_name);
    if !bag.location_room.is_empty() {
        println!("  Room:         {}", bag.location_room);
    }
    println!("  Box:          {} {}", bag.box_code, bag.box_name);
    println!("  Bag:          {}", bag.serial_no);
    if !set.manufacturer_name.is_empty() {
        println!("  Manufacturer: {}", set.manufacturer_name);
    }
    if !set.type_name.is_empty() {
        println!("  Type:         {}", set.type_name);
    }
    if !set.photo_path.is_empty() {
        println!("  Photo:        {} ({})", set.photo_path, set.photo_source);
    }
    if !set.tags.is_empty() {
        println!("  Tags:         {}", set.tags.join(", "));
    }
    if !set.elements.is_empty() {
        println!("  Elements:");
        for element in &set.elements {
            match element.kind {
                Some(kind) => println!("    - {} [{}]", element.name, kind.as_str()),
                None => println!("    - {}", element.name),
            }
        }
    }
}
