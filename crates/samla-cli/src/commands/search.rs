use anyhow::Result;
use samla_search::{search, SortKey};

use super::{print_json, Catalog};

pub fn run_search(catalog: &Catalog, query: &str, sort: SortKey, json: bool) -> Result<()> {
    let results = search(&catalog.db, query, sort)?;

    if json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No sets match '{}'", query.trim());
        return Ok(());
    }

    for r in &results {
        let location = if r.location_name.is_empty() {
            "-"
        } else {
            r.location_name.as_str()
        };
        println!(
            "{:>5}  {:<32} {}/{}  @ {}",
            r.set_id.get(), r.set_name, r.box_code, r.bag_serial, location
        );
        if !r.manufacturer_name.is_empty() {
            println!("       by {}", r.manufacturer_name);
        }
        if !r.tags.is_empty() {
            println!("       #{}", r.tags.join(" #"));
        }
    }
    println!("\n{} set(s), sorted by {sort}", results.len());

    Ok(())
}
