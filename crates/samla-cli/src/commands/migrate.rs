use anyhow::Result;
use samla_core::schema::migrations::{latest_version, MIGRATIONS};

use super::{print_json, Catalog};

/// Report the migration ledger. Opening the catalog already migrated it.
pub fn run_migrate(catalog: &Catalog) -> Result<()> {
    let applied = catalog.db.migrate()?;
    let ledger = catalog.db.ledger()?;

    println!("\n🗄  Schema migrations\n");
    println!("  Database: {}", catalog.paths.db_path.display());
    println!(
        "  Version:  {} (latest {})",
        catalog.db.schema_version()?,
        latest_version()
    );
    if applied > 0 {
        println!("  Applied now: {applied}");
    }
    println!();

    for migration in MIGRATIONS {
        let entry = ledger.iter().find(|m| m.version == migration.version);
        let when = match entry.and_then(|m| m.applied_at) {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
            None if entry.is_some() => "applied".to_string(),
            None => "pending".to_string(),
        };
        println!("  {:>3}  {:<20} {}", migration.version, migration.name, when);
    }

    Ok(())
}

pub fn show_status(catalog: &Catalog, json: bool) -> Result<()> {
    let counts = catalog.db.stats()?;
    let audit = catalog.assets.audit(&catalog.db)?;

    if json {
        return print_json(&serde_json::json!({
            "baseDir": catalog.paths.base_dir,
            "schemaVersion": catalog.db.schema_version()?,
            "counts": counts,
            "photos": audit,
        }));
    }

    println!("\n📦 Samla Status\n");
    println!("  Catalog:   {}", catalog.paths.base_dir.display());
    println!("  Schema:    v{}", catalog.db.schema_version()?);
    println!("  Locations: {}", counts.locations);
    println!("  Boxes:     {}", counts.boxes);
    println!("  Sets:      {}", counts.sets);
    println!("  Elements:  {}", counts.elements);
    println!("  Tags:      {}", counts.tags);
    println!(
        "  Photos:    {} file(s), {} referenced",
        audit.files, audit.referenced
    );

    if !audit.orphans.is_empty() {
        println!(
            "\n  {} unreferenced photo file(s); run `samla photo audit --prune` to remove them",
            audit.orphans.len()
        );
    }
    if !audit.dangling.is_empty() {
        println!(
            "\n  {} set(s) point at a missing photo; run `samla photo audit` for details",
            audit.dangling.len()
        );
    }

    Ok(())
}
