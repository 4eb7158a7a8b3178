use anyhow::{Context, Result};
use samla_assets::{AssetInput, AssetUpdate, AuditReport, Cleanup};
use samla_core::model::SetId;
use std::io::Read;
use serde::Serialize;
use std::path::PathBuf;

use super::{print_json, Catalog};

#[derive(Debug, clap::Subcommand)]
pub enum PhotoCommand {
    /// Copy a local image file into the catalog
    File { set: i64, path: PathBuf },
    /// Download an image over http(s)
    Url { set: i64, url: String },
    /// Save a base64 image (optionally a data: URL) read from a file or stdin
    Crop {
        set: i64,
        /// File holding the base64 text; "-" reads stdin
        input: String,
        /// Extension of the decoded image
        #[arg(long)]
        ext: Option<String>,
    },
    /// Reference a file a scanner already wrote into the Images directory
    Scan { set: i64, path: String },
    /// Remove the photo of a set
    Clear { set: i64 },
    /// Compare the Images directory with the catalog
    Audit {
        /// Delete files no set refers to
        #[arg(long)]
        prune: bool,
    },
}

fn read_base64(input: &str) -> Result<String> {
    if input == "-" {
        let mut data = String::new();
        std::io::stdin()
            .read_to_string(&mut data)
            .context("Failed to read image data from stdin")?;
        Ok(data)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}

pub fn run(catalog: &Catalog, command: PhotoCommand, json: bool) -> Result<()> {
    let (set, input) = match command {
        PhotoCommand::File { set, path } => (set, AssetInput::File(path)),
        PhotoCommand::Url { set, url } => (set, AssetInput::Url(url)),
        PhotoCommand::Crop { set, input, ext } => (
            set,
            AssetInput::Cropped {
                data: read_base64(&input)?,
                ext,
            },
        ),
        PhotoCommand::Scan { set, path } => (set, AssetInput::Scanned(path)),
        PhotoCommand::Clear { set } => {
            let cleanup = catalog.assets.clear_asset(&catalog.db, SetId::new(set))?;
            if json {
                return print_json(&cleanup);
            }
            println!("✓ Cleared photo of set {set}");
            report_cleanup(&cleanup);
            return Ok(());
        }
        PhotoCommand::Audit { prune } => return run_audit(catalog, prune, json),
    };

    let update = catalog
        .assets
        .set_asset(&catalog.db, SetId::new(set), input)
        .with_context(|| format!("Failed to attach photo to set {set}"))?;
    if json {
        return print_json(&update);
    }
    report_update(set, &update);
    Ok(())
}

fn report_update(set: i64, update: &AssetUpdate) {
    println!("✓ Set {set} photo: {} ({})", update.path, update.source);
    report_cleanup(&update.previous);
}

/// Mention cleanup outcomes the user may want to act on.
pub fn report_cleanup(cleanup: &Cleanup) {
    match cleanup {
        Cleanup::NotNeeded => {}
        Cleanup::Removed { path } => println!("  removed {path}"),
        Cleanup::Failed { path, reason } => {
            println!("  ⚠ could not remove {path}: {reason}");
        }
        Cleanup::Refused { path } => {
            println!("  ⚠ left {path} in place: it is outside the Images directory");
        }
        Cleanup::Shared { path } => println!("  kept {path}: another set still uses it"),
    }
}

/// Audit report as printed by `photo audit --prune --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PruneOutput<'a> {
    #[serde(flatten)]
    report: &'a AuditReport,
    removed: usize,
}

fn run_audit(catalog: &Catalog, prune: bool, json: bool) -> Result<()> {
    let report = catalog.assets.audit(&catalog.db)?;
    if json {
        if !prune {
            return print_json(&report);
        }
        let removed = catalog.assets.prune_orphans(&catalog.db)?;
        return print_json(&PruneOutput {
            report: &report,
            removed,
        });
    }

    println!("\n🖼  Photo audit\n");
    println!("  Images:     {}", catalog.paths.images_dir.display());
    println!("  Files:      {}", report.files);
    println!("  Referenced: {}", report.referenced);

    if !report.dangling.is_empty() {
        println!("\n  Sets pointing at a missing file:");
        for d in &report.dangling {
            println!("    set {:>5}  {}", d.set_id.get(), d.path);
        }
    }
    if !report.orphans.is_empty() {
        println!("\n  Files no set refers to:");
        for orphan in &report.orphans {
            println!("    {}", orphan.display());
        }
    }

    if prune {
        let removed = catalog.assets.prune_orphans(&catalog.db)?;
        println!("\n✓ Removed {removed} unreferenced file(s)");
    } else if report.is_consistent() {
        println!("\n✓ Catalog and Images directory agree");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_output_keeps_report_fields() {
        let report = AuditReport {
            files: 2,
            referenced: 1,
            orphans: vec![PathBuf::from("/catalog/Images/stray.png")],
            dangling: Vec::new(),
        };
        let value = serde_json::to_value(PruneOutput {
            report: &report,
            removed: 1,
        })
        .unwrap();
        assert_eq!(value["files"], 2);
        assert_eq!(value["referenced"], 1);
        assert_eq!(value["orphans"][0], "/catalog/Images/stray.png");
        assert_eq!(value["removed"], 1);
    }
}
