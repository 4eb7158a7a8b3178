//! Consistency check between the asset root and the catalog.

use std::collections::HashSet;
use std::path::PathBuf;

use log::{info, warn};
use samla_core::model::SetId;
use samla_core::Database;
use serde::Serialize;
use walkdir::WalkDir;

use crate::coordinator::{normalize, AssetStore};
use crate::error::AssetResult;

/// A set whose stored photo path has no file behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub set_id: SetId,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Files found under the asset root.
    pub files: usize,
    /// Sets with a non-empty photo path.
    pub referenced: usize,
    /// Files under the asset root that no set references.
    pub orphans: Vec<PathBuf>,
    pub dangling: Vec<DanglingReference>,
}

impl AuditReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.orphans.is_empty() && self.dangling.is_empty()
    }
}

impl AssetStore {
    /// Compare the files under the asset root with the stored references.
    pub fn audit(&self, db: &Database) -> AssetResult<AuditReport> {
        let references = db.photo_paths()?;
        let mut report = AuditReport {
            referenced: references.len(),
            ..AuditReport::default()
        };

        let mut wanted = HashSet::with_capacity(references.len());
        for (set_id, path) in references {
            let resolved = self.resolve(&path);
            if !resolved.is_file() {
                report.dangling.push(DanglingReference { set_id, path });
            }
            wanted.insert(resolved);
        }

        let root = self.images_root();
        if root.is_dir() {
            for entry in WalkDir::new(&root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                report.files += 1;
                let path = normalize(entry.path());
                if !wanted.contains(&path) {
                    report.orphans.push(path);
                }
            }
        }

        info!(
            "audit: {} file(s), {} reference(s), {} orphan(s), {} dangling",
            report.files,
            report.referenced,
            report.orphans.len(),
            report.dangling.len()
        );
        Ok(report)
    }

    /// Delete every orphaned file. Returns how many were removed.
    pub fn prune_orphans(&self, db: &Database) -> AssetResult<usize> {
        let report = self.audit(db)?;
        let mut removed = 0;
        for orphan in &report.orphans {
            match self.remove_asset_file(orphan) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => warn!("could not prune {}: {err}", orphan.display()),
            }
        }
        info!("pruned {removed} orphaned photo(s)");
        Ok(removed)
    }
}
