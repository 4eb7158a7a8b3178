//! Keeps a set's photo file and its `photo_path` row in step.
//!
//! The file system and the database cannot share a transaction, so every
//! change follows the same order: write the new file under a fresh name,
//! commit the row, then delete whatever the row pointed at before. A crash
//! at any point leaves at worst an unreferenced file, never a row that
//! points at nothing.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};
use samla_core::model::{BoxId, LocationId, SetId};
use samla_core::paths::IMAGES_DIR_NAME;
use samla_core::photo::{PhotoReference, PhotoSource};
use samla_core::{AppPaths, Database};
use serde::Serialize;
use uuid::Uuid;

use crate::config::DEFAULT_DOWNLOAD_TIMEOUT_SECS;
use crate::error::{AssetError, AssetResult};
use crate::fetch::Downloader;
use crate::source::{decode_image_data, extension_from_path, extension_or_default, AssetInput};

/// Outcome of removing a file that is no longer referenced.
///
/// Cleanup runs after the database commit, so none of these is an error
/// for the caller: the row is already correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Cleanup {
    /// There was no previous file, or it was already gone.
    NotNeeded,
    Removed { path: String },
    /// Deleting failed; the file is left behind as an orphan.
    Failed { path: String, reason: String },
    /// The path resolved outside the asset root and was not touched.
    Refused { path: String },
    /// Another set still references the file, so it was kept.
    Shared { path: String },
}

impl Cleanup {
    /// True unless a file was left behind.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            Self::NotNeeded | Self::Removed { .. } | Self::Shared { .. }
        )
    }
}

/// Result of a successful [`AssetStore::set_asset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdate {
    /// Stored path, relative to the base directory.
    pub path: String,
    pub source: PhotoSource,
    pub previous: Cleanup,
}

/// A file written for an update that has not been committed yet.
struct FreshFile {
    absolute: PathBuf,
    relative: String,
}

/// Coordinates photo files under `<base>/Images` with the catalog rows.
#[derive(Debug, Clone)]
pub struct AssetStore {
    paths: AppPaths,
    timeout: Duration,
}

impl AssetStore {
    #[must_use]
    pub fn new(paths: AppPaths) -> Self {
        Self {
            paths,
            timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Attach a new photo to `set`, replacing and removing any previous one.
    ///
    /// # Errors
    /// Fails without touching the row if the input is invalid or the new
    /// bytes cannot be written. If the row update fails, the new file is
    /// removed again. Problems deleting the previous file are reported in
    /// [`AssetUpdate::previous`], not as an error.
    pub fn set_asset(
        &self,
        db: &Database,
        set: SetId,
        input: AssetInput,
    ) -> AssetResult<AssetUpdate> {
        require_set(set)?;
        input.validate()?;
        let source = input.source();

        let (relative, fresh) = self.materialize(input)?;
        let reference = PhotoReference::new(relative.clone(), source);

        let previous = match db.replace_photo(set, &reference) {
            Ok(previous) => previous,
            Err(err) => {
                if let Some(path) = fresh {
                    discard(&path);
                }
                return Err(err.into());
            }
        };
        info!("set {set} photo is now {relative} ({source})");

        let previous = match previous {
            Some(old) if old != relative => self.release(db, &old),
            _ => Cleanup::NotNeeded,
        };

        Ok(AssetUpdate {
            path: relative,
            source,
            previous,
        })
    }

    /// Remove the photo of `set`: the row first, then the file.
    pub fn clear_asset(&self, db: &Database, set: SetId) -> AssetResult<Cleanup> {
        require_set(set)?;
        let previous = db.clear_photo(set)?;
        info!("set {set} photo cleared");
        Ok(self.cleanup_all(db, previous))
    }

    /// Delete `set` and its bag, then its photo.
    pub fn delete_set(&self, db: &Database, set: SetId) -> AssetResult<Cleanup> {
        require_set(set)?;
        let previous = db.delete_set(set)?;
        info!("set {set} deleted");
        Ok(self.cleanup_all(db, previous))
    }

    /// Delete a box with everything in it, then the photos of its sets.
    pub fn delete_box(&self, db: &Database, id: BoxId) -> AssetResult<Vec<Cleanup>> {
        let released = db.delete_box(id)?;
        info!("box {id} deleted, {} photo(s) released", released.len());
        Ok(released
            .iter()
            .map(|path| self.release(db, path))
            .collect())
    }

    /// Delete a location with everything in it, then the photos of its sets.
    pub fn delete_location(&self, db: &Database, id: LocationId) -> AssetResult<Vec<Cleanup>> {
        let released = db.delete_location(id)?;
        info!("location {id} deleted, {} photo(s) released", released.len());
        Ok(released
            .iter()
            .map(|path| self.release(db, path))
            .collect())
    }

    /// Delete one stored photo file.
    ///
    /// `stored` is either absolute or relative to the base directory. The
    /// target must lie strictly below the asset root after lexical
    /// normalisation, and its directory must still be inside the root once
    /// symlinks are resolved. Returns `false` if the file was already gone.
    ///
    /// # Errors
    /// `OutsideRoot` for targets outside the asset root; `Io` if removal
    /// fails for any reason other than the file being missing.
    pub fn remove_asset_file(&self, stored: impl AsRef<Path>) -> AssetResult<bool> {
        let stored = stored.as_ref();
        if stored.as_os_str().is_empty() {
            return Ok(false);
        }

        let target = self.resolve_inside_root(stored)?;
        let Some(target) = self.physical_target(&target)? else {
            return Ok(false);
        };
        match fs::remove_file(&target) {
            Ok(()) => {
                debug!("removed {}", target.display());
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Absolute, normalised location of a stored path.
    #[must_use]
    pub fn resolve(&self, stored: impl AsRef<Path>) -> PathBuf {
        let stored = stored.as_ref();
        if stored.is_absolute() {
            normalize(stored)
        } else {
            normalize(&self.paths.base_dir.join(stored))
        }
    }

    pub(crate) fn images_root(&self) -> PathBuf {
        normalize(&self.paths.images_dir)
    }

    fn resolve_inside_root(&self, stored: &Path) -> AssetResult<PathBuf> {
        let target = self.resolve(stored);
        let root = self.images_root();
        if target != root && target.starts_with(&root) {
            Ok(target)
        } else {
            Err(AssetError::OutsideRoot { path: target })
        }
    }

    /// Re-check a lexically valid target with its directory canonicalised,
    /// so a symlinked directory under the root cannot lead outside it.
    /// `None` when the directory does not exist.
    fn physical_target(&self, target: &Path) -> AssetResult<Option<PathBuf>> {
        let (Some(parent), Some(name)) = (target.parent(), target.file_name()) else {
            return Err(AssetError::OutsideRoot {
                path: target.to_path_buf(),
            });
        };
        let parent = match fs::canonicalize(parent) {
            Ok(parent) => parent,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let root = fs::canonicalize(&self.paths.images_dir)?;
        let physical = parent.join(name);
        if parent.starts_with(&root) {
            Ok(Some(physical))
        } else {
            Err(AssetError::OutsideRoot { path: physical })
        }
    }

    /// Remove a file a committed row no longer points at, unless another
    /// set still does.
    fn release(&self, db: &Database, stored: &str) -> Cleanup {
        match db.photo_in_use(stored) {
            Ok(false) => self.remove_best_effort(stored),
            Ok(true) => {
                info!("keeping {stored}: another set still uses it");
                Cleanup::Shared {
                    path: stored.to_string(),
                }
            }
            Err(err) => {
                warn!("could not check whether {stored} is still used: {err}");
                Cleanup::Failed {
                    path: stored.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn remove_best_effort(&self, stored: &str) -> Cleanup {
        match self.remove_asset_file(stored) {
            Ok(true) => Cleanup::Removed {
                path: stored.to_string(),
            },
            Ok(false) => {
                debug!("previous photo {stored} was already gone");
                Cleanup::NotNeeded
            }
            Err(AssetError::OutsideRoot { path }) => {
                error!(
                    "refusing to delete {} outside {}",
                    path.display(),
                    self.paths.images_dir.display()
                );
                Cleanup::Refused {
                    path: stored.to_string(),
                }
            }
            Err(err) => {
                warn!("could not delete previous photo {stored}: {err}");
                Cleanup::Failed {
                    path: stored.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn cleanup_all(&self, db: &Database, previous: Option<String>) -> Cleanup {
        previous.map_or(Cleanup::NotNeeded, |path| self.release(db, &path))
    }

    /// Produce the bytes of `input` under the asset root.
    ///
    /// Returns the relative path to store, plus the absolute path of a
    /// newly written file (scans reference an existing file and write none).
    fn materialize(&self, input: AssetInput) -> AssetResult<(String, Option<PathBuf>)> {
        let fresh = match input {
            AssetInput::File(path) => {
                let path = PathBuf::from(path.to_string_lossy().trim());
                let mut src = File::open(&path).map_err(|err| match err.kind() {
                    io::ErrorKind::NotFound => AssetError::MissingFile { path: path.clone() },
                    _ => err.into(),
                })?;
                self.write_fresh(&extension_from_path(&path), |dst| {
                    io::copy(&mut src, dst).map(|_| ())
                })?
            }
            AssetInput::Url(url) => {
                let mut download = Downloader::new(self.timeout)?.fetch(&url)?;
                self.write_fresh(&download.extension, |dst| {
                    io::copy(&mut download.response, dst).map(|_| ())
                })
                .map_err(|err| err.into_download_error(&url))?
            }
            AssetInput::Cropped { data, ext } => {
                let bytes = decode_image_data(&data)?;
                self.write_fresh(&extension_or_default(ext.as_deref()), |dst| {
                    dst.write_all(&bytes)
                })?
            }
            AssetInput::Bytes { bytes, ext, .. } => {
                self.write_fresh(&extension_or_default(ext.as_deref()), |dst| {
                    dst.write_all(&bytes)
                })?
            }
            AssetInput::Scanned(path) => return self.scanned_reference(&path).map(|r| (r, None)),
        };
        Ok((fresh.relative, Some(fresh.absolute)))
    }

    /// Write a new file under a name that cannot collide with any other.
    ///
    /// On failure the partial file is removed before the error is returned.
    fn write_fresh<F>(&self, extension: &str, fill: F) -> AssetResult<FreshFile>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        fs::create_dir_all(&self.paths.images_dir)?;
        let file_name = format!("{}{extension}", Uuid::new_v4());
        let absolute = self.paths.images_dir.join(&file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&absolute)?;
        let written = fill(&mut file).and_then(|()| file.sync_all());
        drop(file);

        if let Err(err) = written {
            discard(&absolute);
            return Err(err.into());
        }

        debug!("wrote {}", absolute.display());
        Ok(FreshFile {
            absolute,
            relative: format!("{IMAGES_DIR_NAME}/{file_name}"),
        })
    }

    /// Reference an existing file inside the asset root without copying it.
    fn scanned_reference(&self, stored: &str) -> AssetResult<String> {
        let target = self.resolve_inside_root(Path::new(stored.trim()))?;
        if !target.is_file() {
            return Err(AssetError::MissingFile { path: target });
        }

        let base = normalize(&self.paths.base_dir);
        let relative = target
            .strip_prefix(&base)
            .map_err(|_| AssetError::OutsideRoot {
                path: target.clone(),
            })?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Ok(parts.join("/"))
    }
}

fn require_set(set: SetId) -> AssetResult<()> {
    if set.is_valid() {
        Ok(())
    } else {
        Err(AssetError::Validation("set is required".to_string()))
    }
}

/// Remove a file that was written but never referenced.
fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!("could not remove unreferenced {}: {err}", path.display());
        }
    }
}

/// Resolve `.` and `..` without touching the file system.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}
