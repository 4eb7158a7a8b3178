//! Where a new photo comes from, and how its bytes and extension are derived.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use samla_core::photo::PhotoSource;

use crate::error::{AssetError, AssetResult};

/// Extension used when none can be derived.
pub const DEFAULT_EXTENSION: &str = ".png";

/// A photo to attach to a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetInput {
    /// Copy a local file.
    File(PathBuf),
    /// Download over http(s).
    Url(String),
    /// Base64 image data, optionally as a `data:` URL.
    Cropped { data: String, ext: Option<String> },
    /// Raw bytes already in memory.
    Bytes {
        bytes: Vec<u8>,
        ext: Option<String>,
        source: PhotoSource,
    },
    /// A file a scanner already placed inside the asset root.
    Scanned(String),
}

impl AssetInput {
    /// The provenance recorded for this input.
    #[must_use]
    pub fn source(&self) -> PhotoSource {
        match self {
            Self::File(_) => PhotoSource::File,
            Self::Url(_) => PhotoSource::Url,
            Self::Cropped { .. } => PhotoSource::Cropped,
            Self::Bytes { source, .. } => *source,
            Self::Scanned(_) => PhotoSource::Scan,
        }
    }

    /// Reject inputs that cannot possibly succeed, before any I/O.
    pub fn validate(&self) -> AssetResult<()> {
        match self {
            Self::File(path) => {
                if path.as_os_str().to_string_lossy().trim().is_empty() {
                    return Err(AssetError::Validation("file path is empty".to_string()));
                }
            }
            Self::Url(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Err(AssetError::Validation("url is required".to_string()));
                }
                let url = reqwest::Url::parse(raw)
                    .map_err(|e| AssetError::Validation(format!("invalid url '{raw}': {e}")))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(AssetError::Validation(format!(
                        "unsupported url scheme '{}'",
                        url.scheme()
                    )));
                }
            }
            Self::Cropped { data, .. } => {
                if strip_data_url(data).is_empty() {
                    return Err(AssetError::Validation("image data is empty".to_string()));
                }
            }
            Self::Bytes { bytes, .. } => {
                if bytes.is_empty() {
                    return Err(AssetError::Validation("image data is empty".to_string()));
                }
            }
            Self::Scanned(path) => {
                if path.trim().is_empty() {
                    return Err(AssetError::Validation("scan path is empty".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Normalise an extension to `.xyz` form.
///
/// Accepts it with or without the leading dot. Anything that is not 1 to 8
/// ASCII alphanumerics is rejected, which keeps separators and `..` out of
/// generated file names.
#[must_use]
pub fn sanitize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim().trim_start_matches('.');
    let valid = (1..=8).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| format!(".{}", ext.to_ascii_lowercase()))
}

/// Sanitised extension, or [`DEFAULT_EXTENSION`].
#[must_use]
pub fn extension_or_default(raw: Option<&str>) -> String {
    raw.and_then(sanitize_extension)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Extension of a file path, or [`DEFAULT_EXTENSION`].
#[must_use]
pub fn extension_from_path(path: &Path) -> String {
    extension_or_default(path.extension().and_then(|e| e.to_str()))
}

/// Map an HTTP `Content-Type` to an image extension.
#[must_use]
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("png") {
        Some(".png")
    } else if ct.contains("jpeg") || ct.contains("jpg") {
        Some(".jpg")
    } else if ct.contains("gif") {
        Some(".gif")
    } else if ct.contains("webp") {
        Some(".webp")
    } else {
        None
    }
}

/// Drop a `data:<mime>;base64,` header if present.
#[must_use]
pub fn strip_data_url(data: &str) -> &str {
    let data = data.trim();
    match data.split_once(',') {
        Some((_, payload)) => payload.trim(),
        None => data,
    }
}

/// Decode a cropped image payload.
pub fn decode_image_data(data: &str) -> AssetResult<Vec<u8>> {
    Ok(STANDARD.decode(strip_data_url(data))?)
}
