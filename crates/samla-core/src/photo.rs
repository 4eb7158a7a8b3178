use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Where a set's photo came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSource {
    /// Copied from a local file.
    File,
    /// Downloaded from a URL.
    Url,
    /// Saved from an in-app crop (base64 payload).
    Cropped,
    /// Produced by a scanner directly inside the asset root.
    Scan,
}

impl PhotoSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
            Self::Cropped => "cropped",
            Self::Scan => "scan",
        }
    }
}

impl fmt::Display for PhotoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            "cropped" => Ok(Self::Cropped),
            "scan" => Ok(Self::Scan),
            other => Err(Error::InvalidData(format!("unknown photo source: {other}"))),
        }
    }
}

/// The photo columns of a set row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoReference {
    /// Relative to the application base directory (e.g. `Images/<uuid>.png`).
    pub path: String,
    pub source: PhotoSource,
}

impl PhotoReference {
    #[must_use]
    pub fn new(path: impl Into<String>, source: PhotoSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
