//! Error types for photo attachment and cleanup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while attaching, replacing or removing a photo.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The request was rejected before any I/O happened.
    #[error("invalid input: {0}")]
    Validation(String),

    /// An error propagated from the catalog store.
    #[error("catalog error: {0}")]
    Core(#[from] samla_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),

    /// The download did not finish within the configured timeout.
    #[error("timed out downloading {url}")]
    Timeout { url: String },

    /// The server answered with a non-2xx status.
    #[error("failed to download {url} (status {status})")]
    HttpStatus { url: String, status: u16 },

    /// A cropped image payload was not valid base64.
    #[error("unable to decode image: {0}")]
    Decode(#[from] base64::DecodeError),

    /// A deletion target resolved to somewhere outside the asset root.
    #[error("refusing to delete outside the images directory: {}", path.display())]
    OutsideRoot { path: PathBuf },

    /// A file that should exist does not.
    #[error("file not found: {}", path.display())]
    MissingFile { path: PathBuf },
}

impl AssetError {
    /// Returns `true` when the error is transient and the operation may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::HttpStatus { .. } => true,
            Self::Request(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` for errors raised before any I/O took place.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Reclassify a failure while streaming the body of `url`.
    ///
    /// The client timeout also covers reading the body, and that expiry
    /// surfaces through `io::copy` as a plain I/O error.
    pub(crate) fn into_download_error(self, url: &str) -> Self {
        match self {
            Self::Io(err) if is_timeout(&err) => Self::Timeout {
                url: url.to_string(),
            },
            other => other,
        }
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::TimedOut {
        return true;
    }
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
        .is_some_and(reqwest::Error::is_timeout)
}

impl From<reqwest::Error> for AssetError {
    fn from(err: reqwest::Error) -> Self {
        match err.url() {
            Some(url) if err.is_timeout() => Self::Timeout {
                url: url.to_string(),
            },
            _ => Self::Request(err),
        }
    }
}

/// Convenience alias for asset results.
pub type AssetResult<T> = std::result::Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let status = |status| AssetError::HttpStatus {
            url: "http://example.test/a.png".to_string(),
            status,
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(status(404).is_transient());
        assert!(AssetError::Timeout {
            url: "http://example.test".to_string()
        }
        .is_transient());
        assert!(!AssetError::Validation("x".to_string()).is_transient());
    }

    #[test]
    fn test_body_timeout_becomes_timeout() {
        let url = "http://example.test/a.png";
        let stalled = AssetError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "read timed out",
        ));
        let err = stalled.into_download_error(url);
        assert!(matches!(&err, AssetError::Timeout { url: u } if u == url));
        assert!(err.is_transient());

        let other = AssetError::Io(std::io::Error::other("disk full")).into_download_error(url);
        assert!(matches!(other, AssetError::Io(_)));
    }

    #[test]
    fn test_outside_root_message() {
        let err = AssetError::OutsideRoot {
            path: PathBuf::from("/etc/passwd"),
        };
        assert!(err.to_string().contains("/etc/passwd"));
    }
}
