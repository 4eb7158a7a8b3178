//! Blocking photo downloads.

use std::path::Path;
use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use crate::error::{AssetError, AssetResult};
use crate::source::{extension_from_content_type, sanitize_extension, DEFAULT_EXTENSION};

/// HTTP client for URL attachments.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: Client,
}

/// A successful response whose body has not been read yet.
#[derive(Debug)]
pub struct Download {
    pub response: Response,
    pub extension: String,
}

impl Downloader {
    /// Create a client that gives up after `timeout`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> AssetResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("samla/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AssetError::Request)?;

        Ok(Self { http })
    }

    /// Start a download. Only 2xx responses are returned; nothing is
    /// written to disk here.
    ///
    /// # Errors
    /// Returns `Timeout`, `HttpStatus` or `Request` on failure.
    pub fn fetch(&self, raw_url: &str) -> AssetResult<Download> {
        let url = Url::parse(raw_url.trim())
            .map_err(|e| AssetError::Validation(format!("invalid url '{raw_url}': {e}")))?;

        debug!("downloading {url}");
        let response = self.http.get(url.clone()).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let extension = extension_for(&url, &response);
        Ok(Download {
            response,
            extension,
        })
    }
}

/// The URL path's extension wins; the Content-Type is the fallback.
fn extension_for(url: &Url, response: &Response) -> String {
    let from_path = Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .and_then(sanitize_extension);
    if let Some(ext) = from_path {
        return ext;
    }

    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(extension_from_content_type)
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string()
}
