// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resumable ranged downloads

mod file;
mod web;

pub use self::file::FileRangeFetcher;
pub use self::web::UreqFetcher;

use std::io::{self, Read};
use thiserror::Error;

/// Errors from ranged fetches
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{url}: not found")]
    NotFound { url: String },
    #[error("{url}: authentication failed (HTTP {status})")]
    Auth { url: String, status: u16 },
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("{url}: unexpected HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("{url}: {source}")]
    Io {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("{url}: {message}")]
    Transport { url: String, message: String },
}

/// Body of a ranged response, positioned at the requested offset
pub type RangeBody = Box<dyn Read>;

/// GET a resource starting at a byte offset
pub trait RangeFetcher: Send + Sync {
    /// `Ok(None)` when there is nothing past `start`
    fn fetch_from(&self, url: &str, start: u64) -> Result<Option<RangeBody>, HttpError>;
}

/// Whether `url` has a scheme some fetcher in this crate understands
pub fn is_supported_url(url: &str) -> bool {
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Dispatch on URL scheme: `file://` locally, everything else over HTTP
#[derive(Debug, Clone, Default)]
pub struct SchemeFetcher {
    file: FileRangeFetcher,
    http: UreqFetcher,
}

impl SchemeFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RangeFetcher for SchemeFetcher {
    fn fetch_from(&self, url: &str, start: u64) -> Result<Option<RangeBody>, HttpError> {
        if url.starts_with("file://") {
            self.file.fetch_from(url, start)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch_from(url, start)
        } else {
            Err(HttpError::UnsupportedScheme(url.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
