// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `file://` URLs, for replicas on the same host and for tests

use super::{HttpError, RangeBody, RangeFetcher};
use gj_storage::safe_append::read_size_marker;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Serves local files with range semantics
///
/// A file with a size marker is served only up to its committed length,
/// the way a safe-append reader would see it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRangeFetcher;

impl FileRangeFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl RangeFetcher for FileRangeFetcher {
    fn fetch_from(&self, url: &str, start: u64) -> Result<Option<RangeBody>, HttpError> {
        let Some(path) = url.strip_prefix("file://") else {
            return Err(HttpError::UnsupportedScheme(url.to_string()));
        };
        let path = Path::new(path);
        let io_err = |source: io::Error| HttpError::Io {
            url: url.to_string(),
            source,
        };

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(HttpError::NotFound {
                    url: url.to_string(),
                })
            }
            Err(e) => return Err(io_err(e)),
        };
        let physical = file.metadata().map_err(io_err)?.len();
        let served = match read_size_marker(path) {
            Ok(Some(committed)) => committed.min(physical),
            Ok(None) => physical,
            Err(e) => return Err(io_err(io::Error::other(e.to_string()))),
        };
        if start >= served {
            return Ok(None);
        }
        file.seek(SeekFrom::Start(start)).map_err(io_err)?;
        Ok(Some(Box::new(file.take(served - start))))
    }
}
