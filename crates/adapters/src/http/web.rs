// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP(S) range requests

use super::{HttpError, RangeBody, RangeFetcher};
use std::io::{self, Read};

/// Blocking HTTP client issuing `Range: bytes=<start>-` requests
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqFetcher;

impl UreqFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl RangeFetcher for UreqFetcher {
    fn fetch_from(&self, url: &str, start: u64) -> Result<Option<RangeBody>, HttpError> {
        let response = match ureq::get(url)
            .header("Range", format!("bytes={}-", start))
            .call()
        {
            Ok(response) => response,
            // Range not satisfiable: nothing new past `start`
            Err(ureq::Error::StatusCode(416)) => return Ok(None),
            Err(ureq::Error::StatusCode(404)) => {
                return Err(HttpError::NotFound {
                    url: url.to_string(),
                })
            }
            Err(ureq::Error::StatusCode(status @ (401 | 403))) => {
                return Err(HttpError::Auth {
                    url: url.to_string(),
                    status,
                })
            }
            Err(ureq::Error::StatusCode(status)) => {
                return Err(HttpError::Status {
                    url: url.to_string(),
                    status,
                })
            }
            Err(ureq::Error::Io(source)) => {
                return Err(HttpError::Io {
                    url: url.to_string(),
                    source,
                })
            }
            Err(e) => {
                return Err(HttpError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let status = response.status().as_u16();
        let mut body: RangeBody = Box::new(response.into_body().into_reader());
        match status {
            206 => Ok(Some(body)),
            200 => {
                // Server ignored the range; skip what we already have.
                let skipped = io::copy(&mut body.by_ref().take(start), &mut io::sink())
                    .map_err(|source| HttpError::Io {
                        url: url.to_string(),
                        source,
                    })?;
                if skipped < start {
                    return Ok(None);
                }
                tracing::debug!(url, start, "server ignored range request");
                Ok(Some(body))
            }
            other => Err(HttpError::Status {
                url: url.to_string(),
                status: other,
            }),
        }
    }
}
