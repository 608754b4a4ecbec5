// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fetch-and-replay

use gj_adapters::{HttpError, ObjectStoreError, RefError};
use gj_core::NameError;
use gj_storage::{LockError, SafeAppendError, StorageError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a fetch invocation
///
/// Per-ref application failures are not errors: they are counted in the
/// report, logged and quarantined.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    SafeAppend(#[from] SafeAppendError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Objects(#[from] ObjectStoreError),

    #[error(transparent)]
    Refs(#[from] RefError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extents already being fetched by another process.")]
    AlreadyFetching(PathBuf),

    #[error(
        "{} exists without metadata.bin: journals were fetched without mirror mode \
         and replayed segments are already gone",
        .0.display()
    )]
    MirrorWithoutMetadata(PathBuf),

    #[error(
        "{} exists, but mirror mode is off; fetching would corrupt the mirror",
        .0.display()
    )]
    MetadataWithoutMirror(PathBuf),

    #[error(
        "the journal requires wire protocol version {required}; \
         this client supports wire protocol version {supported}"
    )]
    UpgradeRequired { required: u16, supported: u16 },

    #[error("extent {index} goes back to serial {serial:x} after serial {current:x}")]
    OutOfOrder { index: u64, serial: u32, current: u32 },

    #[error("journal entry at {serial:x}@{offset} does not match its extent: {reason}")]
    EntryMismatch {
        serial: u32,
        offset: u32,
        reason: String,
    },
}

impl FetchError {
    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> FetchError + '_ {
        move |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors saving or loading an epilogue plan
#[derive(Debug, Error)]
pub enum EpilogueError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid epilogue plan {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}
