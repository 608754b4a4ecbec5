// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::lockfile::LockError;
use crate::safe_append::SafeAppendError;
use gj_core::{CodecError, PackIndexError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the journal storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    SafeAppend(#[from] SafeAppendError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("corrupt record in {}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    PackIndex(#[from] PackIndexError),

    #[error("entry of {required} bytes can never fit under the journal size limit of {limit}")]
    EntryTooLarge { required: u64, limit: u64 },

    #[error("pack is {size} bytes, larger than the configured maximum of {limit}")]
    PackTooLarge { size: u64, limit: u64 },

    #[error("entry at {serial}@{offset} claims {header} bytes but its extent covers {extent} of a {segment}-byte segment")]
    EntryLengthMismatch {
        serial: u32,
        offset: u32,
        header: u64,
        extent: u32,
        segment: u64,
    },

    #[error("extents/integrity disparity: {extents} extents vs {integrity} integrity records")]
    IntegrityMismatch { extents: u64, integrity: u64 },

    #[error("processed offset {offset} exceeds extents size {size}; extents file is corrupt or truncated")]
    CursorBeyondExtents { offset: u32, size: u64 },

    #[error("processed offset {0} is not a whole number of extent records")]
    MisalignedCursor(u32),

    #[error("no journal metadata at {}", .0.display())]
    MissingMetadata(PathBuf),

    #[error("journal segment exceeds the 32-bit offset range: {0}")]
    OffsetOverflow(#[from] CodecError),
}

impl StorageError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
        move |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn codec(path: &Path) -> impl FnOnce(CodecError) -> StorageError + '_ {
        move |source| StorageError::Codec {
            path: path.to_path_buf(),
            source,
        }
    }
}
