// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `metadata.bin`: the serial of the segment currently being appended to

use crate::error::StorageError;
use crate::lockfile::write_atomically;
use gj_core::{JournalDir, JournalMetadata};
use std::io;

/// Read the metadata record, `None` if the journal was never initialized
pub fn load_metadata(dir: &JournalDir) -> Result<Option<JournalMetadata>, StorageError> {
    let path = dir.metadata();
    match std::fs::read(&path) {
        Ok(bytes) => JournalMetadata::decode(&bytes)
            .map(Some)
            .map_err(StorageError::codec(&path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(&path)(e)),
    }
}

/// Like [`load_metadata`] but a missing file is an error
pub fn require_metadata(dir: &JournalDir) -> Result<JournalMetadata, StorageError> {
    load_metadata(dir)?.ok_or_else(|| StorageError::MissingMetadata(dir.metadata()))
}

pub fn store_metadata(dir: &JournalDir, meta: &JournalMetadata) -> Result<(), StorageError> {
    write_atomically(&dir.metadata(), &meta.encode())?;
    Ok(())
}

/// Create the journal directory and an initial serial-0 metadata record
pub fn ensure_metadata(dir: &JournalDir) -> Result<JournalMetadata, StorageError> {
    std::fs::create_dir_all(dir.path()).map_err(StorageError::io(dir.path()))?;
    if let Some(meta) = load_metadata(dir)? {
        return Ok(meta);
    }
    let meta = JournalMetadata::default();
    store_metadata(dir, &meta)?;
    tracing::info!(dir = %dir.path().display(), "journal initialized");
    Ok(meta)
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
