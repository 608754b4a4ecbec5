// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-remote replication cursor
//!
//! `state.bin` holds how many bytes of the remote's local `extents.bin`
//! have been replayed. The file stays locked for as long as the
//! [`RemoteState`] is alive.

use crate::error::StorageError;
use crate::extents::ExtentsReader;
use crate::lockfile::LockFile;
use gj_core::record::{decode_processed_offset, encode_processed_offset};
use gj_core::{ExtentRecord, JournalDir, EXTENT_LEN};
use std::io;

#[derive(Debug)]
pub struct RemoteState {
    dir: JournalDir,
    lock: Option<LockFile>,
    processed_offset: u32,
    last_extent: Option<ExtentRecord>,
    extent_count: u64,
}

impl RemoteState {
    /// Lock `state.bin` and read the cursor; a missing file means 0
    pub fn load(dir: &JournalDir) -> Result<Self, StorageError> {
        let path = dir.state();
        let lock = LockFile::acquire(&path)?;
        let processed_offset = match std::fs::read(&path) {
            Ok(bytes) => decode_processed_offset(&bytes).map_err(StorageError::codec(&path))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(StorageError::io(&path)(e)),
        };
        Ok(Self {
            dir: dir.clone(),
            lock: Some(lock),
            processed_offset,
            last_extent: None,
            extent_count: 0,
        })
    }

    /// Read the cursor without taking the lock
    pub fn peek(dir: &JournalDir) -> Result<u32, StorageError> {
        let path = dir.state();
        match std::fs::read(&path) {
            Ok(bytes) => decode_processed_offset(&bytes).map_err(StorageError::codec(&path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StorageError::io(&path)(e)),
        }
    }

    /// Re-read the local extents file: record count and the extent just
    /// before the cursor
    pub fn refresh(&mut self) -> Result<(), StorageError> {
        let width = EXTENT_LEN as u64;
        let offset = self.processed_offset;
        if u64::from(offset) % width != 0 {
            return Err(StorageError::MisalignedCursor(offset));
        }

        let Some(mut reader) = ExtentsReader::open_if_exists(&self.dir.extents())? else {
            if offset > 0 {
                return Err(StorageError::CursorBeyondExtents { offset, size: 0 });
            }
            self.extent_count = 0;
            self.last_extent = None;
            return Ok(());
        };

        let size = reader.byte_len();
        if u64::from(offset) > size {
            return Err(StorageError::CursorBeyondExtents { offset, size });
        }
        self.extent_count = reader.count();
        self.last_extent = match u64::from(offset) / width {
            0 => None,
            processed => Some(reader.read(processed - 1)?),
        };
        Ok(())
    }

    pub fn processed_offset(&self) -> u32 {
        self.processed_offset
    }

    /// Index of the first extent not yet replayed
    pub fn next_index(&self) -> u64 {
        u64::from(self.processed_offset) / EXTENT_LEN as u64
    }

    pub fn last_extent(&self) -> Option<ExtentRecord> {
        self.last_extent
    }

    pub fn extent_count(&self) -> u64 {
        self.extent_count
    }

    /// Extents downloaded but not yet replayed
    pub fn pending(&self) -> u64 {
        self.extent_count.saturating_sub(self.next_index())
    }

    /// Move the cursor just past `extent`, the record at `index`
    pub fn advance(&mut self, index: u64, extent: ExtentRecord) -> Result<(), StorageError> {
        let end = (index + 1) * EXTENT_LEN as u64;
        self.processed_offset = gj_core::record::to_wire_u32("processed offset", end)?;
        self.last_extent = Some(extent);
        Ok(())
    }

    /// Write the cursor; with `close == false` the lock is taken again for
    /// another round
    pub fn store(&mut self, close: bool) -> Result<(), StorageError> {
        let path = self.dir.state();
        let mut lock = match self.lock.take() {
            Some(lock) => lock,
            None => LockFile::acquire(&path)?,
        };
        lock.write_contents(&encode_processed_offset(self.processed_offset))?;
        lock.commit()?;
        tracing::debug!(offset = self.processed_offset, "remote state stored");
        if !close {
            self.lock = Some(LockFile::acquire(&path)?);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "remote_state_tests.rs"]
mod tests;
