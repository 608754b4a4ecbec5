// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readers for `extents.bin` and `integrity.bin`

use crate::error::StorageError;
use crate::safe_append::SafeAppendReader;
use gj_core::{CodecError, ExtentRecord, IntegrityRecord, EXTENT_LEN, INTEGRITY_LEN};
use std::path::Path;

/// Random access to the committed records of an extents file
pub struct ExtentsReader {
    reader: SafeAppendReader,
}

impl ExtentsReader {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            reader: SafeAppendReader::open(path)?,
        })
    }

    /// Open, treating a never-committed file as empty
    pub fn open_if_exists(path: &Path) -> Result<Option<Self>, StorageError> {
        match SafeAppendReader::open(path) {
            Ok(reader) => Ok(Some(Self { reader })),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Committed length in bytes
    pub fn byte_len(&self) -> u64 {
        self.reader.len()
    }

    /// Number of whole records
    pub fn count(&self) -> u64 {
        self.reader.len() / EXTENT_LEN as u64
    }

    pub fn read_raw(&mut self, index: u64) -> Result<[u8; EXTENT_LEN], StorageError> {
        let mut buf = [0u8; EXTENT_LEN];
        self.reader
            .read_exact_at(index * EXTENT_LEN as u64, &mut buf)?;
        Ok(buf)
    }

    pub fn read(&mut self, index: u64) -> Result<ExtentRecord, StorageError> {
        let raw = self.read_raw(index)?;
        ExtentRecord::decode(&raw).map_err(StorageError::codec(self.reader.path()))
    }

    /// Every record, keeping undecodable ones for diagnostics
    pub fn read_all(&mut self) -> Result<Vec<RawExtent>, StorageError> {
        (0..self.count())
            .map(|index| {
                let raw = self.read_raw(index)?;
                Ok(RawExtent {
                    index,
                    raw,
                    decoded: ExtentRecord::decode(&raw),
                })
            })
            .collect()
    }
}

/// An extent record as stored, with its decode result
#[derive(Debug, Clone)]
pub struct RawExtent {
    pub index: u64,
    pub raw: [u8; EXTENT_LEN],
    pub decoded: Result<ExtentRecord, CodecError>,
}

impl RawExtent {
    /// Byte position of the record inside `extents.bin`
    pub fn position(&self) -> u64 {
        self.index * EXTENT_LEN as u64
    }
}

/// All committed integrity records; empty if the file was never written
pub fn read_integrity(path: &Path) -> Result<Vec<IntegrityRecord>, StorageError> {
    let mut reader = match SafeAppendReader::open(path) {
        Ok(reader) => reader,
        Err(e) if e.is_not_found() => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let count = reader.len() / INTEGRITY_LEN as u64;
    let mut records = Vec::with_capacity(count as usize);
    for index in 0..count {
        let mut buf = [0u8; INTEGRITY_LEN];
        reader.read_exact_at(index * INTEGRITY_LEN as u64, &mut buf)?;
        records.push(IntegrityRecord::decode(&buf).map_err(StorageError::codec(path))?);
    }
    Ok(records)
}

#[cfg(test)]
#[path = "extents_tests.rs"]
mod tests;
