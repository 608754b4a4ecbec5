// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record of packs already written to the journal
//!
//! `packlog.bin` is a safe-append array of 20-byte pack hashes. The writer
//! consults it so the same pack is never journaled twice.

use crate::error::StorageError;
use crate::safe_append::{SafeAppendFile, SafeAppendReader};
use gj_core::id::OBJECT_ID_LEN;
use gj_core::{JournalDir, ObjectId};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub struct PackLog {
    path: PathBuf,
}

impl PackLog {
    pub fn new(dir: &JournalDir) -> Self {
        Self {
            path: dir.packlog(),
        }
    }

    /// All logged pack hashes, in the order they were logged
    pub fn list(&self) -> Result<Vec<ObjectId>, StorageError> {
        let mut reader = match SafeAppendReader::open(&self.path) {
            Ok(reader) => reader,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let count = reader.len() / OBJECT_ID_LEN as u64;
        let mut ids = Vec::with_capacity(count as usize);
        for index in 0..count {
            let mut buf = [0u8; OBJECT_ID_LEN];
            reader.read_exact_at(index * OBJECT_ID_LEN as u64, &mut buf)?;
            ids.push(ObjectId::from_bytes(buf));
        }
        Ok(ids)
    }

    pub fn contains(&self, id: &ObjectId) -> Result<bool, StorageError> {
        Ok(self.list()?.contains(id))
    }

    /// Append ids not already present; returns how many were added
    pub fn append(&self, ids: &[ObjectId]) -> Result<usize, StorageError> {
        let mut known: BTreeSet<ObjectId> = self.list()?.into_iter().collect();
        let mut file = SafeAppendFile::open(&self.path)?;
        let mut added = 0;
        for id in ids {
            if known.insert(*id) {
                file.append(id.as_bytes())?;
                added += 1;
            }
        }
        if added > 0 {
            file.commit()?;
        }
        Ok(added)
    }
}

#[cfg(test)]
#[path = "packlog_tests.rs"]
mod tests;
