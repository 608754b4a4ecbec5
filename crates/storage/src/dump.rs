// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic readers: object ids held by a segment, raw extents listing

use crate::error::StorageError;
use crate::extents::{ExtentsReader, RawExtent};
use crate::safe_append::SafeAppendReader;
use gj_core::{EntryHeader, ExtentRecord, JournalDir, ObjectId, Opcode, PackIndex, HEADER_LEN};

/// Decode the header of the entry an extent points at
pub fn read_entry_header(
    segment: &mut SafeAppendReader,
    extent: &ExtentRecord,
) -> Result<EntryHeader, StorageError> {
    let mut buf = [0u8; HEADER_LEN];
    segment.read_exact_at(u64::from(extent.offset), &mut buf)?;
    EntryHeader::decode(&buf).map_err(StorageError::codec(segment.path()))
}

/// Read the payload of the entry an extent points at
pub fn read_entry_payload(
    segment: &mut SafeAppendReader,
    extent: &ExtentRecord,
) -> Result<(EntryHeader, Vec<u8>), StorageError> {
    let header = read_entry_header(segment, extent)?;
    if header.entry_len() != u64::from(extent.length) || extent.end() > segment.len() {
        return Err(StorageError::EntryLengthMismatch {
            serial: extent.serial,
            offset: extent.offset,
            header: header.entry_len(),
            extent: extent.length,
            segment: segment.len(),
        });
    }
    let mut payload = vec![0u8; header.payload_len as usize];
    segment.read_exact_at(u64::from(extent.offset) + HEADER_LEN as u64, &mut payload)?;
    Ok((header, payload))
}

/// Every object id listed by the pack indices journaled in `serial`
pub fn dump_serial_objects(dir: &JournalDir, serial: u32) -> Result<Vec<ObjectId>, StorageError> {
    let mut extents = ExtentsReader::open(&dir.extents())?;
    let mut segment = SafeAppendReader::open(&dir.segment(serial))?;
    let mut ids = Vec::new();

    for index in 0..extents.count() {
        let extent = extents.read(index)?;
        if extent.serial != serial || extent.opcode != Opcode::Index {
            continue;
        }
        let (_, payload) = read_entry_payload(&mut segment, &extent)?;
        let pack_index = PackIndex::parse(&payload)?;
        tracing::debug!(%extent, objects = pack_index.len(), "dumping index");
        ids.extend(pack_index.object_ids());
    }
    Ok(ids)
}

/// All committed extent records, empty when there is no extents file
pub fn list_extents(dir: &JournalDir) -> Result<Vec<RawExtent>, StorageError> {
    match ExtentsReader::open_if_exists(&dir.extents())? {
        Some(mut reader) => reader.read_all(),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[path = "dump_tests.rs"]
mod tests;
