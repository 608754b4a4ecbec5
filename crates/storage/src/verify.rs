// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only consistency checks over a journal directory
//!
//! Problems are collected into a [`VerifyReport`] instead of stopping at the
//! first one; only I/O failures are returned as errors.

use crate::error::StorageError;
use crate::extents::{read_integrity, ExtentsReader, RawExtent};
use crate::safe_append::SafeAppendReader;
use gj_core::record::chain_crc;
use gj_core::{ExtentRecord, JournalDir, HEADER_LEN};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyLine {
    pub ok: bool,
    pub message: String,
}

impl fmt::Display for VerifyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.ok { "ok" } else { "err" };
        write!(f, "{} {}", marker, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub lines: Vec<VerifyLine>,
    pub checked: u64,
    pub errors: u64,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    fn ok(&mut self, verbose: bool, message: String) {
        if verbose {
            self.lines.push(VerifyLine { ok: true, message });
        }
    }

    fn err(&mut self, message: String) {
        self.errors += 1;
        self.lines.push(VerifyLine { ok: false, message });
    }
}

/// Extent fields read straight from the wire, valid opcode or not
#[derive(Debug, Clone, Copy)]
struct WireExtent {
    serial: u32,
    opcode: u8,
    offset: u32,
    length: u32,
}

impl WireExtent {
    fn from_raw(raw: &RawExtent) -> Self {
        let field = |at: usize| {
            u32::from_be_bytes([raw.raw[at], raw.raw[at + 1], raw.raw[at + 2], raw.raw[at + 3]])
        };
        Self {
            serial: field(0),
            opcode: raw.raw[4],
            offset: field(8),
            length: field(12),
        }
    }
}

/// Check every extent for contiguity and, for extents of `serial`, that
/// the journal header at its offset agrees with it
pub fn verify_extents(
    dir: &JournalDir,
    serial: u32,
    verbose: bool,
) -> Result<VerifyReport, StorageError> {
    let extents = ExtentsReader::open(&dir.extents())?.read_all()?;
    let mut segment = SafeAppendReader::open(&dir.segment(serial))?;
    let mut report = VerifyReport::default();
    let mut previous: Option<WireExtent> = None;

    for raw in &extents {
        let e = WireExtent::from_raw(raw);
        report.checked += 1;

        if raw.decoded.is_err() {
            report.err(format!(
                "extent record @{} invalid opcode {}",
                e.offset,
                char::from(e.opcode)
            ));
        }
        if let Some(prev) = previous.filter(|prev| prev.serial == e.serial) {
            let expected = u64::from(prev.offset) + u64::from(prev.length);
            if u64::from(e.offset) != expected {
                report.err(format!(
                    "extent record number {} offset = {} prev_offset = {} prev_length = {} not strictly contiguous",
                    raw.index, e.offset, prev.offset, prev.length
                ));
            }
        }
        previous = Some(e);

        if e.serial == serial {
            verify_entry(&mut segment, e, verbose, &mut report)?;
        }
    }
    Ok(report)
}

fn verify_entry(
    segment: &mut SafeAppendReader,
    e: WireExtent,
    verbose: bool,
    report: &mut VerifyReport,
) -> Result<(), StorageError> {
    let extent = format!(
        "extent: ({}) {:x}@{}+{}",
        char::from(e.opcode),
        e.serial,
        e.offset,
        e.length
    );

    let mut buf = [0u8; HEADER_LEN];
    if u64::from(e.offset) + HEADER_LEN as u64 > segment.len() {
        report.err(format!("{} journal: header past end of segment ({} bytes)", extent, segment.len()));
        return Ok(());
    }
    segment.read_exact_at(u64::from(e.offset), &mut buf)?;

    let header_opcode = buf[0];
    let payload_len = u32::from_be_bytes([buf[24], buf[25], buf[26], buf[27]]);
    let mut id = [0u8; 20];
    id.copy_from_slice(&buf[1..21]);
    let journal = format!(
        "journal: ({}) @{}+({}+{}) sha1={}",
        char::from(header_opcode),
        e.offset,
        HEADER_LEN,
        payload_len,
        gj_core::ObjectId::from_bytes(id)
    );

    let problem = if header_opcode != e.opcode {
        Some("mismatched opcode")
    } else if u64::from(e.length) != u64::from(payload_len) + HEADER_LEN as u64 {
        Some("incorrect payload length")
    } else {
        None
    };
    match problem {
        Some(problem) => report.err(format!("{} {} {}", extent, journal, problem)),
        None => report.ok(verbose, format!("{} {}", extent, journal)),
    }
    Ok(())
}

/// Re-derive the integrity chain and self CRCs; when a segment is still
/// on disk, also check each entry's data hash
pub fn verify_integrity(dir: &JournalDir, verbose: bool) -> Result<VerifyReport, StorageError> {
    let extents = match ExtentsReader::open_if_exists(&dir.extents())? {
        Some(mut reader) => reader.read_all()?,
        None => Vec::new(),
    };
    let records = read_integrity(&dir.integrity())?;
    let mut report = VerifyReport::default();

    if extents.len() != records.len() {
        report.err(format!(
            "extents/integrity disparity: {} extents vs {} integrity records",
            extents.len(),
            records.len()
        ));
    }

    let mut segments: HashMap<u32, Option<SafeAppendReader>> = HashMap::new();
    let mut chain = 0u32;
    for (raw, record) in extents.iter().zip(&records) {
        report.checked += 1;
        chain = chain_crc(chain, &raw.raw);
        let at = raw.index;

        if record.chain_crc != chain {
            report.err(format!(
                "integrity record {}: chain crc {:08x}, expected {:08x}",
                at, record.chain_crc, chain
            ));
            continue;
        }
        if !record.self_crc_valid() {
            report.err(format!(
                "integrity record {}: self crc {:08x}, expected {:08x}",
                at,
                record.self_crc,
                record.expected_self_crc()
            ));
            continue;
        }

        let Ok(extent) = raw.decoded.clone() else {
            report.err(format!("integrity record {}: extent is undecodable", at));
            continue;
        };
        match entry_hash(dir, &mut segments, extent)? {
            Some(hash) if hash != *record.data_hash.as_bytes() => {
                report.err(format!("integrity record {}: data hash mismatch for {}", at, extent));
            }
            _ => report.ok(verbose, format!("integrity record {}: {}", at, extent)),
        }
    }
    Ok(report)
}

/// SHA-1 of an entry's bytes, `None` when its segment is gone or short
fn entry_hash(
    dir: &JournalDir,
    segments: &mut HashMap<u32, Option<SafeAppendReader>>,
    extent: ExtentRecord,
) -> Result<Option<[u8; 20]>, StorageError> {
    let reader = match segments.entry(extent.serial) {
        std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
        std::collections::hash_map::Entry::Vacant(slot) => {
            let opened = match SafeAppendReader::open(&dir.segment(extent.serial)) {
                Ok(reader) => Some(reader),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.into()),
            };
            slot.insert(opened)
        }
    };
    let Some(reader) = reader.as_mut() else {
        return Ok(None);
    };
    if extent.end() > reader.len() {
        return Ok(None);
    }

    let mut sha = Sha1::new();
    let mut bytes = reader.range(u64::from(extent.offset), u64::from(extent.length))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = bytes
            .read(&mut buf)
            .map_err(StorageError::io(&dir.segment(extent.serial)))?;
        if n == 0 {
            break;
        }
        sha.update(&buf[..n]);
    }
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&sha.finalize());
    Ok(Some(digest))
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
