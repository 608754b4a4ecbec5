// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal writer
//!
//! A [`JournalContext`] is the single producer of one journal directory.
//! It holds the extents and integrity locks for its whole lifetime, appends
//! entries to the current segment, rotates segments at the size limit and
//! buffers extent/integrity records until [`JournalContext::flush`].
//!
//! Segment bytes are committed only as part of a flush, right before the
//! extents that describe them, so after a crash the segment holds at most
//! uncommitted debris past the last extent.

use crate::error::StorageError;
use crate::lockfile::{write_atomically, LockFile, LOCK_RETRY_ATTEMPTS, LOCK_RETRY_DELAY};
use crate::metadata::{ensure_metadata, load_metadata, store_metadata};
use crate::packlog::PackLog;
use crate::safe_append::{read_size_marker, SafeAppendFile};
use gj_core::record::{chain_crc, encode_processed_offset, encode_wire_version, to_wire_u32};
use gj_core::{
    EntryHeader, ExtentRecord, IntegrityRecord, JournalConfig, JournalDir, JournalMetadata,
    ObjectId, Opcode, EXTENT_LEN, INTEGRITY_LEN,
};
use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::Duration;

/// Slack kept free in every segment beyond the entry itself
pub const ENTRY_OVERHEAD: u64 = 100;

/// Writer settings taken from `[journal]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    pub size_limit: u64,
    pub integrity: bool,
    pub max_pack_size: u64,
}

impl From<&JournalConfig> for WriterOptions {
    fn from(config: &JournalConfig) -> Self {
        Self {
            size_limit: config.journal.size_limit,
            integrity: config.journal.integrity,
            max_pack_size: config.journal.max_pack_size,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingExtent {
    extent: ExtentRecord,
    data_hash: ObjectId,
}

/// Result of closing a writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseSummary {
    pub serial: u32,
    pub extents_flushed: usize,
}

/// An extents or integrity file held open under its lock
struct LockedAppend {
    file: SafeAppendFile,
    lock: LockFile,
}

impl LockedAppend {
    fn open(path: &Path, attempts: u32, delay: Duration) -> Result<Self, StorageError> {
        let lock = LockFile::acquire_with_retry(path, attempts, delay)?;
        let file = SafeAppendFile::open(path)?;
        Ok(Self { file, lock })
    }

    fn release(self) {
        self.lock.rollback();
    }
}

struct OpenSegment {
    serial: u32,
    file: SafeAppendFile,
}

pub struct JournalContext {
    dir: JournalDir,
    options: WriterOptions,
    meta: JournalMetadata,
    extents: LockedAppend,
    integrity: LockedAppend,
    segment: Option<OpenSegment>,
    pending: Vec<PendingExtent>,
    pending_packs: Vec<ObjectId>,
}

impl JournalContext {
    /// Initialize the directory if needed and take the writer locks
    pub fn open(dir: JournalDir, options: WriterOptions) -> Result<Self, StorageError> {
        Self::open_with_retry(dir, options, LOCK_RETRY_ATTEMPTS, LOCK_RETRY_DELAY)
    }

    pub fn open_with_retry(
        dir: JournalDir,
        options: WriterOptions,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, StorageError> {
        let meta = ensure_metadata(&dir)?;
        let extents = LockedAppend::open(&dir.extents(), attempts, delay)?;
        let integrity = LockedAppend::open(&dir.integrity(), attempts, delay)?;
        let mut ctx = Self {
            dir,
            options,
            meta,
            extents,
            integrity,
            segment: None,
            pending: Vec::new(),
            pending_packs: Vec::new(),
        };
        ctx.discard_orphan_bytes()?;
        Ok(ctx)
    }

    pub fn dir(&self) -> &JournalDir {
        &self.dir
    }

    pub fn serial(&self) -> u32 {
        self.meta.serial
    }

    /// Extent records buffered but not yet flushed
    pub fn pending_extents(&self) -> usize {
        self.pending.len()
    }

    /// Whether a pack was already journaled, by this context or before
    pub fn is_pack_journaled(&self, pack: &ObjectId) -> Result<bool, StorageError> {
        if self.pending_packs.contains(pack) {
            return Ok(true);
        }
        PackLog::new(&self.dir).contains(pack)
    }

    fn last_extent(&mut self) -> Result<Option<ExtentRecord>, StorageError> {
        let len = self.extents.file.committed_len();
        let width = EXTENT_LEN as u64;
        if len < width {
            return Ok(None);
        }
        let mut buf = [0u8; EXTENT_LEN];
        self.extents
            .file
            .read_exact_at((len / width - 1) * width, &mut buf)?;
        ExtentRecord::decode(&buf)
            .map(Some)
            .map_err(StorageError::codec(self.extents.file.path()))
    }

    /// Drop committed segment bytes that no extent describes
    ///
    /// They can only be left behind by a crash between the segment commit
    /// and the extents commit of a flush. The current segment is also
    /// reopened for writing in case a rotation sealed it but never got to
    /// move the serial.
    fn discard_orphan_bytes(&mut self) -> Result<(), StorageError> {
        let serial = self.meta.serial;
        let path = self.dir.segment(serial);
        let Some(committed) = read_size_marker(&path)? else {
            return Ok(());
        };
        set_sealed(&path, false)?;
        let described = match self.last_extent()? {
            Some(last) if last.serial == serial => last.end(),
            _ => 0,
        };
        if committed > described {
            tracing::warn!(
                segment = %path.display(),
                committed,
                described,
                "discarding journal bytes not covered by extents"
            );
            SafeAppendFile::open(&path)?.truncate_committed(described)?;
        }
        Ok(())
    }

    /// Serial as currently recorded on disk
    fn current_serial(&mut self) -> Result<u32, StorageError> {
        if let Some(meta) = load_metadata(&self.dir)? {
            self.meta = meta;
        }
        Ok(self.meta.serial)
    }

    fn close_segment(&mut self, segment: OpenSegment) -> Result<(), StorageError> {
        self.segment = Some(segment);
        self.flush()?;
        self.segment = None;
        Ok(())
    }

    /// Segment that can take `required` more bytes, rotating as needed
    fn segment_with_capacity(&mut self, required: u64) -> Result<OpenSegment, StorageError> {
        let limit = self.options.size_limit;
        if required + ENTRY_OVERHEAD >= limit {
            return Err(StorageError::EntryTooLarge { required, limit });
        }
        loop {
            let serial = self.current_serial()?;
            let path = self.dir.segment(serial);

            let open = match self.segment.take() {
                Some(segment) if segment.serial == serial => Some(segment),
                Some(stale) => {
                    self.close_segment(stale)?;
                    None
                }
                None => None,
            };
            let used = match &open {
                Some(segment) => segment.file.len()?,
                None => read_size_marker(&path)?.unwrap_or(0),
            };
            if used + required < limit {
                return match open {
                    Some(segment) => Ok(segment),
                    None => Ok(OpenSegment {
                        serial,
                        file: SafeAppendFile::open(&path)?,
                    }),
                };
            }

            if let Some(segment) = open {
                self.close_segment(segment)?;
            }
            // Serial first: a sealed segment is never the current one.
            self.meta.serial = serial + 1;
            store_metadata(&self.dir, &self.meta)?;
            if path.exists() {
                seal_segment(&path)?;
            }
            tracing::info!(from = serial, to = self.meta.serial, used, required, "rotated journal");
        }
    }

    fn write_entry(
        &mut self,
        segment: &mut OpenSegment,
        header: EntryHeader,
        payload: &[u8],
    ) -> Result<ExtentRecord, StorageError> {
        let offset = segment.file.len()?;
        let head = header.encode();
        segment.file.append(&head)?;
        segment.file.append(payload)?;

        let mut sha = Sha1::new();
        sha.update(head);
        sha.update(payload);
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&sha.finalize());

        let extent = ExtentRecord {
            serial: segment.serial,
            opcode: header.opcode,
            offset: to_wire_u32("offset", offset)?,
            length: to_wire_u32("length", header.entry_len())?,
        };
        self.pending.push(PendingExtent {
            extent,
            data_hash: ObjectId::from_bytes(digest),
        });
        tracing::info!(id = %header.id, "journaled {:>7} {}", header.opcode.name(), extent);
        Ok(extent)
    }

    fn append_single(
        &mut self,
        opcode: Opcode,
        id: ObjectId,
        payload: &[u8],
    ) -> Result<ExtentRecord, StorageError> {
        let header = EntryHeader {
            opcode,
            id,
            payload_len: to_wire_u32("payload length", payload.len() as u64)?,
        };
        let mut segment = self.segment_with_capacity(header.entry_len())?;
        let extent = self.write_entry(&mut segment, header, payload)?;
        self.segment = Some(segment);
        Ok(extent)
    }

    /// Journal a ref tip change; the null id records a deletion
    pub fn append_ref(&mut self, name: &str, tip: ObjectId) -> Result<ExtentRecord, StorageError> {
        self.append_single(Opcode::Ref, tip, name.as_bytes())
    }

    /// Announce the wire version readers must support from here on
    pub fn append_upgrade(&mut self, version: u16) -> Result<ExtentRecord, StorageError> {
        self.append_single(Opcode::Upgrade, encode_wire_version(version), &[])
    }

    /// Journal a pack and its index back to back in one segment
    pub fn append_pack(
        &mut self,
        pack: ObjectId,
        pack_bytes: &[u8],
        index_bytes: &[u8],
    ) -> Result<[ExtentRecord; 2], StorageError> {
        let size = pack_bytes.len() as u64;
        if self.options.max_pack_size > 0 && size > self.options.max_pack_size {
            return Err(StorageError::PackTooLarge {
                size,
                limit: self.options.max_pack_size,
            });
        }

        let pack_header = EntryHeader {
            opcode: Opcode::Pack,
            id: pack,
            payload_len: to_wire_u32("payload length", size)?,
        };
        let index_header = EntryHeader {
            opcode: Opcode::Index,
            id: pack,
            payload_len: to_wire_u32("payload length", index_bytes.len() as u64)?,
        };
        let required = pack_header.entry_len() + index_header.entry_len();
        let mut segment = self.segment_with_capacity(required)?;
        let pack_extent = self.write_entry(&mut segment, pack_header, pack_bytes)?;
        let index_extent = self.write_entry(&mut segment, index_header, index_bytes)?;
        self.segment = Some(segment);
        self.pending_packs.push(pack);
        Ok([pack_extent, index_extent])
    }

    /// Move to a fresh segment without writing anything
    pub fn increment_serial(&mut self) -> Result<u32, StorageError> {
        if let Some(segment) = self.segment.take() {
            self.close_segment(segment)?;
        }
        let serial = self.current_serial()?;
        self.meta.serial = serial + 1;
        store_metadata(&self.dir, &self.meta)?;
        Ok(self.meta.serial)
    }

    fn last_chain_crc(&mut self) -> Result<u32, StorageError> {
        let len = self.integrity.file.committed_len();
        let width = INTEGRITY_LEN as u64;
        if len < width {
            return Ok(0);
        }
        let mut buf = [0u8; INTEGRITY_LEN];
        self.integrity
            .file
            .read_exact_at((len / width - 1) * width, &mut buf)?;
        let last = IntegrityRecord::decode(&buf)
            .map_err(StorageError::codec(self.integrity.file.path()))?;
        Ok(last.chain_crc)
    }

    /// Commit the open segment, then append and commit the buffered
    /// extent and integrity records
    pub fn flush(&mut self) -> Result<usize, StorageError> {
        if let Some(segment) = self.segment.as_mut() {
            segment.file.commit()?;
        }
        if self.pending.is_empty() {
            return Ok(0);
        }
        let pending = std::mem::take(&mut self.pending);
        let mut chain = self.last_chain_crc()?;

        for entry in &pending {
            let wire = entry.extent.encode();
            self.extents.file.append(&wire)?;
            if self.options.integrity {
                chain = chain_crc(chain, &wire);
                let record = IntegrityRecord::seal(chain, entry.data_hash);
                self.integrity.file.append(&record.encode())?;
            }
        }

        if self.options.integrity {
            let extents = self.extents.file.len()? / EXTENT_LEN as u64;
            let integrity = self.integrity.file.len()? / INTEGRITY_LEN as u64;
            if extents != integrity {
                return Err(StorageError::IntegrityMismatch {
                    extents,
                    integrity,
                });
            }
        }

        let extents_len = self.extents.file.commit()?;
        self.integrity.file.commit()?;
        tracing::info!(
            records = pending.len(),
            extents_kb = extents_len / 1024,
            "extents flushed"
        );
        Ok(pending.len())
    }

    /// Flush, record journaled packs and the local cursor, release locks
    pub fn close(mut self) -> Result<CloseSummary, StorageError> {
        let extents_flushed = self.flush()?;
        if !self.pending_packs.is_empty() {
            PackLog::new(&self.dir).append(&self.pending_packs)?;
        }
        let extents_len = self.extents.file.committed_len();
        write_atomically(
            &self.dir.state(),
            &encode_processed_offset(to_wire_u32("processed offset", extents_len)?),
        )?;

        let summary = CloseSummary {
            serial: self.meta.serial,
            extents_flushed,
        };
        self.extents.release();
        self.integrity.release();
        Ok(summary)
    }
}

/// Mark a full segment read-only
fn seal_segment(path: &Path) -> Result<(), StorageError> {
    set_sealed(path, true)
}

fn set_sealed(path: &Path, sealed: bool) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(StorageError::io(path))?
        .permissions();
    let mode = perms.mode();
    let mode = if sealed { mode & !0o222 } else { mode | 0o200 };
    if mode == perms.mode() {
        return Ok(());
    }
    perms.set_mode(mode);
    std::fs::set_permissions(path, perms).map_err(StorageError::io(path))
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
