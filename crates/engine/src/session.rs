// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetch-and-replay of one remote
//!
//! Each URL round downloads the remote's `extents.bin` and the segments
//! it points at, replays extents past the cursor, applies the staged
//! refs, then persists the cursor. The local `extents.bin` stays
//! flock'ed for the lifetime of the session.

use crate::epilogue::EpiloguePlan;
use crate::error::FetchError;
use crate::fetch_head::FetchHead;
use crate::progress::Progress;
use crate::refs::{RefApplier, RefBatch};
use fs2::FileExt;
use gj_adapters::{is_supported_url, ObjectStore, RangeFetcher, RefStore};
use gj_core::layout::{journal_url, segment_file_name, EXTENTS_FILE, METADATA_FILE, STATE_FILE};
use gj_core::record::decode_wire_version;
use gj_core::refname::{replica_ref_name, validate_remote_name};
use gj_core::{
    EntryHeader, ExtentRecord, JournalConfig, JournalDir, JournalMetadata, ObjectId, Opcode,
    Remote, RepoLayout, EXTENT_LEN, HEADER_LEN, WIRE_VERSION,
};
use gj_storage::safe_append::{self, backfill_size_marker, size_path};
use gj_storage::{
    ensure_metadata, store_metadata, ExtentsReader, RemoteState, SafeAppendFile, SafeAppendReader,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};

/// Per-invocation switches
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Keep segments and metadata so this repository can serve the journal
    pub mirror: bool,
    /// Download only; leave extents pending
    pub no_extract: bool,
    /// Draw a progress meter on stderr
    pub progress: bool,
    pub disable_fetch_head: bool,
    /// Names requested on the command line, marked for merge
    pub refspecs: Vec<String>,
}

/// Outcome of one URL round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlReport {
    pub url: String,
    /// Scheme not understood, nothing was attempted
    pub skipped: bool,
    /// Downloading `extents.bin` failed; replay used what was already local
    pub extents_error: Option<String>,
    pub new_extents: u64,
    /// Extents the cursor moved past
    pub replayed: u64,
    pub tips_extracted: usize,
    pub ref_failures: usize,
    /// Replay stopped at an extent whose bytes are not available yet
    pub stopped_early: bool,
}

impl UrlReport {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn failures(&self) -> usize {
        usize::from(self.extents_error.is_some()) + self.ref_failures
    }
}

#[derive(Debug)]
pub struct FetchReport {
    pub remote: String,
    /// Mirror mode, from the options or the remote's configuration
    pub mirror: bool,
    pub urls: Vec<UrlReport>,
    pub start_offset: u32,
    pub processed_offset: u32,
    pub fetch_head_written: bool,
    pub epilogue: EpiloguePlan,
}

impl FetchReport {
    pub fn failures(&self) -> usize {
        self.urls.iter().map(UrlReport::failures).sum()
    }

    pub fn advanced(&self) -> bool {
        self.processed_offset > self.start_offset
    }

    pub fn exit_code(&self) -> i32 {
        if self.failures() > 0 {
            1
        } else {
            0
        }
    }
}

/// Adapters a session works through
pub struct FetchDeps<F, O, R> {
    pub fetcher: F,
    pub objects: O,
    pub refs: R,
}

/// Segment being replayed: local bytes start at `discarded` in the
/// remote's copy
struct OpenSegment {
    serial: u32,
    reader: SafeAppendReader,
    discarded: u64,
    advanced: bool,
}

impl OpenSegment {
    fn journal_size(&self) -> u64 {
        self.discarded + self.reader.len()
    }

    fn local_offset(&self, extent: &ExtentRecord) -> Result<u64, FetchError> {
        u64::from(extent.offset)
            .checked_sub(self.discarded)
            .ok_or_else(|| FetchError::EntryMismatch {
                serial: extent.serial,
                offset: extent.offset,
                reason: format!("bytes before offset {} were discarded", self.discarded),
            })
    }
}

enum Step {
    Advance,
    Hold,
    Upgrade(u16),
}

pub struct ReplicationSession<F, O, R> {
    layout: RepoLayout,
    config: JournalConfig,
    remote: Remote,
    options: FetchOptions,
    mirror: bool,
    dir: JournalDir,
    deps: FetchDeps<F, O, R>,
    state: RemoteState,
    fetch_head: Option<FetchHead>,
    _extents_lock: File,
}

impl<F: RangeFetcher, O: ObjectStore, R: RefStore> ReplicationSession<F, O, R> {
    /// Check the local journal directory against the mode, take the
    /// extents lock and load the cursor
    pub fn open(
        layout: RepoLayout,
        config: JournalConfig,
        remote: Remote,
        options: FetchOptions,
        deps: FetchDeps<F, O, R>,
    ) -> Result<Self, FetchError> {
        validate_remote_name(&remote.name)?;
        let mirror = options.mirror || remote.mirror;
        let dir = layout.remote_journal_dir(&remote.name, config.journal.bare, mirror);

        if mirror {
            if dir.extents().exists() && !dir.metadata().exists() {
                return Err(FetchError::MirrorWithoutMetadata(dir.extents()));
            }
            ensure_metadata(&dir)?;
        } else if dir.metadata().exists() {
            return Err(FetchError::MetadataWithoutMirror(dir.metadata()));
        }
        std::fs::create_dir_all(dir.path()).map_err(FetchError::io(dir.path()))?;

        let extents_lock = lock_extents(&dir)?;
        backfill_markers(&dir)?;
        let state = RemoteState::load(&dir)?;

        let fetch_head = match (options.disable_fetch_head, remote.urls.first()) {
            (false, Some(url)) => {
                let head = deps.refs.head_target()?;
                let mut fetch_head =
                    FetchHead::new(&remote.name, url, head, options.refspecs.clone());
                fetch_head.seed(&deps.refs)?;
                Some(fetch_head)
            }
            _ => None,
        };

        tracing::debug!(remote = %remote.name, dir = %dir.path().display(), mirror, "session opened");
        Ok(Self {
            layout,
            config,
            remote,
            options,
            mirror,
            dir,
            deps,
            state,
            fetch_head,
            _extents_lock: extents_lock,
        })
    }

    pub fn dir(&self) -> &JournalDir {
        &self.dir
    }

    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    /// Run every URL round, write FETCH_HEAD and plan the epilogue
    pub fn fetch(mut self) -> Result<FetchReport, FetchError> {
        let start_offset = self.state.processed_offset();
        let mut urls = Vec::with_capacity(self.remote.urls.len());

        for url in self.remote.urls.clone() {
            if !is_supported_url(&url) {
                tracing::warn!(remote = %self.remote.name, %url, "unsupported URL scheme, skipping");
                urls.push(UrlReport {
                    skipped: true,
                    ..UrlReport::new(&url)
                });
                continue;
            }
            let report = self.fetch_url(&url)?;
            urls.push(report);
        }
        self.state.store(true)?;

        let mut fetch_head_written = false;
        if let Some(fetch_head) = &self.fetch_head {
            fetch_head.write(&self.layout.fetch_head_file())?;
            fetch_head_written = true;
        }

        let processed_offset = self.state.processed_offset();
        let mut epilogue = EpiloguePlan::new(self.layout.git_dir(), self.config.fetch.merge_wait);
        if processed_offset > start_offset && !self.options.no_extract {
            epilogue.schedule_repack(&self.config.fetch);
        }
        epilogue.schedule_hook(&self.layout, self.options.no_extract);

        Ok(FetchReport {
            remote: self.remote.name.clone(),
            mirror: self.mirror,
            urls,
            start_offset,
            processed_offset,
            fetch_head_written,
            epilogue,
        })
    }

    fn fetch_url(&mut self, url: &str) -> Result<UrlReport, FetchError> {
        let mut report = UrlReport::new(url);
        let extents_url = journal_url(url, EXTENTS_FILE);

        match self.download(&extents_url, &self.dir.extents(), 0) {
            Ok(bytes) => report.new_extents = bytes / EXTENT_LEN as u64,
            Err(FetchError::Http(e)) => {
                tracing::warn!(remote = %self.remote.name, url = %extents_url, error = %e, "extents fetch failed");
                report.extents_error = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }
        self.state.refresh()?;

        // Refs staged before an upgrade notice still land.
        let (mut batch, upgrade) = self.replay(url, &mut report)?;
        report.tips_extracted = batch.len();
        let applied = RefApplier::new(
            &self.deps.refs,
            &self.remote.name,
            self.layout.ref_update_log(),
        )
        .apply(batch.take())?;
        if applied.failed > 0 {
            tracing::warn!(
                remote = %self.remote.name,
                failed = applied.failed,
                log = %self.layout.ref_update_log().display(),
                "some ref updates failed, but continuing"
            );
        }
        report.ref_failures = applied.failed;
        self.state.store(false)?;

        if let Some(required) = upgrade {
            return Err(FetchError::UpgradeRequired {
                required,
                supported: WIRE_VERSION,
            });
        }
        if self.mirror {
            if let Some(last) = self.state.last_extent() {
                store_metadata(&self.dir, &JournalMetadata { serial: last.serial })?;
            }
        }
        Ok(report)
    }

    /// Append everything past the local committed length of `path`
    ///
    /// Bytes that arrived are committed even when the transfer fails
    /// midway, so the next attempt resumes from there.
    fn download(
        &self,
        url: &str,
        path: &std::path::Path,
        discarded: u64,
    ) -> Result<u64, FetchError> {
        let mut file = SafeAppendFile::open(path)?;
        let start = discarded + file.committed_len();
        let Some(mut body) = self.deps.fetcher.fetch_from(url, start)? else {
            tracing::debug!(%url, start, "already up to date");
            return Ok(0);
        };
        let copied = io::copy(&mut body, &mut file).and_then(|n| file.flush().map(|()| n));
        file.commit()?;
        let copied = copied.map_err(|source| gj_adapters::HttpError::Io {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(%url, start, bytes = copied, "downloaded");
        Ok(copied)
    }

    fn open_segment(
        &self,
        url: &str,
        serial: u32,
        discarded: u64,
    ) -> Result<OpenSegment, FetchError> {
        let path = self.dir.segment(serial);
        let segment_url = journal_url(url, &segment_file_name(serial));
        self.download(&segment_url, &path, discarded)?;
        Ok(OpenSegment {
            serial,
            reader: SafeAppendReader::open(&path)?,
            discarded,
            advanced: false,
        })
    }

    /// Replayed segments are dropped unless this replica keeps them for
    /// its own readers
    fn close_segment(&self, segment: OpenSegment) -> Result<(), FetchError> {
        if self.mirror || self.options.no_extract || !segment.advanced {
            return Ok(());
        }
        safe_append::unlink(&self.dir.segment(segment.serial))?;
        tracing::debug!(serial = segment.serial, "segment replayed, unlinked");
        Ok(())
    }

    fn replay(
        &mut self,
        url: &str,
        report: &mut UrlReport,
    ) -> Result<(RefBatch, Option<u16>), FetchError> {
        let mut batch = RefBatch::new();
        let pending = self.state.pending();
        if pending == 0 {
            return Ok((batch, None));
        }
        let first = self.state.next_index();
        tracing::info!(remote = %self.remote.name, first, pending, "replaying extents");

        let mut extents = ExtentsReader::open(&self.dir.extents())?;
        let last = self.state.last_extent();
        let mut serial = last.map_or(0, |e| e.serial);
        let mut discarded = match (self.mirror, last) {
            (false, Some(e)) => e.end(),
            _ => 0,
        };
        let title = if self.options.no_extract {
            "Buffering content"
        } else {
            "Replaying transactions"
        };
        let mut progress = if self.options.progress {
            Progress::new(Some(io::stderr()), title, pending)
        } else {
            Progress::hidden()
        };

        let mut segment: Option<OpenSegment> = None;
        let mut staged_pack: Option<ObjectId> = None;
        let mut upgrade = None;
        let mut done = 0;

        for index in first..first + pending {
            let extent = extents.read(index)?;
            if extent.serial < serial {
                return Err(FetchError::OutOfOrder {
                    index,
                    serial: extent.serial,
                    current: serial,
                });
            }
            tracing::trace!(index, %extent, "extent");

            if segment.as_ref().map(|s| s.serial) != Some(extent.serial) {
                if let Some(done) = segment.take() {
                    self.close_segment(done)?;
                }
                if extent.serial != serial {
                    serial = extent.serial;
                    discarded = 0;
                }
                segment = Some(self.open_segment(url, serial, discarded)?);
            }
            let Some(open) = segment.as_mut() else {
                break;
            };
            if extent.end() > open.journal_size() {
                tracing::warn!(
                    %extent,
                    journal_size = open.journal_size(),
                    "extents past journal, stopping"
                );
                report.stopped_early = true;
                break;
            }

            done += 1;
            progress.update(done);
            if self.options.no_extract {
                continue;
            }

            match self.replay_entry(open, &extent, &mut batch, &mut staged_pack)? {
                Step::Advance => {
                    self.state.advance(index, extent)?;
                    open.advanced = true;
                    report.replayed += 1;
                }
                Step::Hold => {}
                Step::Upgrade(required) => {
                    tracing::warn!(
                        required,
                        supported = WIRE_VERSION,
                        "journal requires a newer client"
                    );
                    upgrade = Some(required);
                    break;
                }
            }
        }
        progress.finish(done);

        if let Some(pack) = staged_pack {
            tracing::info!(%pack, "pack waits for its index");
        }
        if let Some(open) = segment.take() {
            self.close_segment(open)?;
        }
        Ok((batch, upgrade))
    }

    fn replay_entry(
        &mut self,
        segment: &mut OpenSegment,
        extent: &ExtentRecord,
        batch: &mut RefBatch,
        staged_pack: &mut Option<ObjectId>,
    ) -> Result<Step, FetchError> {
        let offset = segment.local_offset(extent)?;
        let mismatch = |reason: String| FetchError::EntryMismatch {
            serial: extent.serial,
            offset: extent.offset,
            reason,
        };

        let mut raw = [0u8; HEADER_LEN];
        segment.reader.read_exact_at(offset, &mut raw)?;
        let header = EntryHeader::decode(&raw).map_err(|e| mismatch(e.to_string()))?;
        if header.opcode != extent.opcode {
            return Err(mismatch(format!(
                "header says {}, extent says {}",
                header.opcode.name(),
                extent.opcode.name()
            )));
        }
        if header.entry_len() != u64::from(extent.length) {
            return Err(mismatch(format!(
                "entry is {} bytes, extent covers {}",
                header.entry_len(),
                extent.length
            )));
        }
        let payload_at = offset + HEADER_LEN as u64;
        let payload_len = u64::from(header.payload_len);

        if header.opcode != Opcode::Index {
            if let Some(orphan) = staged_pack.take() {
                self.drop_orphan(&orphan)?;
            }
        }

        match header.opcode {
            Opcode::Pack => {
                if self.deps.objects.has_pack(&header.id)? {
                    tracing::debug!(pack = %header.id, "pack already installed");
                } else {
                    let mut body = segment.reader.range(payload_at, payload_len)?;
                    self.deps.objects.stage_pack(&header.id, &mut body)?;
                }
                *staged_pack = Some(header.id);
                Ok(Step::Hold)
            }
            Opcode::Index => {
                match staged_pack.take() {
                    Some(pack) if pack == header.id => {
                        if self.deps.objects.has_staged_pack(&pack) {
                            let index = read_payload(segment, payload_at, payload_len)?;
                            self.deps.objects.install_pack(&pack, &index)?;
                        }
                    }
                    other => {
                        if let Some(orphan) = other {
                            self.drop_orphan(&orphan)?;
                        }
                        tracing::warn!(pack = %header.id, "Index {} without pack; skipping.", header.id);
                    }
                }
                Ok(Step::Advance)
            }
            Opcode::Ref => {
                let raw_name = read_payload(segment, payload_at, payload_len)?;
                let name = String::from_utf8(raw_name)
                    .map_err(|_| mismatch("ref name is not UTF-8".to_string()))?;
                let replica = replica_ref_name(&self.remote.name, &name, self.mirror);
                if let Some(fetch_head) = self.fetch_head.as_mut() {
                    fetch_head.record(&name, &replica, header.id);
                }
                batch.stage(&replica, header.id);
                Ok(Step::Advance)
            }
            Opcode::Upgrade => {
                let required = decode_wire_version(&header.id);
                if required > WIRE_VERSION {
                    Ok(Step::Upgrade(required))
                } else {
                    tracing::debug!(required, "wire version announcement");
                    Ok(Step::Advance)
                }
            }
        }
    }

    fn drop_orphan(&self, pack: &ObjectId) -> Result<(), FetchError> {
        tracing::warn!(%pack, "pack without index, discarding");
        self.deps.objects.discard_staged(pack)?;
        Ok(())
    }
}

fn read_payload(segment: &mut OpenSegment, at: u64, len: u64) -> Result<Vec<u8>, FetchError> {
    let size = usize::try_from(len).map_err(|_| FetchError::EntryMismatch {
        serial: segment.serial,
        offset: 0,
        reason: format!("payload of {} bytes does not fit in memory", len),
    })?;
    let mut buf = vec![0u8; size];
    segment.reader.read_exact_at(at, &mut buf)?;
    Ok(buf)
}

/// Exclusive advisory lock on the local `extents.bin`
fn lock_extents(dir: &JournalDir) -> Result<File, FetchError> {
    let path = dir.extents();
    let file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(&path)
        .map_err(FetchError::io(&path))?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(FetchError::AlreadyFetching(path))
        }
        Err(e) => Err(FetchError::io(&path)(e)),
    }
}

/// Journals fetched before size markers existed get one per file, sized
/// to the file as it stands
fn backfill_markers(dir: &JournalDir) -> Result<(), FetchError> {
    if size_path(&dir.extents()).exists() {
        return Ok(());
    }
    let entries = std::fs::read_dir(dir.path()).map_err(FetchError::io(dir.path()))?;
    for entry in entries {
        let entry = entry.map_err(FetchError::io(dir.path()))?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(".bin") || name == STATE_FILE || name == METADATA_FILE || !path.is_file()
        {
            continue;
        }
        if backfill_size_marker(&path)? {
            tracing::info!(path = %path.display(), "backfilled size marker");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
