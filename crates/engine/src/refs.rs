// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staged ref mutations and their two-phase application
//!
//! Ref stores apply creates before deletes inside one transaction, which
//! turns "delete `a/b`, create `a/b/c`" into a directory/file conflict.
//! Replay therefore commits deletions first and creates/updates second.
//! Every ref about to be deleted or replaced is first copied under
//! `refs/to-be-deleted/<remote>/<n>` so its objects stay reachable while
//! the two transactions are in flight.

use crate::error::FetchError;
use gj_adapters::{RefError, RefStore, RefTransaction};
use gj_core::refname::validate_ref_name;
use gj_core::ObjectId;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// A ref tip read from the journal, already renamed for this replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRef {
    pub name: String,
    /// Null id deletes the ref
    pub tip: ObjectId,
}

/// Ordered batch of staged refs
///
/// Names compare case-insensitively; restaging a ref replaces its tip and
/// keeps its original position.
#[derive(Debug, Default)]
pub struct RefBatch {
    entries: Vec<StagedRef>,
    positions: HashMap<String, usize>,
}

impl RefBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, name: &str, tip: ObjectId) {
        let key = name.to_ascii_lowercase();
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos].tip = tip,
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(StagedRef {
                    name: name.to_string(),
                    tip,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StagedRef] {
        &self.entries
    }

    /// Hand out the staged refs, leaving the batch empty
    pub fn take(&mut self) -> Vec<StagedRef> {
        self.positions.clear();
        std::mem::take(&mut self.entries)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefOp {
    Create,
    Update,
    Delete,
}

impl RefOp {
    pub fn verb(self) -> &'static str {
        match self {
            RefOp::Create => "create",
            RefOp::Update => "update",
            RefOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone)]
struct Classified {
    staged: StagedRef,
    op: RefOp,
    /// Value before this batch, backed up when the ref is replaced
    current: Option<ObjectId>,
}

impl Classified {
    /// `<verb> <name> [<hex>]` as written to the update log
    fn describe(&self) -> String {
        let verb = self.op.verb();
        match self.op {
            RefOp::Create => format!("{} {} {}", verb, self.staged.name, self.staged.tip),
            RefOp::Update => format!("{} {} {} ", verb, self.staged.name, self.staged.tip),
            RefOp::Delete => format!("{} {} ", verb, self.staged.name),
        }
    }
}

/// Outcome of applying one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub failed: usize,
}

/// Applies staged batches for one remote
pub struct RefApplier<'a, R: RefStore> {
    store: &'a R,
    remote: &'a str,
    log_path: PathBuf,
    log: Option<File>,
}

impl<'a, R: RefStore> RefApplier<'a, R> {
    pub fn new(store: &'a R, remote: &'a str, log_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            remote,
            log_path: log_path.into(),
            log: None,
        }
    }

    fn backup_prefix(&self) -> String {
        format!("refs/to-be-deleted/{}/", self.remote)
    }

    fn quarantine_name(&self, tip: &ObjectId) -> String {
        format!("refs/failed-updates/{}/failed-{}", self.remote, tip)
    }

    fn log_line(&mut self, line: &str) -> Result<(), FetchError> {
        if self.log.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .map_err(FetchError::io(&self.log_path))?;
            self.log = Some(file);
        }
        let stamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        if let Some(file) = self.log.as_mut() {
            writeln!(file, "{} {}", stamp, line).map_err(FetchError::io(&self.log_path))?;
        }
        Ok(())
    }

    /// Record a failed mutation and park its tip where it stays reachable
    fn fail(&mut self, entry: &Classified, error: &RefError) -> Result<(), FetchError> {
        tracing::warn!(name = %entry.staged.name, error = %error, "ref update failed");
        if !entry.staged.tip.is_null() {
            let parked = self.quarantine_name(&entry.staged.tip);
            let mut tx = RefTransaction::new();
            let parked_result = tx
                .update(&parked, entry.staged.tip)
                .and_then(|()| self.store.commit(&tx));
            if let Err(e) = parked_result {
                tracing::warn!(name = %parked, error = %e, "failed to quarantine tip");
            }
        }
        self.log_line(&format!("{} failed", entry.describe()))
    }

    fn succeed(&mut self, entry: &Classified) -> Result<(), FetchError> {
        self.log_line(&format!("{} succeeded", entry.describe()))
    }

    /// Highest `n` among existing backups of this remote
    fn last_backup_index(&self) -> Result<Option<u64>, FetchError> {
        let prefix = self.backup_prefix();
        let mut last = None;
        for (name, _) in self.store.refs_with_prefix(&prefix)? {
            let suffix = name.strip_prefix(&prefix).unwrap_or(&name);
            match suffix.parse::<u64>() {
                Ok(n) => last = last.max(Some(n)),
                Err(_) => tracing::warn!(name = %name, "unexpected backup ref name, ignoring"),
            }
        }
        Ok(last)
    }

    /// Apply `staged` in two transactions, then drop the backups
    pub fn apply(&mut self, staged: Vec<StagedRef>) -> Result<ApplyReport, FetchError> {
        let mut report = ApplyReport::default();
        if staged.is_empty() {
            return Ok(report);
        }

        let mut valid = Vec::with_capacity(staged.len());
        for staged in staged {
            let current = validate_ref_name(&staged.name)
                .map_err(RefError::Name)
                .and_then(|()| self.store.read_ref(&staged.name));
            let (current, error) = match current {
                Ok(current) => (current, None),
                Err(e @ (RefError::Name(_) | RefError::Corrupt { .. })) => (None, Some(e)),
                Err(e) => return Err(e.into()),
            };
            let op = if staged.tip.is_null() {
                RefOp::Delete
            } else if current.is_some() {
                RefOp::Update
            } else {
                RefOp::Create
            };
            let entry = Classified {
                staged,
                op,
                current,
            };
            match error {
                None => valid.push(entry),
                Some(e) => {
                    self.fail(&entry, &e)?;
                    report.failed += 1;
                }
            }
        }

        let (deletes, writes): (Vec<Classified>, Vec<Classified>) =
            valid.into_iter().partition(|e| e.op == RefOp::Delete);

        // Phase one: back up outgoing values, delete
        let mut next_backup = self.last_backup_index()?.map_or(0, |n| n + 1);
        let mut backups = Vec::new();
        for entry in deletes.iter().chain(writes.iter()) {
            if let Some(current) = entry.current {
                let name = format!("{}{}", self.backup_prefix(), next_backup);
                next_backup += 1;
                backups.push((name, current));
            }
        }
        let mut phase_one = RefTransaction::new();
        for (name, id) in &backups {
            phase_one.update(name, *id)?;
        }
        for entry in &deletes {
            phase_one.delete(&entry.staged.name)?;
        }
        self.commit_phase(phase_one, &deletes, &backups, &mut report)?;

        // Phase two: creates and updates
        let mut phase_two = RefTransaction::new();
        for entry in &writes {
            phase_two.update(&entry.staged.name, entry.staged.tip)?;
        }
        self.commit_phase(phase_two, &writes, &[], &mut report)?;

        self.clear_backups();
        tracing::info!(
            applied = report.applied,
            failed = report.failed,
            "ref batch applied"
        );
        Ok(report)
    }

    /// Commit `tx`; when it fails, retry each entry on its own
    fn commit_phase(
        &mut self,
        tx: RefTransaction,
        entries: &[Classified],
        backups: &[(String, ObjectId)],
        report: &mut ApplyReport,
    ) -> Result<(), FetchError> {
        if tx.is_empty() {
            return Ok(());
        }
        match self.store.commit(&tx) {
            Ok(()) => {
                for entry in entries {
                    self.succeed(entry)?;
                }
                report.applied += entries.len();
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(error = %e, refs = entries.len(), "ref transaction failed, retrying one ref at a time");
            }
        }

        if !backups.is_empty() {
            let mut backup_tx = RefTransaction::new();
            for (name, id) in backups {
                backup_tx.update(name, *id)?;
            }
            if let Err(e) = self.store.commit(&backup_tx) {
                tracing::warn!(error = %e, "backing up existing refs failed");
            }
        }

        for entry in entries {
            let mut single = RefTransaction::new();
            match entry.op {
                RefOp::Delete => single.delete(&entry.staged.name)?,
                RefOp::Create | RefOp::Update => {
                    single.update(&entry.staged.name, entry.staged.tip)?
                }
            }
            match self.store.commit(&single) {
                Ok(()) => {
                    self.succeed(entry)?;
                    report.applied += 1;
                }
                Err(e) => {
                    self.fail(entry, &e)?;
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    fn clear_backups(&self) {
        let prefix = self.backup_prefix();
        let result = self.store.refs_with_prefix(&prefix).and_then(|refs| {
            let mut tx = RefTransaction::new();
            for (name, _) in refs {
                tx.delete(&name)?;
            }
            if tx.is_empty() {
                return Ok(());
            }
            self.store.commit(&tx)
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to delete back-up refs");
        }
    }
}

#[cfg(test)]
#[path = "refs_tests.rs"]
mod tests;
