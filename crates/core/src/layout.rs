// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout of a repository and its journal directories

use std::path::{Path, PathBuf};

pub const METADATA_FILE: &str = "metadata.bin";
pub const EXTENTS_FILE: &str = "extents.bin";
pub const INTEGRITY_FILE: &str = "integrity.bin";
pub const STATE_FILE: &str = "state.bin";
pub const PACKLOG_FILE: &str = "packlog.bin";

pub const REF_UPDATE_LOG: &str = "journal-fetch-ref-update.log";
pub const EPILOGUE_LOG: &str = "journal-fetch-epilogue.log";
pub const EPILOGUE_PLAN_PREFIX: &str = "journal-fetch-epilogue";
pub const POST_FETCH_HOOK: &str = "post-journal-fetch";

/// File name of the segment holding `serial`
pub fn segment_file_name(serial: u32) -> String {
    format!("{:x}.bin", serial)
}

/// Paths derived from a repository's git directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    git_dir: PathBuf,
}

impl RepoLayout {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.git_dir.join("objects")
    }

    pub fn pack_dir(&self) -> PathBuf {
        self.objects_dir().join("pack")
    }

    /// Journal written by this repository when it acts as a producer
    pub fn journal_dir(&self) -> JournalDir {
        JournalDir::new(self.objects_dir().join("journals"))
    }

    /// Local copy of a remote's journal
    ///
    /// Bare replicas and mirrors keep it in the shared journal directory,
    /// so they can in turn be served to further replicas.
    pub fn remote_journal_dir(&self, remote: &str, bare: bool, mirror: bool) -> JournalDir {
        let shared = self.journal_dir();
        if bare || mirror {
            shared
        } else {
            JournalDir::new(shared.path().join(remote))
        }
    }

    pub fn head_file(&self) -> PathBuf {
        self.git_dir.join("HEAD")
    }

    pub fn fetch_head_file(&self) -> PathBuf {
        self.git_dir.join("FETCH_HEAD")
    }

    pub fn hook(&self, name: &str) -> PathBuf {
        self.git_dir.join("hooks").join(name)
    }

    pub fn ref_update_log(&self) -> PathBuf {
        self.git_dir.join(REF_UPDATE_LOG)
    }

    pub fn epilogue_log(&self) -> PathBuf {
        self.git_dir.join(EPILOGUE_LOG)
    }

    /// Plan handed to the detached epilogue of the fetch running as `pid`
    pub fn epilogue_plan(&self, pid: u32) -> PathBuf {
        self.git_dir
            .join(format!("{}-{}.json", EPILOGUE_PLAN_PREFIX, pid))
    }
}

/// A directory holding metadata, segments, extents and integrity files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDir {
    path: PathBuf,
}

impl JournalDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> PathBuf {
        self.path.join(METADATA_FILE)
    }

    pub fn extents(&self) -> PathBuf {
        self.path.join(EXTENTS_FILE)
    }

    pub fn integrity(&self) -> PathBuf {
        self.path.join(INTEGRITY_FILE)
    }

    pub fn state(&self) -> PathBuf {
        self.path.join(STATE_FILE)
    }

    pub fn packlog(&self) -> PathBuf {
        self.path.join(PACKLOG_FILE)
    }

    pub fn segment(&self, serial: u32) -> PathBuf {
        self.path.join(segment_file_name(serial))
    }
}

/// URL of a file inside a published repository's journal directory
pub fn journal_url(base: &str, file: &str) -> String {
    format!("{}/objects/journals/{}", base.trim_end_matches('/'), file)
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
