// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod append;
pub mod control;
pub mod dump;
pub mod epilogue;
pub mod extents_dump;
pub mod fetch;
pub mod identity;
pub mod verify;

use crate::error::CliError;
use anyhow::Result;
use gj_core::refname::validate_remote_name;
use gj_core::{JournalConfig, JournalDir, RepoLayout};
use gj_storage::WriterOptions;
use std::path::Path;

/// The repository a command works on
pub struct Repo {
    pub layout: RepoLayout,
    pub config: JournalConfig,
}

impl Repo {
    pub fn open(git_dir: &Path) -> Result<Self> {
        if !git_dir.is_dir() {
            return Err(CliError::new(format!(
                "not a git repository: {}",
                git_dir.display()
            ))
            .with_suggestion("Pass --git-dir or set GIT_DIR")
            .into());
        }
        let config = JournalConfig::load(git_dir).map_err(|e| {
            CliError::new(e.to_string())
                .with_context(format!("while reading {}", git_dir.join("journal.toml").display()))
        })?;
        Ok(Self {
            layout: RepoLayout::new(git_dir),
            config,
        })
    }

    /// The local journal, or the local copy of `remote`'s journal
    pub fn journal_dir(&self, remote: Option<&str>) -> Result<JournalDir> {
        let Some(remote) = remote else {
            return Ok(self.layout.journal_dir());
        };
        validate_remote_name(remote)?;
        let mirror = self
            .config
            .remotes
            .get(remote)
            .is_some_and(|section| section.mirror);
        Ok(self
            .layout
            .remote_journal_dir(remote, self.config.journal.bare, mirror))
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            size_limit: self.config.journal.size_limit,
            integrity: self.config.journal.integrity,
            max_pack_size: self.config.journal.max_pack_size,
        }
    }
}

/// Serials are given in hex, as in segment file names
pub fn parse_serial(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid serial `{}`: {}", s, e))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
