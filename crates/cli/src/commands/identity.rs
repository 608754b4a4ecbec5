// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj identity` - where a journal copy stands

use super::Repo;
use anyhow::Result;
use clap::Args;
use gj_core::ExtentRecord;
use gj_storage::RemoteState;
use std::io::Write;

#[derive(Args)]
pub struct IdentityArgs {
    /// Describe the local copy of this remote's journal
    #[arg(long)]
    pub remote: Option<String>,
}

fn describe(processed_offset: u32, last: Option<ExtentRecord>) -> String {
    let serial = last.map_or(0, |extent| extent.serial);
    format!(
        "journal_serial={:x} extents_processed_offset={}",
        serial, processed_offset
    )
}

pub fn run(repo: &Repo, args: IdentityArgs, verbose: bool) -> Result<i32> {
    let dir = repo.journal_dir(args.remote.as_deref())?;
    let mut state = RemoteState::load(&dir)?;
    state.refresh()?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", describe(state.processed_offset(), state.last_extent()))?;
    if verbose {
        match state.last_extent() {
            Some(extent) => writeln!(out, "last_extent={}", extent)?,
            None => writeln!(out, "last_extent=none")?,
        }
    }
    Ok(0)
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
