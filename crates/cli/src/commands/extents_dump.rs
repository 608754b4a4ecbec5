// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj extents-dump` - raw extent records with their byte positions

use super::Repo;
use anyhow::Result;
use clap::Args;
use gj_storage::{list_extents, RawExtent, RemoteState};
use std::io::Write;

#[derive(Args)]
pub struct ExtentsDumpArgs {
    /// Read the local copy of this remote's journal and show its cursor
    #[arg(long)]
    pub remote: Option<String>,
}

fn render(raw: &RawExtent) -> String {
    match &raw.decoded {
        Ok(extent) => format!("{}: {}", raw.position(), extent),
        Err(e) => format!("{}: invalid record: {}", raw.position(), e),
    }
}

pub fn run(repo: &Repo, args: ExtentsDumpArgs) -> Result<i32> {
    let dir = repo.journal_dir(args.remote.as_deref())?;
    let mut out = std::io::stdout().lock();
    if args.remote.is_some() {
        writeln!(out, "processed_offset: {}", RemoteState::peek(&dir)?)?;
    }
    for raw in list_extents(&dir)? {
        writeln!(out, "{}", render(&raw))?;
    }
    Ok(0)
}

#[cfg(test)]
#[path = "extents_dump_tests.rs"]
mod tests;
