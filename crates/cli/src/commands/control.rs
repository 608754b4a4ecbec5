// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj control` - serial and pack log maintenance

use super::Repo;
use anyhow::Result;
use clap::Args;
use gj_core::{ObjectId, WIRE_VERSION};
use gj_storage::{ensure_metadata, require_metadata, JournalContext, PackLog};
use std::io::{BufRead, Write};

#[derive(Args)]
#[command(group(
    clap::ArgGroup::new("action")
        .required(true)
        .args(["show_serial", "increment_serial", "wire_version", "packlog_append", "packlog_dump"]),
))]
pub struct ControlArgs {
    /// Print the current serial in hex
    #[arg(long)]
    pub show_serial: bool,

    /// Close the current segment and start the next one
    #[arg(long)]
    pub increment_serial: bool,

    /// Print the supported wire version
    #[arg(long = "version")]
    pub wire_version: bool,

    /// Record the pack hashes read from stdin as journaled
    #[arg(long)]
    pub packlog_append: bool,

    /// Print the pack log
    #[arg(long)]
    pub packlog_dump: bool,
}

/// Valid pack ids from `input`; anything else is reported and dropped
fn read_pack_ids(input: impl BufRead) -> Result<Vec<ObjectId>> {
    let mut ids = Vec::new();
    for line in input.lines() {
        let line = line?;
        let hex = line.trim();
        if hex.is_empty() {
            continue;
        }
        match hex.parse::<ObjectId>() {
            Ok(id) => ids.push(id),
            Err(e) => eprintln!("warning: skipping `{}`: {}", hex, e),
        }
    }
    Ok(ids)
}

pub fn run(repo: &Repo, args: ControlArgs) -> Result<i32> {
    let dir = repo.journal_dir(None)?;
    let mut out = std::io::stdout().lock();

    if args.wire_version {
        writeln!(out, "{}", WIRE_VERSION)?;
    } else if args.show_serial {
        writeln!(out, "{:x}", require_metadata(&dir)?.serial)?;
    } else if args.increment_serial {
        let mut ctx = JournalContext::open(dir, repo.writer_options())?;
        let serial = ctx.increment_serial()?;
        ctx.close()?;
        writeln!(out, "{:x}", serial)?;
    } else if args.packlog_append {
        let ids = read_pack_ids(std::io::stdin().lock())?;
        ensure_metadata(&dir)?;
        let added = PackLog::new(&dir).append(&ids)?;
        tracing::info!(read = ids.len(), added, "pack log updated");
    } else if args.packlog_dump {
        for id in PackLog::new(&dir).list()? {
            writeln!(out, "{}", id)?;
        }
    }
    Ok(0)
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
