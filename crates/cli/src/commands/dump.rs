// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj dump <serial>` - object ids listed by a segment's pack indices

use super::{parse_serial, Repo};
use anyhow::Result;
use clap::Args;
use gj_storage::dump_serial_objects;
use std::io::Write;

#[derive(Args)]
pub struct DumpArgs {
    /// Segment serial, in hex
    #[arg(value_parser = parse_serial)]
    pub serial: u32,

    /// Read the local copy of this remote's journal
    #[arg(long)]
    pub remote: Option<String>,
}

pub fn run(repo: &Repo, args: DumpArgs) -> Result<i32> {
    let dir = repo.journal_dir(args.remote.as_deref())?;
    let ids = dump_serial_objects(&dir, args.serial)?;
    let mut out = std::io::stdout().lock();
    for id in ids {
        writeln!(out, "{}", id)?;
    }
    Ok(0)
}
