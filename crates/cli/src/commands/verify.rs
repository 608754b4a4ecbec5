// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj verify <serial>` - check extents against the journal bytes

use super::{parse_serial, Repo};
use anyhow::Result;
use clap::Args;
use gj_storage::{verify_extents, verify_integrity, VerifyReport};
use std::io::Write;

#[derive(Args)]
pub struct VerifyArgs {
    /// Segment whose headers are checked, in hex
    #[arg(value_parser = parse_serial)]
    pub serial: u32,

    /// Verify the local copy of this remote's journal
    #[arg(long)]
    pub remote: Option<String>,

    /// Also check the integrity chain
    #[arg(long)]
    pub integrity: bool,
}

fn print(out: &mut impl Write, report: &VerifyReport) -> std::io::Result<()> {
    for line in &report.lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

pub fn run(repo: &Repo, args: VerifyArgs, verbose: bool) -> Result<i32> {
    let dir = repo.journal_dir(args.remote.as_deref())?;
    let mut out = std::io::stdout().lock();

    let mut reports = vec![verify_extents(&dir, args.serial, verbose)?];
    if args.integrity {
        reports.push(verify_integrity(&dir, verbose)?);
    }

    let mut errors = 0;
    for report in &reports {
        print(&mut out, report)?;
        errors += report.errors;
    }
    let checked = reports.first().map_or(0, |r| r.checked);
    tracing::info!(checked, errors, "verify finished");
    Ok(if errors == 0 { 0 } else { 1 })
}
