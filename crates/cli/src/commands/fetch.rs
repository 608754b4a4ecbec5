// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj fetch <remote>` - download a remote's journal and replay it

use super::{epilogue, Repo};
use crate::error::CliError;
use anyhow::Result;
use clap::Args;
use gj_adapters::{FsObjectStore, FsRefStore, ProcessRunner, SchemeFetcher, TracedFetcher, TracedRunner};
use gj_engine::{perform, FetchDeps, FetchOptions, FetchReport, ReplicationSession};
use std::io::{IsTerminal, Write};

#[derive(Args)]
pub struct FetchArgs {
    /// Remote name from journal.toml
    pub remote: String,

    /// Names to mark for merge in FETCH_HEAD
    pub refspecs: Vec<String>,

    /// Keep segments and metadata so this repository can serve the journal
    #[arg(long)]
    pub mirror: bool,

    /// Download extents and segments without replaying them
    #[arg(long)]
    pub no_extract: bool,

    /// Force the progress meter on
    #[arg(long, overrides_with = "no_progress")]
    pub progress: bool,

    /// Force the progress meter off
    #[arg(long)]
    pub no_progress: bool,

    /// Print nothing on stdout
    #[arg(short, long)]
    pub quiet: bool,

    /// Run the epilogue before returning instead of detaching it
    #[arg(long)]
    pub foreground: bool,

    #[arg(long)]
    pub disable_fetch_head: bool,
}

impl FetchArgs {
    fn show_progress(&self) -> bool {
        if self.progress {
            true
        } else if self.no_progress || self.quiet {
            false
        } else {
            std::io::stderr().is_terminal()
        }
    }
}

/// The report lines the fetch prints on stdout
fn summarize(out: &mut impl Write, report: &FetchReport) -> std::io::Result<()> {
    for url in report.urls.iter().filter(|u| !u.skipped) {
        writeln!(out, "{}: Updating from {}", report.remote, url.url)?;
        if url.extents_error.is_some() {
            continue;
        }
        if url.new_extents > 0 {
            writeln!(
                out,
                "{}: Extents updated: {} transactions",
                report.remote, url.new_extents
            )?;
        } else {
            writeln!(out, "{}: Extents already up-to-date", report.remote)?;
        }
    }
    Ok(())
}

pub async fn run(repo: &Repo, args: FetchArgs) -> Result<i32> {
    let remote = repo
        .config
        .remote(&args.remote)
        .map_err(|e| CliError::unknown_remote(&args.remote, e))?;
    let options = FetchOptions {
        mirror: args.mirror,
        no_extract: args.no_extract,
        progress: args.show_progress(),
        disable_fetch_head: args.disable_fetch_head,
        refspecs: args.refspecs.clone(),
    };
    let deps = FetchDeps {
        fetcher: TracedFetcher::new(SchemeFetcher::new()),
        objects: FsObjectStore::new(repo.layout.pack_dir()),
        refs: FsRefStore::new(repo.layout.git_dir()),
    };

    let report = ReplicationSession::open(
        repo.layout.clone(),
        repo.config.clone(),
        remote,
        options,
        deps,
    )
    .and_then(ReplicationSession::fetch)
    .map_err(|e| CliError::from_fetch(&args.remote, e))?;

    if !args.quiet {
        summarize(&mut std::io::stdout().lock(), &report)?;
    }
    for url in report.urls.iter() {
        if let Some(error) = &url.extents_error {
            eprintln!("error: {}: fetching extents failed: {}", report.remote, error);
        }
        if url.ref_failures > 0 {
            eprintln!(
                "warning: some ref updates failed, but continuing... See {}",
                repo.layout.ref_update_log().display()
            );
        }
    }

    let mut code = report.exit_code();
    let mut plan = report.epilogue;
    if plan.is_empty() {
        return Ok(code);
    }
    if args.foreground || report.mirror {
        let outcome = perform(&plan, &TracedRunner::new(ProcessRunner::new())).await;
        if let Some(label) = outcome.failed {
            eprintln!("error: epilogue command '{}' failed", label);
            code = code.max(1);
        }
    } else {
        let pid = epilogue::detach(&repo.layout, &mut plan)?;
        tracing::info!(pid, actions = plan.len(), "epilogue detached");
    }
    Ok(code)
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
