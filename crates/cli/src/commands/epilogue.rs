// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detached epilogue: the fetch saves its plan and re-executes itself as
//! `gj epilogue --plan <file>` in a new process group

use anyhow::{Context, Result};
use clap::Args;
use gj_adapters::{ProcessRunner, TracedRunner};
use gj_core::RepoLayout;
use gj_engine::{perform, EpiloguePlan};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Process that invoked the fetch as part of a pull
const PULL_PID_ENV: &str = "JOURNAL_PULL_PID";

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct EpilogueArgs {
    /// Plan written by `gj fetch`
    #[arg(long)]
    pub plan: PathBuf,
}

fn pull_pid() -> Option<u32> {
    std::env::var(PULL_PID_ENV).ok()?.trim().parse().ok()
}

/// Save the plan and start a detached `gj epilogue` for it
pub fn detach(layout: &RepoLayout, plan: &mut EpiloguePlan) -> Result<u32> {
    plan.wait_for_pid = pull_pid();
    let path = layout.epilogue_plan(std::process::id());
    plan.save(&path)?;

    let log_path = layout.epilogue_log();
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("cannot open {}", log_path.display()))?;
    let exe = std::env::current_exe().context("cannot locate the gj executable")?;

    let child = Command::new(exe)
        .arg("--git-dir")
        .arg(layout.git_dir())
        .arg("epilogue")
        .arg("--plan")
        .arg(&path)
        .stdin(Stdio::null())
        .stdout(log.try_clone()?)
        .stderr(log)
        .process_group(0)
        .spawn()
        .context("cannot start the epilogue process")?;
    Ok(child.id())
}

fn is_alive(pid: u32) -> bool {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => kill(Pid::from_raw(raw), None).is_ok(),
        _ => false,
    }
}

/// Wait for `pid` to exit, giving up after `limit`; `true` if it exited
pub async fn wait_for_exit(pid: u32, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while is_alive(pid) {
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    true
}

pub async fn run(args: EpilogueArgs) -> Result<i32> {
    let plan = EpiloguePlan::load(&args.plan)?;
    if let Err(e) = std::fs::remove_file(&args.plan) {
        tracing::debug!(path = %args.plan.display(), error = %e, "plan not removed");
    }

    if let Some(pid) = plan.wait_for_pid {
        tracing::info!(pid, wait = ?plan.merge_wait, "waiting for the pull to finish");
        if !wait_for_exit(pid, plan.merge_wait).await {
            tracing::warn!(pid, "pull still running, starting epilogue anyway");
        }
    }

    let report = perform(&plan, &TracedRunner::new(ProcessRunner::new())).await;
    tracing::info!(ran = report.ran, failed = ?report.failed, "epilogue done");
    Ok(if report.success() { 0 } else { 1 })
}

#[cfg(test)]
#[path = "epilogue_tests.rs"]
mod tests;
