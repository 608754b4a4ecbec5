// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber setup: stderr for interactive commands, the epilogue log
//! for the detached epilogue

use anyhow::{Context, Result};
use gj_core::layout::EPILOGUE_LOG;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "GJ_LOG";

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level(verbose)))
}

pub fn init_stderr(verbose: u8) {
    // A second init (tests, nested calls) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Append to `<git-dir>/journal-fetch-epilogue.log`; keep the guard alive
/// until the process is done logging
pub fn init_file(git_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(git_dir)
        .with_context(|| format!("cannot create {}", git_dir.display()))?;
    let appender = tracing_appender::rolling::never(git_dir, EPILOGUE_LOG);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::registry()
        .with(filter(1))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init();
    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
