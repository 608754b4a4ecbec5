// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-replay actions
//!
//! A fetch builds an [`EpiloguePlan`]; the plan runs either in the
//! foreground or, serialized to JSON, in a detached process.

use crate::error::EpilogueError;
use gj_adapters::ActionRunner;
use gj_core::config::FetchSection;
use gj_core::layout::POST_FETCH_HOOK;
use gj_core::{EpilogueAction, RepoLayout};
use gj_storage::write_atomically;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Actions to run after replay, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpiloguePlan {
    /// Working directory for every action
    pub cwd: PathBuf,
    pub actions: Vec<EpilogueAction>,
    /// Process (usually the pull that invoked the fetch) to outlive first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_pid: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub merge_wait: Duration,
}

impl EpiloguePlan {
    pub fn new(cwd: impl Into<PathBuf>, merge_wait: Duration) -> Self {
        Self {
            cwd: cwd.into(),
            actions: Vec::new(),
            wait_for_pid: None,
            merge_wait,
        }
    }

    pub fn push(&mut self, action: EpilogueAction) {
        tracing::debug!(label = %action.label, "scheduled epilogue action");
        self.actions.push(action);
    }

    pub fn schedule_repack(&mut self, fetch: &FetchSection) {
        self.push(EpilogueAction::repack(
            &fetch.repack_command,
            fetch.repack_size_limit,
        ));
    }

    /// Schedule the post-fetch hook when it is an executable file
    pub fn schedule_hook(&mut self, layout: &RepoLayout, no_extract: bool) -> bool {
        let hook = layout.hook(POST_FETCH_HOOK);
        if !is_executable(&hook) {
            return false;
        }
        self.push(EpilogueAction::hook(&hook, no_extract));
        true
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<(), EpilogueError> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| EpilogueError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomically(path, &json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, EpilogueError> {
        let bytes = std::fs::read(path).map_err(|source| EpilogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| EpilogueError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// How an epilogue run ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpilogueReport {
    /// Actions started, including the one that failed
    pub ran: usize,
    /// Label of the non-ignorable action that stopped the sequence
    pub failed: Option<String>,
}

impl EpilogueReport {
    pub fn success(&self) -> bool {
        self.failed.is_none()
    }
}

/// Run the plan's actions in order, stopping at the first failure that
/// may not be ignored
pub async fn perform<R: ActionRunner>(plan: &EpiloguePlan, runner: &R) -> EpilogueReport {
    let mut report = EpilogueReport::default();
    let total = plan.actions.len();
    tracing::info!(total, "epilogue starting");

    for (i, action) in plan.actions.iter().enumerate() {
        report.ran += 1;
        tracing::info!(
            label = %action.label,
            argv = ?action.argv,
            "epilogue ({} of {}) starting",
            i + 1,
            total
        );
        let failing = match runner.run(action, &plan.cwd).await {
            Ok(outcome) if outcome.success() => false,
            Ok(outcome) if action.ignore_exit_code => {
                tracing::warn!(label = %action.label, code = ?outcome.code, "command exited dirty, ignoring the failure");
                false
            }
            Ok(outcome) => {
                tracing::warn!(label = %action.label, code = ?outcome.code, "command exited dirty, marking a failure");
                true
            }
            Err(e) => {
                tracing::warn!(label = %action.label, error = %e, "unable to start command");
                true
            }
        };
        if failing {
            tracing::warn!(label = %action.label, "epilogue command failed");
            report.failed = Some(action.label.clone());
            break;
        }
    }
    report
}

#[cfg(test)]
#[path = "epilogue_tests.rs"]
mod tests;
