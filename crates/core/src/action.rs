// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-replay actions run after a fetch completes

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One external command scheduled to run after replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpilogueAction {
    /// Short name used in logs
    pub label: String,
    pub argv: Vec<String>,
    /// File fed to the command's stdin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<PathBuf>,
    /// A non-zero exit is logged but does not stop later actions
    #[serde(default)]
    pub ignore_exit_code: bool,
}

impl EpilogueAction {
    /// Pack consolidation trigger
    pub fn repack(command: &[String], size_limit: u64) -> Self {
        let mut argv = command.to_vec();
        argv.push("--size-upper-bound".to_string());
        argv.push(size_limit.to_string());
        Self {
            label: "repack".to_string(),
            argv,
            stdin: None,
            ignore_exit_code: true,
        }
    }

    pub fn hook(path: &Path, no_extract: bool) -> Self {
        let mut argv = vec![path.display().to_string()];
        if no_extract {
            argv.push("--no-extract".to_string());
        }
        Self {
            label: "post-journal-fetch".to_string(),
            argv,
            stdin: None,
            ignore_exit_code: false,
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
