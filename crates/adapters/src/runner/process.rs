// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process action runner

use super::{ActionOutcome, ActionRunner, RunError};
use async_trait::async_trait;
use gj_core::EpilogueAction;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs each action as a child process and waits for it
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionRunner for ProcessRunner {
    async fn run(&self, action: &EpilogueAction, cwd: &Path) -> Result<ActionOutcome, RunError> {
        let Some(program) = action.program() else {
            return Err(RunError::EmptyCommand(action.label.clone()));
        };

        let stdin = match &action.stdin {
            Some(path) => Stdio::from(std::fs::File::open(path).map_err(|source| {
                RunError::Stdin {
                    path: path.clone(),
                    source,
                }
            })?),
            None => Stdio::null(),
        };

        let status = Command::new(program)
            .args(action.args())
            .current_dir(cwd)
            .stdin(stdin)
            .status()
            .await
            .map_err(|source| RunError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(ActionOutcome {
            code: status.code(),
        })
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
