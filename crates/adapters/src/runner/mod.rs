// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution of epilogue actions

mod noop;
mod process;

pub use noop::NoOpRunner;
pub use process::ProcessRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeActionRunner, RunCall};

use async_trait::async_trait;
use gj_core::EpilogueAction;
use std::path::Path;
use thiserror::Error;

/// Errors from running an action
#[derive(Debug, Error)]
pub enum RunError {
    #[error("action '{0}' has an empty command line")]
    EmptyCommand(String),
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open stdin file {}: {source}", path.display())]
    Stdin {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How an action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    /// `None` when killed by a signal
    pub code: Option<i32>,
}

impl ActionOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Adapter for running epilogue commands
#[async_trait]
pub trait ActionRunner: Clone + Send + Sync + 'static {
    /// Run one action to completion with `cwd` as working directory
    async fn run(&self, action: &EpilogueAction, cwd: &Path) -> Result<ActionOutcome, RunError>;
}
