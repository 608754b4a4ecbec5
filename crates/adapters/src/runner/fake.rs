// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake action runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ActionOutcome, ActionRunner, RunError};
use async_trait::async_trait;
use gj_core::EpilogueAction;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Recorded run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCall {
    pub action: EpilogueAction,
    pub cwd: PathBuf,
}

/// Records actions instead of running them; exit codes are scripted per label
#[derive(Clone, Default)]
pub struct FakeActionRunner {
    calls: Arc<Mutex<Vec<RunCall>>>,
    exit_codes: Arc<Mutex<HashMap<String, i32>>>,
}

impl FakeActionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make actions with `label` exit with `code`
    pub fn set_exit_code(&self, label: &str, code: i32) {
        self.exit_codes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(label.to_string(), code);
    }

    pub fn calls(&self) -> Vec<RunCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Labels of the actions run, in order
    pub fn labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|call| call.action.label)
            .collect()
    }
}

#[async_trait]
impl ActionRunner for FakeActionRunner {
    async fn run(&self, action: &EpilogueAction, cwd: &Path) -> Result<ActionOutcome, RunError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RunCall {
                action: action.clone(),
                cwd: cwd.to_path_buf(),
            });
        let code = self
            .exit_codes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&action.label)
            .copied()
            .unwrap_or(0);
        Ok(ActionOutcome { code: Some(code) })
    }
}
