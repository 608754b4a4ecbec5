// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op runner for when epilogue actions are disabled.

use super::{ActionOutcome, ActionRunner, RunError};
use async_trait::async_trait;
use gj_core::EpilogueAction;
use std::path::Path;

/// Runner that reports every action as successful without running it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpRunner;

impl NoOpRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionRunner for NoOpRunner {
    async fn run(&self, action: &EpilogueAction, _cwd: &Path) -> Result<ActionOutcome, RunError> {
        tracing::debug!(label = %action.label, "skipping action");
        Ok(ActionOutcome { code: Some(0) })
    }
}
