// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::http::{HttpError, RangeBody, RangeFetcher};
use crate::runner::{ActionOutcome, ActionRunner, RunError};
use async_trait::async_trait;
use gj_core::EpilogueAction;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any RangeFetcher
#[derive(Debug, Clone)]
pub struct TracedFetcher<F> {
    inner: F,
}

impl<F> TracedFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: RangeFetcher> RangeFetcher for TracedFetcher<F> {
    fn fetch_from(&self, url: &str, start: u64) -> Result<Option<RangeBody>, HttpError> {
        let span = tracing::info_span!("http.fetch", url, start);
        let _guard = span.enter();

        let begin = std::time::Instant::now();
        let result = self.inner.fetch_from(url, start);
        let elapsed_ms = begin.elapsed().as_millis() as u64;

        match &result {
            Ok(Some(_)) => tracing::debug!(elapsed_ms, "response open"),
            Ok(None) => tracing::debug!(elapsed_ms, "up to date"),
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "fetch failed"),
        }
        result
    }
}

/// Wrapper that adds tracing to any ActionRunner
#[derive(Clone)]
pub struct TracedRunner<R> {
    inner: R,
}

impl<R> TracedRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: ActionRunner> ActionRunner for TracedRunner<R> {
    async fn run(&self, action: &EpilogueAction, cwd: &Path) -> Result<ActionOutcome, RunError> {
        let span = tracing::info_span!("epilogue.run", label = %action.label);
        async move {
            tracing::info!(argv = ?action.argv, cwd = %cwd.display(), "starting");

            // Precondition: cwd must exist
            if !cwd.is_dir() {
                tracing::error!("working directory does not exist");
                return Err(RunError::Spawn {
                    program: action.program().unwrap_or_default().to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("working directory does not exist: {}", cwd.display()),
                    ),
                });
            }

            let start = std::time::Instant::now();
            let result = self.inner.run(action, cwd).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(outcome) if outcome.success() => tracing::info!(elapsed_ms, "action finished"),
                Ok(outcome) => tracing::warn!(elapsed_ms, code = ?outcome.code, "action failed"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "action did not run"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
