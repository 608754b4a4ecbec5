// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fatal errors with context and suggestions
//!
//! A [`CliError`] reaching `main` is printed as a `fatal:` line followed
//! by what is known about the cause and how to recover, and the process
//! exits with status 128.

use gj_engine::FetchError;
use std::fmt;

#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for ctx in &self.context {
            write!(f, "\n  -> {}", ctx)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nsuggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                write!(f, "\n  {}. {}", i + 1, suggestion)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl CliError {
    pub fn unknown_remote(name: &str, source: gj_core::ConfigError) -> Self {
        CliError::new(source.to_string())
            .with_context(format!("no usable [remotes.{}] section in journal.toml", name))
            .with_suggestion(format!(
                "Add it: [remotes.{}] urls = [\"https://...\"]",
                name
            ))
    }

    pub fn already_fetching(remote: &str) -> Self {
        CliError::new("Extents already being fetched by another process.")
            .with_context(format!("another gj fetch holds the lock for remote '{}'", remote))
            .with_suggestion("Wait for it to finish, then fetch again")
    }

    pub fn upgrade_required(required: u16, supported: u16) -> Self {
        CliError::new(format!(
            "the journal requires wire protocol version {}; this client supports version {}",
            required, supported
        ))
        .with_suggestion("Upgrade gj on this replica, then fetch again")
    }

    /// Map engine errors to their user-facing form
    pub fn from_fetch(remote: &str, err: FetchError) -> Self {
        match err {
            FetchError::AlreadyFetching(_) => Self::already_fetching(remote),
            FetchError::UpgradeRequired {
                required,
                supported,
            } => Self::upgrade_required(required, supported),
            FetchError::MirrorWithoutMetadata(ref path) => CliError::new(err.to_string())
                .with_context(format!("looked for metadata.bin next to {}", path.display()))
                .with_suggestion("Fetch without --mirror, or start the mirror from scratch"),
            FetchError::MetadataWithoutMirror(_) => CliError::new(err.to_string())
                .with_suggestion("Fetch with --mirror, or set mirror = true for this remote"),
            other => CliError::new(other.to_string()).with_source(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
