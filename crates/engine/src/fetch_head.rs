// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FETCH_HEAD assembly
//!
//! One line per branch or tag name. A later tip for the same name
//! replaces the earlier line in place. The current branch is written
//! first so that a following merge picks it up.

use crate::error::FetchError;
use gj_adapters::RefStore;
use gj_core::refname::{is_tag, short_ref_name};
use gj_core::ObjectId;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug)]
pub struct FetchHead {
    remote: String,
    url: String,
    /// Full name HEAD points at
    head: Option<String>,
    refspecs: Vec<String>,
    lines: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl FetchHead {
    pub fn new(remote: &str, url: &str, head: Option<String>, refspecs: Vec<String>) -> Self {
        Self {
            remote: remote.to_string(),
            url: url.to_string(),
            head,
            refspecs,
            lines: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Short name of the checked-out branch or tag
    pub fn current(&self) -> Option<&str> {
        let head = self.head.as_deref()?;
        head.strip_prefix("refs/heads/")
            .or_else(|| head.strip_prefix("refs/tags/"))
    }

    fn put(&mut self, key: &str, line: String) {
        match self.positions.get(key) {
            Some(&pos) => self.lines[pos].1 = line,
            None => {
                self.positions.insert(key.to_string(), self.lines.len());
                self.lines.push((key.to_string(), line));
            }
        }
    }

    /// Start from the current remote-tracking tips of the current branch
    /// and every requested refspec
    pub fn seed<R: RefStore>(&mut self, refs: &R) -> Result<(), FetchError> {
        let mut names: Vec<String> = self.current().map(str::to_string).into_iter().collect();
        names.extend(self.refspecs.iter().cloned());
        for name in names {
            let tracking = format!("refs/remotes/{}/{}", self.remote, name);
            match refs.read_ref(&tracking)? {
                Some(tip) => {
                    let line = format!("{}\t\tbranch '{}' of {}", tip, name, self.url);
                    self.put(&name, line);
                }
                None => tracing::debug!(name = %tracking, "no remote-tracking ref to seed"),
            }
        }
        Ok(())
    }

    fn wanted(&self, tip_name: &str, replica_name: &str, short: &str) -> bool {
        self.head.as_deref() == Some(tip_name)
            || self
                .refspecs
                .iter()
                .any(|spec| spec == short || spec == replica_name)
    }

    /// Record a tip extracted from the journal under its producer name
    pub fn record(&mut self, tip_name: &str, replica_name: &str, tip: ObjectId) {
        let short = short_ref_name(&self.remote, tip_name).to_string();
        let line = if is_tag(tip_name) {
            format!("{}\tnot-for-merge\ttag '{}' of {}", tip, short, self.url)
        } else if self.wanted(tip_name, replica_name, &short) {
            format!("{}\t\tbranch '{}' of {}", tip, short, self.url)
        } else {
            format!("{}\tnot-for-merge\tbranch '{}' of {}", tip, short, self.url)
        };
        self.put(&short, line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        let current = self.current();
        let mut out = String::new();
        let first = self
            .lines
            .iter()
            .filter(|(key, _)| Some(key.as_str()) == current);
        let rest = self
            .lines
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != current);
        for (_, line) in first.chain(rest) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<(), FetchError> {
        std::fs::write(path, self.render()).map_err(FetchError::io(path))
    }
}

#[cfg(test)]
#[path = "fetch_head_tests.rs"]
mod tests;
