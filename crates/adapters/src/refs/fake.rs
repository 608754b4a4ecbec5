// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory ref store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{check_conflicts, RefError, RefStore, RefTransaction};
use gj_core::ObjectId;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeRefState {
    refs: BTreeMap<String, ObjectId>,
    head: Option<String>,
    rejected: BTreeSet<String>,
    unreadable: BTreeSet<String>,
    commits: Vec<RefTransaction>,
}

/// Ref store backed by a map, with per-ref failure injection
#[derive(Clone, Default)]
pub struct FakeRefStore {
    state: Arc<Mutex<FakeRefState>>,
}

impl FakeRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeRefState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set(&self, name: &str, id: ObjectId) {
        self.state().refs.insert(name.to_string(), id);
    }

    pub fn set_head(&self, target: &str) {
        self.state().head = Some(target.to_string());
    }

    /// Make every transaction touching `name` fail
    pub fn reject(&self, name: &str) {
        self.state().rejected.insert(name.to_string());
    }

    /// Make reads of `name` fail with an I/O error
    pub fn unreadable(&self, name: &str) {
        self.state().unreadable.insert(name.to_string());
    }

    pub fn snapshot(&self) -> BTreeMap<String, ObjectId> {
        self.state().refs.clone()
    }

    /// Transactions that committed, in order
    pub fn commits(&self) -> Vec<RefTransaction> {
        self.state().commits.clone()
    }
}

impl RefStore for FakeRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, RefError> {
        let state = self.state();
        if state.unreadable.contains(name) {
            return Err(RefError::Io {
                path: name.into(),
                source: std::io::Error::other("injected read failure"),
            });
        }
        Ok(state.refs.get(name).copied())
    }

    fn refs_with_prefix(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>, RefError> {
        Ok(self
            .state()
            .refs
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, id)| (name.clone(), *id))
            .collect())
    }

    fn commit(&self, tx: &RefTransaction) -> Result<(), RefError> {
        let mut state = self.state();
        if let Some(update) = tx
            .updates()
            .iter()
            .find(|u| state.rejected.contains(&u.name))
        {
            return Err(RefError::Rejected {
                name: update.name.clone(),
                reason: "injected failure".to_string(),
            });
        }
        check_conflicts(state.refs.keys().map(String::as_str), tx)?;

        for update in tx.updates() {
            if let Some(id) = update.new {
                state.refs.insert(update.name.clone(), id);
            }
        }
        for update in tx.updates().iter().filter(|u| u.is_delete()) {
            state.refs.remove(&update.name);
        }
        state.commits.push(tx.clone());
        Ok(())
    }

    fn head_target(&self) -> Result<Option<String>, RefError> {
        Ok(self.state().head.clone())
    }
}
