// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference store adapters

mod fs;

pub use fs::FsRefStore;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRefStore;

use gj_core::refname::validate_ref_name;
use gj_core::{NameError, ObjectId};
use gj_storage::LockError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from ref store operations
#[derive(Debug, Error)]
pub enum RefError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("cannot write '{name}': conflicts with existing ref '{existing}'")]
    Conflict { name: String, existing: String },
    #[error("ref '{name}' does not hold an object id")]
    Corrupt { name: String },
    #[error("ref '{name}' rejected: {reason}")]
    Rejected { name: String, reason: String },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One staged change; `new == None` deletes the ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    pub name: String,
    pub new: Option<ObjectId>,
}

impl RefUpdate {
    pub fn is_delete(&self) -> bool {
        self.new.is_none()
    }
}

/// Ordered set of ref changes committed together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefTransaction {
    updates: Vec<RefUpdate>,
}

impl RefTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, name: &str, id: ObjectId) -> Result<(), RefError> {
        validate_ref_name(name)?;
        self.updates.push(RefUpdate {
            name: name.to_string(),
            new: Some(id),
        });
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<(), RefError> {
        validate_ref_name(name)?;
        self.updates.push(RefUpdate {
            name: name.to_string(),
            new: None,
        });
        Ok(())
    }

    pub fn updates(&self) -> &[RefUpdate] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Named pointers to objects
pub trait RefStore: Send + Sync {
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, RefError>;

    /// All refs whose name starts with `prefix`, sorted by name
    fn refs_with_prefix(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>, RefError>;

    /// Apply every change or none
    ///
    /// Creates and updates are applied before deletions, so a transaction
    /// that frees a path and reuses it as a directory is rejected.
    fn commit(&self, tx: &RefTransaction) -> Result<(), RefError>;

    /// Branch HEAD points at, if it is symbolic
    fn head_target(&self) -> Result<Option<String>, RefError>;
}

/// Reject creates that collide with an existing ref as file vs directory
///
/// Deletions in the same transaction do not help: they land after creates.
pub(crate) fn check_conflicts<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    tx: &'a RefTransaction,
) -> Result<(), RefError> {
    let creates: Vec<&str> = tx
        .updates()
        .iter()
        .filter(|u| !u.is_delete())
        .map(|u| u.name.as_str())
        .collect();
    let collides = |a: &str, b: &str| {
        a.len() != b.len()
            && (a.starts_with(b) && a.as_bytes().get(b.len()) == Some(&b'/')
                || b.starts_with(a) && b.as_bytes().get(a.len()) == Some(&b'/'))
    };
    for name in existing.into_iter().chain(creates.iter().copied()) {
        if let Some(create) = creates.iter().find(|create| collides(create, name)) {
            return Err(RefError::Conflict {
                name: create.to_string(),
                existing: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
