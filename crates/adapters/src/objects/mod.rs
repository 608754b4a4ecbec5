// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store adapters
//!
//! Replay never writes objects directly: a pack is first staged, then
//! installed together with its index once the index entry arrives.

mod fs;

pub use fs::FsObjectStore;

use gj_core::{ObjectId, PackIndexError};
use std::io::{self, Read};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from object store operations
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pack {0} is not in the object store")]
    MissingPack(ObjectId),
    #[error("pack {0} was never staged")]
    NotStaged(ObjectId),
    #[error("invalid pack index: {0}")]
    PackIndex(#[from] PackIndexError),
}

/// Pack-level access to a repository's object database
pub trait ObjectStore: Send + Sync {
    /// Whether the pack and its index are installed
    fn has_pack(&self, pack: &ObjectId) -> Result<bool, ObjectStoreError>;

    fn read_pack(&self, pack: &ObjectId) -> Result<Vec<u8>, ObjectStoreError>;

    fn read_index(&self, pack: &ObjectId) -> Result<Vec<u8>, ObjectStoreError>;

    /// The installed pack whose index lists `object`
    fn find_pack_containing(&self, object: &ObjectId)
        -> Result<Option<ObjectId>, ObjectStoreError>;

    /// Store pack bytes where they are not yet visible to readers
    fn stage_pack(&self, pack: &ObjectId, payload: &mut dyn Read) -> Result<u64, ObjectStoreError>;

    fn has_staged_pack(&self, pack: &ObjectId) -> bool;

    /// Publish a staged pack with its index; `Ok(false)` when the pack was
    /// already installed
    fn install_pack(&self, pack: &ObjectId, index: &[u8]) -> Result<bool, ObjectStoreError>;

    /// Drop a staged pack, if any
    fn discard_staged(&self, pack: &ObjectId) -> Result<(), ObjectStoreError>;
}
