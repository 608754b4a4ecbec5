// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gj-core: shared vocabulary of the gj journal tools
//!
//! This crate provides:
//! - Object ids and the fixed-layout journal record codec
//! - A read-only pack index view
//! - Ref and remote naming rules
//! - Repository layout and configuration
//! - Epilogue action records

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod action;
pub mod config;
pub mod id;
pub mod layout;
pub mod pack_index;
pub mod record;
pub mod refname;

pub use action::EpilogueAction;
pub use config::{ConfigError, JournalConfig, Remote};
pub use id::{ObjectId, ObjectIdError};
pub use layout::{JournalDir, RepoLayout};
pub use pack_index::{PackIndex, PackIndexError};
pub use record::{
    CodecError, EntryHeader, ExtentRecord, IntegrityRecord, JournalMetadata, Opcode,
    EXTENT_LEN, HEADER_LEN, INTEGRITY_LEN, WIRE_VERSION,
};
pub use refname::NameError;
