// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gj-storage: crash-safe journal files
//!
//! Everything that touches journal bytes on disk lives here: lock files,
//! size-marker protected appends, the journal writer, per-remote cursors
//! and the read-only inspection passes.

mod dump;
mod error;
mod extents;
pub mod lockfile;
mod metadata;
mod packlog;
mod remote_state;
pub mod safe_append;
mod verify;
mod writer;

pub use dump::{dump_serial_objects, list_extents, read_entry_header, read_entry_payload};
pub use error::StorageError;
pub use extents::{read_integrity, ExtentsReader, RawExtent};
pub use lockfile::{write_atomically, LockError, LockFile};
pub use metadata::{ensure_metadata, load_metadata, require_metadata, store_metadata};
pub use packlog::PackLog;
pub use remote_state::RemoteState;
pub use safe_append::{SafeAppendError, SafeAppendFile, SafeAppendReader};
pub use verify::{verify_extents, verify_integrity, VerifyLine, VerifyReport};
pub use writer::{CloseSummary, JournalContext, WriterOptions, ENTRY_OVERHEAD};
