// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: remote byte ranges, the object and ref
//! stores of the local repository, and epilogue command execution

pub mod http;
pub mod objects;
pub mod refs;
pub mod runner;
pub mod traced;

pub use http::{
    is_supported_url, FileRangeFetcher, HttpError, RangeBody, RangeFetcher, SchemeFetcher,
    UreqFetcher,
};
pub use objects::{FsObjectStore, ObjectStore, ObjectStoreError};
pub use refs::{FsRefStore, RefError, RefStore, RefTransaction, RefUpdate};
pub use runner::{ActionOutcome, ActionRunner, NoOpRunner, ProcessRunner, RunError};
pub use traced::{TracedFetcher, TracedRunner};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use refs::FakeRefStore;
#[cfg(any(test, feature = "test-support"))]
pub use runner::{FakeActionRunner, RunCall};
