// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gj-engine: fetch-and-replay of remote journals
//!
//! A [`ReplicationSession`] brings one remote's journal up to date:
//! ranged downloads, replay into the object and ref stores, FETCH_HEAD,
//! and an [`EpiloguePlan`] of follow-up commands.

pub mod epilogue;
mod error;
mod fetch_head;
mod progress;
mod refs;
mod session;

pub use epilogue::{perform, EpiloguePlan, EpilogueReport};
pub use error::{EpilogueError, FetchError};
pub use fetch_head::FetchHead;
pub use refs::{ApplyReport, RefApplier, RefBatch, RefOp, StagedRef};
pub use session::{FetchDeps, FetchOptions, FetchReport, ReplicationSession, UrlReport};
