// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    branch = { "refs/heads/main" },
    nested = { "refs/heads/feature/a/b" },
    tag = { "refs/tags/v1.0" },
    quarantine = { "refs/failed-updates/origin/failed-0123" },
)]
fn accepts_valid_ref_names(name: &str) {
    assert_eq!(validate_ref_name(name), Ok(()));
}

#[parameterized(
    no_prefix = { "heads/main" },
    trailing_slash = { "refs/heads/main/" },
    lock_suffix = { "refs/heads/main.lock" },
    double_dot = { "refs/heads/a..b" },
    double_slash = { "refs/heads//a" },
    space = { "refs/heads/a b" },
    colon = { "refs/heads/a:b" },
    hidden = { "refs/heads/.hidden" },
    reflog = { "refs/heads/a@{1}" },
    control = { "refs/heads/a\u{7}" },
)]
fn rejects_invalid_ref_names(name: &str) {
    assert!(matches!(
        validate_ref_name(name),
        Err(NameError::InvalidRef { .. })
    ));
}

#[parameterized(
    plain = { "origin", true },
    punctuated = { "mirror_1.west-2", true },
    slash = { "a/b", false },
    space = { "a b", false },
    empty = { "", false },
)]
fn remote_name_charset(name: &str, ok: bool) {
    assert_eq!(validate_remote_name(name).is_ok(), ok);
}

#[test]
fn branches_move_under_remote_namespace() {
    assert_eq!(
        replica_ref_name("origin", "refs/heads/main", false),
        "refs/remotes/origin/main"
    );
    assert_eq!(
        replica_ref_name("origin", "refs/heads/main", true),
        "refs/heads/main"
    );
    assert_eq!(
        replica_ref_name("origin", "refs/tags/v1", false),
        "refs/tags/v1"
    );
}

#[parameterized(
    branch = { "refs/heads/main", "main" },
    tag = { "refs/tags/v1", "v1" },
    tracking = { "refs/remotes/origin/topic/x", "topic/x" },
    other_remote = { "refs/remotes/upstream/x", "refs/remotes/upstream/x" },
)]
fn short_names(name: &str, short: &str) {
    assert_eq!(short_ref_name("origin", name), short);
}
