// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gj_adapters::{FakeRefStore, FsRefStore};
use tempfile::TempDir;

fn id(byte: u8) -> ObjectId {
    ObjectId::from_bytes([byte; 20])
}

fn staged(name: &str, tip: ObjectId) -> StagedRef {
    StagedRef {
        name: name.to_string(),
        tip,
    }
}

fn read_log(tmp: &TempDir) -> String {
    std::fs::read_to_string(tmp.path().join("update.log")).unwrap_or_default()
}

#[test]
fn batch_replaces_case_insensitively_and_keeps_first_position() {
    let mut batch = RefBatch::new();
    batch.stage("refs/remotes/origin/Main", id(1));
    batch.stage("refs/tags/v1", id(2));
    batch.stage("refs/remotes/origin/main", id(3));

    assert_eq!(batch.len(), 2);
    assert_eq!(
        batch.entries(),
        &[
            staged("refs/remotes/origin/Main", id(3)),
            staged("refs/tags/v1", id(2)),
        ]
    );

    let taken = batch.take();
    assert_eq!(taken.len(), 2);
    assert!(batch.is_empty());
}

#[test]
fn deletes_land_before_creates_that_reuse_the_path() {
    let tmp = TempDir::new().unwrap();
    let store = FsRefStore::new(tmp.path());
    let mut seed = RefTransaction::new();
    seed.update("refs/remotes/origin/a/b", id(1)).unwrap();
    store.commit(&seed).unwrap();

    let mut applier = RefApplier::new(&store, "origin", tmp.path().join("update.log"));
    let report = applier
        .apply(vec![
            staged("refs/remotes/origin/a/b", ObjectId::NULL),
            staged("refs/remotes/origin/a/b/c", id(2)),
        ])
        .unwrap();

    assert_eq!(report, ApplyReport { applied: 2, failed: 0 });
    assert_eq!(store.read_ref("refs/remotes/origin/a/b/c").unwrap(), Some(id(2)));
    assert!(store
        .refs_with_prefix("refs/to-be-deleted/")
        .unwrap()
        .is_empty());

    let log = read_log(&tmp);
    assert!(log.contains("delete refs/remotes/origin/a/b  succeeded"), "{}", log);
    assert!(
        log.contains(&format!("create refs/remotes/origin/a/b/c {} succeeded", id(2))),
        "{}",
        log
    );
}

#[test]
fn single_transaction_with_the_same_changes_conflicts() {
    let tmp = TempDir::new().unwrap();
    let store = FsRefStore::new(tmp.path());
    let mut seed = RefTransaction::new();
    seed.update("refs/remotes/origin/a/b", id(1)).unwrap();
    store.commit(&seed).unwrap();

    let mut tx = RefTransaction::new();
    tx.delete("refs/remotes/origin/a/b").unwrap();
    tx.update("refs/remotes/origin/a/b/c", id(2)).unwrap();

    assert!(matches!(store.commit(&tx), Err(RefError::Conflict { .. })));
}

#[test]
fn rejected_ref_is_quarantined_and_the_rest_applies() {
    let tmp = TempDir::new().unwrap();
    let store = FakeRefStore::new();
    store.reject("refs/remotes/origin/bad");

    let mut applier = RefApplier::new(&store, "origin", tmp.path().join("update.log"));
    let report = applier
        .apply(vec![
            staged("refs/remotes/origin/good", id(1)),
            staged("refs/remotes/origin/bad", id(2)),
        ])
        .unwrap();

    assert_eq!(report, ApplyReport { applied: 1, failed: 1 });
    let refs = store.snapshot();
    assert_eq!(refs.get("refs/remotes/origin/good"), Some(&id(1)));
    assert_eq!(refs.get("refs/remotes/origin/bad"), None);
    assert_eq!(
        refs.get(&format!("refs/failed-updates/origin/failed-{}", id(2))),
        Some(&id(2))
    );

    let log = read_log(&tmp);
    assert!(log.contains("create refs/remotes/origin/bad"), "{}", log);
    assert!(log.contains("failed"), "{}", log);
    assert!(log.contains("create refs/remotes/origin/good"), "{}", log);
}

#[test]
fn invalid_name_is_counted_as_failure() {
    let tmp = TempDir::new().unwrap();
    let store = FakeRefStore::new();

    let mut applier = RefApplier::new(&store, "origin", tmp.path().join("update.log"));
    let report = applier
        .apply(vec![staged("refs/tags/bad..name", id(7))])
        .unwrap();

    assert_eq!(report, ApplyReport { applied: 0, failed: 1 });
    assert!(store
        .snapshot()
        .contains_key(&format!("refs/failed-updates/origin/failed-{}", id(7))));
}

#[test]
fn corrupt_existing_ref_is_quarantined_not_overwritten() {
    let tmp = TempDir::new().unwrap();
    let store = FsRefStore::new(tmp.path());
    let corrupt = tmp.path().join("refs/remotes/origin/main");
    std::fs::create_dir_all(corrupt.parent().unwrap()).unwrap();
    std::fs::write(&corrupt, "not-a-hash\n").unwrap();

    let mut applier = RefApplier::new(&store, "origin", tmp.path().join("update.log"));
    let report = applier
        .apply(vec![
            staged("refs/remotes/origin/main", id(3)),
            staged("refs/remotes/origin/dev", id(4)),
        ])
        .unwrap();

    assert_eq!(report, ApplyReport { applied: 1, failed: 1 });
    assert_eq!(std::fs::read_to_string(&corrupt).unwrap(), "not-a-hash\n");
    assert_eq!(store.read_ref("refs/remotes/origin/dev").unwrap(), Some(id(4)));
    assert_eq!(
        store
            .read_ref(&format!("refs/failed-updates/origin/failed-{}", id(3)))
            .unwrap(),
        Some(id(3))
    );

    let log = read_log(&tmp);
    assert!(
        log.contains(&format!("create refs/remotes/origin/main {} failed", id(3))),
        "{}",
        log
    );
}

#[test]
fn unreadable_ref_aborts_the_batch() {
    let tmp = TempDir::new().unwrap();
    let store = FakeRefStore::new();
    store.unreadable("refs/remotes/origin/main");

    let mut applier = RefApplier::new(&store, "origin", tmp.path().join("update.log"));
    let err = applier
        .apply(vec![
            staged("refs/remotes/origin/dev", id(4)),
            staged("refs/remotes/origin/main", id(3)),
        ])
        .unwrap_err();

    assert!(matches!(err, FetchError::Refs(RefError::Io { .. })), "{:?}", err);
    assert!(store.snapshot().is_empty());
    assert!(store.commits().is_empty());
}

#[test]
fn backups_continue_numbering_and_are_cleared() {
    let tmp = TempDir::new().unwrap();
    let store = FakeRefStore::new();
    store.set("refs/to-be-deleted/origin/4", id(9));
    store.set("refs/tags/old", id(1));
    store.set("refs/tags/moved", id(2));

    let mut applier = RefApplier::new(&store, "origin", tmp.path().join("update.log"));
    let report = applier
        .apply(vec![
            staged("refs/tags/old", ObjectId::NULL),
            staged("refs/tags/moved", id(3)),
        ])
        .unwrap();
    assert_eq!(report.applied, 2);

    let commits = store.commits();
    let first = commits[0].updates();
    assert!(first.contains(&gj_adapters::RefUpdate {
        name: "refs/to-be-deleted/origin/5".to_string(),
        new: Some(id(1)),
    }));
    assert!(first.contains(&gj_adapters::RefUpdate {
        name: "refs/to-be-deleted/origin/6".to_string(),
        new: Some(id(2)),
    }));

    let refs = store.snapshot();
    assert!(!refs.keys().any(|name| name.starts_with("refs/to-be-deleted/")));
    assert_eq!(refs.get("refs/tags/moved"), Some(&id(3)));
    assert!(!refs.contains_key("refs/tags/old"));
    assert!(read_log(&tmp).contains(&format!("update refs/tags/moved {}  succeeded", id(3))));
}

#[test]
fn empty_batch_touches_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = FakeRefStore::new();
    let mut applier = RefApplier::new(&store, "origin", tmp.path().join("update.log"));

    assert_eq!(applier.apply(Vec::new()).unwrap(), ApplyReport::default());
    assert!(store.commits().is_empty());
    assert!(!tmp.path().join("update.log").exists());
}
