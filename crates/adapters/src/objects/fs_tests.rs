// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gj_core::pack_index::build_pack_index;
use tempfile::TempDir;

fn id(byte: u8) -> ObjectId {
    ObjectId::from_bytes([byte; 20])
}

#[test]
fn staged_pack_is_invisible_until_installed() {
    let tmp = TempDir::new().unwrap();
    let store = FsObjectStore::new(tmp.path().join("pack"));

    let written = store.stage_pack(&id(1), &mut &b"PACKDATA"[..]).unwrap();
    assert_eq!(written, 8);
    assert!(store.has_staged_pack(&id(1)));
    assert!(!store.has_pack(&id(1)).unwrap());
    assert!(store.list_packs().unwrap().is_empty());

    let index = build_pack_index(&[id(0x10), id(0x20)]);
    assert!(store.install_pack(&id(1), &index).unwrap());

    assert!(store.has_pack(&id(1)).unwrap());
    assert!(!store.has_staged_pack(&id(1)));
    assert_eq!(store.read_pack(&id(1)).unwrap(), b"PACKDATA");
    assert_eq!(store.read_index(&id(1)).unwrap(), index);
    assert_eq!(store.list_packs().unwrap(), vec![id(1)]);
}

#[test]
fn installing_twice_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let store = FsObjectStore::new(tmp.path().join("pack"));
    let index = build_pack_index(&[id(0x10)]);

    store.stage_pack(&id(1), &mut &b"one"[..]).unwrap();
    assert!(store.install_pack(&id(1), &index).unwrap());

    store.stage_pack(&id(1), &mut &b"again"[..]).unwrap();
    assert!(!store.install_pack(&id(1), &index).unwrap());
    assert!(!store.has_staged_pack(&id(1)));
    assert_eq!(store.read_pack(&id(1)).unwrap(), b"one");
}

#[test]
fn install_requires_a_staged_pack_and_a_valid_index() {
    let tmp = TempDir::new().unwrap();
    let store = FsObjectStore::new(tmp.path().join("pack"));

    let err = store
        .install_pack(&id(1), &build_pack_index(&[id(2)]))
        .unwrap_err();
    assert!(matches!(err, ObjectStoreError::NotStaged(_)));

    store.stage_pack(&id(1), &mut &b"PACK"[..]).unwrap();
    let err = store.install_pack(&id(1), b"garbage").unwrap_err();
    assert!(matches!(err, ObjectStoreError::PackIndex(_)));
    assert!(store.has_staged_pack(&id(1)));
}

#[test]
fn finds_the_pack_holding_an_object() {
    let tmp = TempDir::new().unwrap();
    let store = FsObjectStore::new(tmp.path().join("pack"));
    for (pack, objects) in [(id(1), vec![id(0x11), id(0x12)]), (id(2), vec![id(0x21)])] {
        store.stage_pack(&pack, &mut &b"PACK"[..]).unwrap();
        store.install_pack(&pack, &build_pack_index(&objects)).unwrap();
    }

    assert_eq!(store.find_pack_containing(&id(0x21)).unwrap(), Some(id(2)));
    assert_eq!(store.find_pack_containing(&id(0x12)).unwrap(), Some(id(1)));
    assert_eq!(store.find_pack_containing(&id(0x99)).unwrap(), None);
}

#[test]
fn missing_pack_reads_report_the_pack() {
    let tmp = TempDir::new().unwrap();
    let store = FsObjectStore::new(tmp.path().join("pack"));

    assert!(matches!(
        store.read_pack(&id(7)),
        Err(ObjectStoreError::MissingPack(pack)) if pack == id(7)
    ));
    store.discard_staged(&id(7)).unwrap();
}
