// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn id(first: u8, rest: u8) -> ObjectId {
    let mut bytes = [rest; 20];
    bytes[0] = first;
    ObjectId::from_bytes(bytes)
}

#[test]
fn lists_ids_in_sorted_order() {
    let ids = [id(0x90, 1), id(0x10, 2), id(0xff, 3)];
    let data = build_pack_index(&ids);
    let index = PackIndex::parse(&data).unwrap();

    assert_eq!(index.len(), 3);
    let listed: Vec<_> = index.object_ids().collect();
    assert_eq!(listed, vec![id(0x10, 2), id(0x90, 1), id(0xff, 3)]);
}

#[test]
fn contains_uses_fanout_buckets() {
    let ids = [id(0x00, 9), id(0x00, 1), id(0x7f, 4), id(0xff, 0)];
    let data = build_pack_index(&ids);
    let index = PackIndex::parse(&data).unwrap();

    for wanted in &ids {
        assert!(index.contains(wanted), "missing {}", wanted);
    }
    assert!(!index.contains(&id(0x00, 5)));
    assert!(!index.contains(&id(0x80, 4)));
}

#[test]
fn empty_index_is_valid() {
    let data = build_pack_index(&[]);
    let index = PackIndex::parse(&data).unwrap();
    assert!(index.is_empty());
    assert_eq!(index.object_ids().count(), 0);
    assert!(!index.contains(&id(1, 1)));
}

#[test]
fn rejects_bad_signature_and_version() {
    let mut data = build_pack_index(&[id(1, 1)]);
    data[0] = 0;
    assert_eq!(PackIndex::parse(&data).err(), Some(PackIndexError::BadSignature));

    let mut data = build_pack_index(&[id(1, 1)]);
    data[7] = 3;
    assert_eq!(
        PackIndex::parse(&data).err(),
        Some(PackIndexError::UnsupportedVersion(3))
    );
}

#[test]
fn rejects_truncated_tables() {
    assert_eq!(
        PackIndex::parse(&[0xff, b't']).err(),
        Some(PackIndexError::TooShort(2))
    );

    let data = build_pack_index(&[id(1, 1), id(2, 2)]);
    let cut = &data[..1032 + 20];
    assert_eq!(
        PackIndex::parse(cut).err(),
        Some(PackIndexError::Truncated {
            count: 2,
            available: 1
        })
    );
}
