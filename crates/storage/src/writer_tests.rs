// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::extents::{read_integrity, ExtentsReader};
use crate::lockfile::LockError;
use crate::metadata::require_metadata;
use crate::safe_append::committed_size;
use gj_core::HEADER_LEN;
use proptest::prelude::*;
use tempfile::TempDir;

fn options(size_limit: u64) -> WriterOptions {
    WriterOptions {
        size_limit,
        integrity: false,
        max_pack_size: 0,
    }
}

fn open(tmp: &TempDir, options: WriterOptions) -> JournalContext {
    JournalContext::open_with_retry(
        JournalDir::new(tmp.path()),
        options,
        1,
        Duration::from_millis(1),
    )
    .unwrap()
}

fn extents_of(tmp: &TempDir) -> Vec<ExtentRecord> {
    let dir = JournalDir::new(tmp.path());
    let mut reader = ExtentsReader::open(&dir.extents()).unwrap();
    (0..reader.count()).map(|i| reader.read(i).unwrap()).collect()
}

fn extent(serial: u32, opcode: Opcode, offset: u32, length: u32) -> ExtentRecord {
    ExtentRecord {
        serial,
        opcode,
        offset,
        length,
    }
}

fn tip(byte: u8) -> ObjectId {
    ObjectId::from_bytes([byte; 20])
}

#[test]
fn open_initializes_the_journal() {
    let tmp = TempDir::new().unwrap();
    let ctx = open(&tmp, options(1 << 20));

    assert_eq!(ctx.serial(), 0);
    assert_eq!(require_metadata(ctx.dir()).unwrap().serial, 0);
}

#[test]
fn second_writer_is_refused_while_locks_are_held() {
    let tmp = TempDir::new().unwrap();
    let first = open(&tmp, options(1 << 20));

    let second = JournalContext::open_with_retry(
        JournalDir::new(tmp.path()),
        options(1 << 20),
        2,
        Duration::from_millis(1),
    );
    assert!(matches!(
        second,
        Err(StorageError::Lock(LockError::Held(_)))
    ));

    first.close().unwrap();
    open(&tmp, options(1 << 20));
}

#[test]
fn entries_are_contiguous_within_a_segment() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(1 << 20));

    let first = ctx.append_ref("refs/heads/main", tip(1)).unwrap();
    let second = ctx.append_ref("refs/tags/v1", tip(2)).unwrap();
    assert_eq!(ctx.pending_extents(), 2);
    assert_eq!(ctx.flush().unwrap(), 2);

    assert_eq!(first, extent(0, Opcode::Ref, 0, 43));
    assert_eq!(second, extent(0, Opcode::Ref, 43, 40));
    assert_eq!(extents_of(&tmp), vec![first, second]);

    let segment = std::fs::read(tmp.path().join("0.bin")).unwrap();
    assert_eq!(segment.len(), 83);
    let header = EntryHeader::decode(&segment[43..]).unwrap();
    assert_eq!(header.opcode, Opcode::Ref);
    assert_eq!(header.id, tip(2));
    assert_eq!(&segment[43 + HEADER_LEN..], b"refs/tags/v1");
}

#[test]
fn pack_pair_rotates_before_the_pack_entry() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(500));
    let name = format!("refs/heads/{}", "x".repeat(139));

    ctx.append_ref(&name, tip(1)).unwrap();
    let [pack, index] = ctx.append_pack(tip(9), &[7u8; 250], &[3u8; 50]).unwrap();
    ctx.close().unwrap();

    let dir = JournalDir::new(tmp.path());
    assert_eq!(require_metadata(&dir).unwrap().serial, 1);
    assert_eq!(pack, extent(1, Opcode::Pack, 0, 278));
    assert_eq!(index, extent(1, Opcode::Index, 278, 78));
    assert_eq!(
        extents_of(&tmp),
        vec![extent(0, Opcode::Ref, 0, 178), pack, index]
    );
    assert_eq!(committed_size(&dir.segment(0)).unwrap(), 178);
    assert_eq!(committed_size(&dir.segment(1)).unwrap(), 356);
}

#[test]
fn entry_that_can_never_fit_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(200));

    let err = ctx.append_pack(tip(1), &[0u8; 40], &[0u8; 40]).unwrap_err();
    assert!(matches!(
        err,
        StorageError::EntryTooLarge {
            required: 136,
            limit: 200
        }
    ));
    assert_eq!(ctx.serial(), 0);
}

#[test]
fn pack_over_configured_maximum_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(
        &tmp,
        WriterOptions {
            max_pack_size: 10,
            ..options(1 << 20)
        },
    );

    let err = ctx.append_pack(tip(1), &[0u8; 11], &[]).unwrap_err();
    assert!(matches!(
        err,
        StorageError::PackTooLarge { size: 11, limit: 10 }
    ));
    assert_eq!(ctx.pending_extents(), 0);
}

#[test]
fn integrity_records_chain_over_extents() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(
        &tmp,
        WriterOptions {
            integrity: true,
            ..options(1 << 20)
        },
    );
    ctx.append_ref("refs/heads/main", tip(1)).unwrap();
    ctx.flush().unwrap();
    ctx.append_ref("refs/heads/dev", tip(2)).unwrap();
    ctx.close().unwrap();

    let extents = extents_of(&tmp);
    let records = read_integrity(&tmp.path().join("integrity.bin")).unwrap();
    assert_eq!(records.len(), extents.len());

    let first_chain = chain_crc(0, &extents[0].encode());
    assert_eq!(records[0].chain_crc, first_chain);
    assert_eq!(records[1].chain_crc, chain_crc(first_chain, &extents[1].encode()));
    assert!(records.iter().all(IntegrityRecord::self_crc_valid));

    let segment = std::fs::read(tmp.path().join("0.bin")).unwrap();
    let first_entry = &segment[..extents[0].end() as usize];
    let digest = Sha1::digest(first_entry);
    assert_eq!(records[0].data_hash.as_bytes()[..], digest[..]);
}

#[test]
fn close_records_cursor_and_packlog() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(1 << 20));

    ctx.append_ref("refs/heads/main", tip(1)).unwrap();
    ctx.append_pack(tip(5), b"PACK", b"IDX").unwrap();
    assert!(ctx.is_pack_journaled(&tip(5)).unwrap());
    assert!(!ctx.is_pack_journaled(&tip(6)).unwrap());

    let summary = ctx.close().unwrap();
    assert_eq!(
        summary,
        CloseSummary {
            serial: 0,
            extents_flushed: 3
        }
    );

    let state = std::fs::read(tmp.path().join("state.bin")).unwrap();
    assert_eq!(state, 48u32.to_be_bytes());
    let dir = JournalDir::new(tmp.path());
    assert_eq!(PackLog::new(&dir).list().unwrap(), vec![tip(5)]);

    let reopened = open(&tmp, options(1 << 20));
    assert!(reopened.is_pack_journaled(&tip(5)).unwrap());
}

#[test]
fn unflushed_entries_vanish_on_reopen() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(1 << 20));
    ctx.append_ref("refs/heads/main", tip(1)).unwrap();
    ctx.flush().unwrap();
    ctx.append_ref("refs/heads/lost", tip(2)).unwrap();
    drop(ctx);

    let mut ctx = open(&tmp, options(1 << 20));
    let next = ctx.append_ref("refs/heads/next", tip(3)).unwrap();
    ctx.close().unwrap();

    assert_eq!(next.offset, 43);
    assert_eq!(extents_of(&tmp).len(), 2);
}

#[test]
fn committed_bytes_without_extents_are_discarded_on_open() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(1 << 20));
    ctx.append_ref("refs/heads/main", tip(1)).unwrap();
    ctx.close().unwrap();

    let path = tmp.path().join("0.bin");
    let mut segment = SafeAppendFile::open(&path).unwrap();
    segment.append(&[0xAA; 30]).unwrap();
    segment.commit().unwrap();
    drop(segment);

    let mut ctx = open(&tmp, options(1 << 20));
    assert_eq!(committed_size(&path).unwrap(), 43);
    let next = ctx.append_ref("refs/heads/dev", tip(2)).unwrap();
    assert_eq!(next.offset, 43);
}

#[test]
fn rotation_seals_only_segments_behind_the_serial() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(200));
    let name = format!("refs/heads/{}", "r".repeat(40));
    for byte in 1..=3 {
        ctx.append_ref(&name, tip(byte)).unwrap();
    }
    ctx.close().unwrap();

    let dir = JournalDir::new(tmp.path());
    let serial = require_metadata(&dir).unwrap().serial;
    assert_eq!(serial, 1);
    let sealed = |serial: u32| {
        std::fs::metadata(dir.segment(serial))
            .unwrap()
            .permissions()
            .readonly()
    };
    assert!(sealed(0));
    assert!(!sealed(1));
}

#[test]
fn sealed_current_segment_is_reopened_for_writing() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(1 << 20));
    ctx.append_ref("refs/heads/main", tip(1)).unwrap();
    ctx.close().unwrap();

    let path = tmp.path().join("0.bin");
    let mut segment = SafeAppendFile::open(&path).unwrap();
    segment.append(&[0xAA; 30]).unwrap();
    segment.commit().unwrap();
    drop(segment);
    seal_segment(&path).unwrap();

    let mut ctx = open(&tmp, options(1 << 20));
    assert!(!std::fs::metadata(&path).unwrap().permissions().readonly());
    assert_eq!(committed_size(&path).unwrap(), 43);
    let next = ctx.append_ref("refs/heads/dev", tip(2)).unwrap();
    ctx.close().unwrap();
    assert_eq!(next, extent(0, Opcode::Ref, 43, 42));
}

#[test]
fn increment_serial_starts_a_fresh_segment() {
    let tmp = TempDir::new().unwrap();
    let mut ctx = open(&tmp, options(1 << 20));
    ctx.append_ref("refs/heads/main", tip(1)).unwrap();

    assert_eq!(ctx.increment_serial().unwrap(), 1);
    let next = ctx.append_upgrade(1).unwrap();
    ctx.close().unwrap();

    assert_eq!(next, extent(1, Opcode::Upgrade, 0, HEADER_LEN as u32));
    assert_eq!(extents_of(&tmp)[0], extent(0, Opcode::Ref, 0, 43));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn rotation_keeps_extents_contiguous_per_segment(
        appends in proptest::collection::vec((1usize..60, any::<bool>()), 1..24),
    ) {
        let tmp = TempDir::new().unwrap();
        let mut ctx = open(&tmp, options(300));
        for (n, (len, flush)) in appends.iter().enumerate() {
            let name = format!("refs/heads/{}", "n".repeat(*len));
            ctx.append_ref(&name, tip(n as u8)).unwrap();
            if *flush {
                ctx.flush().unwrap();
            }
        }
        ctx.close().unwrap();

        let extents = extents_of(&tmp);
        prop_assert_eq!(extents.len(), appends.len());
        prop_assert_eq!(extents[0].serial, 0);
        prop_assert_eq!(extents[0].offset, 0);
        for pair in extents.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.serial == prev.serial {
                prop_assert_eq!(u64::from(next.offset), prev.end());
            } else {
                prop_assert_eq!(next.serial, prev.serial + 1);
                prop_assert_eq!(next.offset, 0);
            }
        }

        let dir = JournalDir::new(tmp.path());
        for serial in 0..=extents[extents.len() - 1].serial {
            let end = extents
                .iter()
                .filter(|e| e.serial == serial)
                .map(ExtentRecord::end)
                .max()
                .unwrap();
            prop_assert!(end < 300);
            prop_assert_eq!(committed_size(&dir.segment(serial)).unwrap(), end);
        }
    }
}
