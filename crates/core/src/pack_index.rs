// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only view over a version 2 pack index
//!
//! Only the parts needed to list and look up object ids are decoded: the
//! signature, the version, the fan-out table and the sorted id table.

use crate::id::{ObjectId, OBJECT_ID_LEN};
use std::cmp::Ordering;
use thiserror::Error;

pub const PACK_INDEX_SIGNATURE: [u8; 4] = [0xff, b't', b'O', b'c'];
const FANOUT_AT: usize = 8;
const FANOUT_ENTRIES: usize = 256;
const IDS_AT: usize = FANOUT_AT + FANOUT_ENTRIES * 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackIndexError {
    #[error("pack index too short ({0} bytes)")]
    TooShort(usize),
    #[error("bad pack index signature")]
    BadSignature,
    #[error("unsupported pack index version {0}")]
    UnsupportedVersion(u32),
    #[error("pack index claims {count} objects but holds only {available}")]
    Truncated { count: usize, available: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct PackIndex<'a> {
    data: &'a [u8],
    count: usize,
}

fn be_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

impl<'a> PackIndex<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, PackIndexError> {
        if data.len() < IDS_AT {
            return Err(PackIndexError::TooShort(data.len()));
        }
        if data[0..4] != PACK_INDEX_SIGNATURE {
            return Err(PackIndexError::BadSignature);
        }
        let version = be_u32(data, 4);
        if version != 2 {
            return Err(PackIndexError::UnsupportedVersion(version));
        }
        let count = be_u32(data, FANOUT_AT + (FANOUT_ENTRIES - 1) * 4) as usize;
        let available = (data.len() - IDS_AT) / OBJECT_ID_LEN;
        if count > available {
            return Err(PackIndexError::Truncated { count, available });
        }
        Ok(Self { data, count })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn id_at(&self, i: usize) -> &'a [u8] {
        let at = IDS_AT + i * OBJECT_ID_LEN;
        &self.data[at..at + OBJECT_ID_LEN]
    }

    /// Object ids in index order (sorted)
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + 'a {
        let view = *self;
        (0..view.count).filter_map(move |i| ObjectId::from_slice(view.id_at(i)))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        let first = usize::from(id.as_bytes()[0]);
        let mut lo = if first == 0 {
            0
        } else {
            be_u32(self.data, FANOUT_AT + (first - 1) * 4) as usize
        };
        let mut hi = (be_u32(self.data, FANOUT_AT + first * 4) as usize).min(self.count);
        let target = id.as_bytes().as_slice();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.id_at(mid).cmp(target) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return true,
            }
        }
        false
    }
}

/// Build a minimal version 2 index listing `ids`, for tests and fixtures
pub fn build_pack_index(ids: &[ObjectId]) -> Vec<u8> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut out = Vec::with_capacity(IDS_AT + sorted.len() * (OBJECT_ID_LEN + 8) + 40);
    out.extend_from_slice(&PACK_INDEX_SIGNATURE);
    out.extend_from_slice(&2u32.to_be_bytes());
    for bucket in 0..FANOUT_ENTRIES {
        let n = sorted
            .iter()
            .filter(|id| usize::from(id.as_bytes()[0]) <= bucket)
            .count() as u32;
        out.extend_from_slice(&n.to_be_bytes());
    }
    for id in &sorted {
        out.extend_from_slice(id.as_bytes());
    }
    // CRC and offset tables, then the two trailing checksums
    out.resize(out.len() + sorted.len() * 8 + OBJECT_ID_LEN * 2, 0);
    out
}

#[cfg(test)]
#[path = "pack_index_tests.rs"]
mod tests;
