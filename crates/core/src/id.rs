// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object identifiers

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width in bytes of an object hash
pub const OBJECT_ID_LEN: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("invalid object id length {0}, expected 40 hex digits")]
    Length(usize),
    #[error("invalid hex digit in object id: {0}")]
    Digit(String),
}

/// A 20-byte content hash identifying an object or a pack
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// The all-zero id, used by ref entries to mean "delete"
    pub const NULL: ObjectId = ObjectId([0; OBJECT_ID_LEN]);

    pub fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, returning `None` unless it is exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; OBJECT_ID_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0; OBJECT_ID_LEN]
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(OBJECT_ID_LEN * 2);
        for byte in self.0 {
            out.push(char::from(HEX[usize::from(byte >> 4)]));
            out.push(char::from(HEX[usize::from(byte & 0x0f)]));
        }
        out
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.as_bytes();
        if raw.len() != OBJECT_ID_LEN * 2 {
            return Err(ObjectIdError::Length(raw.len()));
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let (hi, lo) = match (nibble(pair[0]), nibble(pair[1])) {
                (Some(hi), Some(lo)) => (hi, lo),
                _ => return Err(ObjectIdError::Digit(s.to_string())),
            };
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
