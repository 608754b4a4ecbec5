// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-layout journal records
//!
//! Every record is encoded field by field in network byte order. Decoding
//! checks the input length first and never reinterprets a byte buffer as
//! a struct.
//!
//! | record     | bytes | layout                                                   |
//! |------------|-------|----------------------------------------------------------|
//! | metadata   | 8     | magic[2] reserved[2] serial:u32                          |
//! | header     | 28    | opcode:u8 id[20] pad[3] payload_len:u32                  |
//! | extent     | 16    | serial:u32 opcode:u8 pad[3] offset:u32 length:u32        |
//! | integrity  | 32    | self_crc:u32 chain_crc:u32 data_hash[20] reserved[4]     |
//! | state      | 4     | processed_offset:u32                                     |

use crate::id::{ObjectId, OBJECT_ID_LEN};
use std::fmt;
use thiserror::Error;

pub const HEADER_LEN: usize = 28;
pub const EXTENT_LEN: usize = 16;
pub const INTEGRITY_LEN: usize = 32;
pub const METADATA_LEN: usize = 8;
pub const REMOTE_STATE_LEN: usize = 4;

/// Wire version this build writes and understands
pub const WIRE_VERSION: u16 = 1;

pub const METADATA_MAGIC: [u8; 2] = *b"TG";

/// Offset of the CRC-covered region inside an integrity record
const INTEGRITY_SEALED_FROM: usize = 4;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated {what}: need {expected} bytes, have {actual}")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("bad metadata magic {0:?}")]
    BadMagic([u8; 2]),
    #[error("value {value} does not fit the 32-bit {field} field")]
    Overflow { field: &'static str, value: u64 },
}

fn need(what: &'static str, buf: &[u8], expected: usize) -> Result<(), CodecError> {
    if buf.len() < expected {
        return Err(CodecError::Truncated {
            what,
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_id(buf: &[u8], at: usize) -> ObjectId {
    let mut bytes = [0u8; OBJECT_ID_LEN];
    bytes.copy_from_slice(&buf[at..at + OBJECT_ID_LEN]);
    ObjectId::from_bytes(bytes)
}

/// Convert a byte count into a 32-bit wire field
pub fn to_wire_u32(field: &'static str, value: u64) -> Result<u32, CodecError> {
    u32::try_from(value).map_err(|_| CodecError::Overflow { field, value })
}

/// Kind of journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Pack,
    Index,
    Ref,
    Upgrade,
}

impl Opcode {
    pub fn as_byte(self) -> u8 {
        match self {
            Opcode::Pack => b'p',
            Opcode::Index => b'i',
            Opcode::Ref => b'r',
            Opcode::Upgrade => b'V',
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, CodecError> {
        match byte {
            b'p' => Ok(Opcode::Pack),
            b'i' => Ok(Opcode::Index),
            b'r' => Ok(Opcode::Ref),
            b'V' => Ok(Opcode::Upgrade),
            other => Err(CodecError::UnknownOpcode(other)),
        }
    }

    pub fn as_char(self) -> char {
        char::from(self.as_byte())
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Pack => "pack",
            Opcode::Index => "index",
            Opcode::Ref => "ref",
            Opcode::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Header preceding every entry in a journal segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub opcode: Opcode,
    /// Pack hash, new ref tip, or the wire version for upgrades
    pub id: ObjectId,
    pub payload_len: u32,
}

impl EntryHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.opcode.as_byte();
        buf[1..1 + OBJECT_ID_LEN].copy_from_slice(self.id.as_bytes());
        buf[24..28].copy_from_slice(&self.payload_len.to_be_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        need("entry header", buf, HEADER_LEN)?;
        Ok(Self {
            opcode: Opcode::from_byte(buf[0])?,
            id: read_id(buf, 1),
            payload_len: read_u32(buf, 24),
        })
    }

    /// Total on-disk size of the entry, header included
    pub fn entry_len(&self) -> u64 {
        HEADER_LEN as u64 + u64::from(self.payload_len)
    }
}

/// Locator of one journal entry, stored in `extents.bin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentRecord {
    pub serial: u32,
    pub opcode: Opcode,
    pub offset: u32,
    pub length: u32,
}

impl ExtentRecord {
    pub fn encode(&self) -> [u8; EXTENT_LEN] {
        let mut buf = [0u8; EXTENT_LEN];
        buf[0..4].copy_from_slice(&self.serial.to_be_bytes());
        buf[4] = self.opcode.as_byte();
        buf[8..12].copy_from_slice(&self.offset.to_be_bytes());
        buf[12..16].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        need("extent record", buf, EXTENT_LEN)?;
        Ok(Self {
            serial: read_u32(buf, 0),
            opcode: Opcode::from_byte(buf[4])?,
            offset: read_u32(buf, 8),
            length: read_u32(buf, 12),
        })
    }

    /// Byte position just past the entry within its segment
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }
}

impl fmt::Display for ExtentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {:x}@{}+{}",
            self.opcode.as_char(),
            self.serial,
            self.offset,
            self.length
        )
    }
}

/// Extend the extents CRC chain over one wire-encoded extent record
pub fn chain_crc(previous: u32, extent_wire: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(previous);
    hasher.update(extent_wire);
    hasher.finalize()
}

/// Tamper-detection record stored in `integrity.bin`, parallel to extents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityRecord {
    pub self_crc: u32,
    pub chain_crc: u32,
    /// SHA-1 of the entry's header and payload bytes
    pub data_hash: ObjectId,
}

impl IntegrityRecord {
    /// Build a record and compute its self CRC
    pub fn seal(chain_crc: u32, data_hash: ObjectId) -> Self {
        let mut record = Self {
            self_crc: 0,
            chain_crc,
            data_hash,
        };
        record.self_crc = record.expected_self_crc();
        record
    }

    pub fn expected_self_crc(&self) -> u32 {
        let buf = self.encode();
        crc32fast::hash(&buf[INTEGRITY_SEALED_FROM..])
    }

    pub fn self_crc_valid(&self) -> bool {
        self.self_crc == self.expected_self_crc()
    }

    pub fn encode(&self) -> [u8; INTEGRITY_LEN] {
        let mut buf = [0u8; INTEGRITY_LEN];
        buf[0..4].copy_from_slice(&self.self_crc.to_be_bytes());
        buf[4..8].copy_from_slice(&self.chain_crc.to_be_bytes());
        buf[8..8 + OBJECT_ID_LEN].copy_from_slice(self.data_hash.as_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        need("integrity record", buf, INTEGRITY_LEN)?;
        Ok(Self {
            self_crc: read_u32(buf, 0),
            chain_crc: read_u32(buf, 4),
            data_hash: read_id(buf, 8),
        })
    }
}

/// Contents of `metadata.bin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalMetadata {
    pub serial: u32,
}

impl JournalMetadata {
    pub fn encode(&self) -> [u8; METADATA_LEN] {
        let mut buf = [0u8; METADATA_LEN];
        buf[0..2].copy_from_slice(&METADATA_MAGIC);
        buf[4..8].copy_from_slice(&self.serial.to_be_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        need("journal metadata", buf, METADATA_LEN)?;
        let magic = [buf[0], buf[1]];
        if magic != METADATA_MAGIC {
            return Err(CodecError::BadMagic(magic));
        }
        Ok(Self {
            serial: read_u32(buf, 4),
        })
    }
}

/// Pack a wire version into the header id field of an upgrade entry
pub fn encode_wire_version(version: u16) -> ObjectId {
    let mut bytes = [0u8; OBJECT_ID_LEN];
    bytes[0..2].copy_from_slice(&version.to_be_bytes());
    ObjectId::from_bytes(bytes)
}

pub fn decode_wire_version(id: &ObjectId) -> u16 {
    let bytes = id.as_bytes();
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub fn encode_processed_offset(offset: u32) -> [u8; REMOTE_STATE_LEN] {
    offset.to_be_bytes()
}

pub fn decode_processed_offset(buf: &[u8]) -> Result<u32, CodecError> {
    need("remote state", buf, REMOTE_STATE_LEN)?;
    Ok(read_u32(buf, 0))
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
