// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe append-only files
//!
//! A safe-append file is paired with a `<path>.size` marker holding the
//! committed length as an 8-byte big-endian integer. Bytes past that
//! length are crash debris: writers truncate them on open, readers never
//! look at them. The marker is only rewritten after the data is fsynced.

use crate::lockfile::{write_atomically, LockError};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SIZE_SUFFIX: &str = ".size";
const SIZE_MARKER_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum SafeAppendError {
    #[error("{} does not exist (no size marker)", .0.display())]
    NotFound(PathBuf),

    #[error("{}.size reports {recorded} bytes but the file holds {actual}", path.display())]
    ShortFile {
        path: PathBuf,
        recorded: u64,
        actual: u64,
    },

    #[error("corrupt size marker for {}", .0.display())]
    CorruptMarker(PathBuf),

    #[error("read of {len} bytes at {offset} past committed end {committed} of {}", path.display())]
    PastEnd {
        path: PathBuf,
        offset: u64,
        len: u64,
        committed: u64,
    },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SafeAppendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SafeAppendError::NotFound(_))
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> SafeAppendError + '_ {
    move |source| SafeAppendError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn size_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(SIZE_SUFFIX);
    PathBuf::from(name)
}

/// Committed length of `path`, or `None` if it was never committed
pub fn read_size_marker(path: &Path) -> Result<Option<u64>, SafeAppendError> {
    let marker = size_path(path);
    let bytes = match std::fs::read(&marker) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(&marker)(e)),
    };
    let raw: [u8; SIZE_MARKER_LEN] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| SafeAppendError::CorruptMarker(path.to_path_buf()))?;
    Ok(Some(u64::from_be_bytes(raw)))
}

fn write_size_marker(path: &Path, size: u64) -> Result<(), SafeAppendError> {
    write_atomically(&size_path(path), &size.to_be_bytes())?;
    Ok(())
}

fn physical_len(path: &Path) -> Result<Option<u64>, SafeAppendError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path)(e)),
    }
}

/// Committed length of `path`; `NotFound` when there is no marker
pub fn committed_size(path: &Path) -> Result<u64, SafeAppendError> {
    read_size_marker(path)?.ok_or_else(|| SafeAppendError::NotFound(path.to_path_buf()))
}

/// Drop uncommitted bytes so the file matches its marker
///
/// Returns the committed length. With `create`, a missing marker means
/// the file was never committed: it is treated as empty and a zero
/// marker is written.
fn truncate_to_marker(path: &Path, create: bool) -> Result<u64, SafeAppendError> {
    let (size, need_marker) = match read_size_marker(path)? {
        Some(size) => (size, false),
        None if create => (0, true),
        None => return Err(SafeAppendError::NotFound(path.to_path_buf())),
    };

    let actual = match physical_len(path)? {
        Some(len) => len,
        None if size == 0 => 0,
        None => {
            return Err(SafeAppendError::ShortFile {
                path: path.to_path_buf(),
                recorded: size,
                actual: 0,
            })
        }
    };
    if actual < size {
        return Err(SafeAppendError::ShortFile {
            path: path.to_path_buf(),
            recorded: size,
            actual,
        });
    }
    if actual > size {
        tracing::debug!(path = %path.display(), from = actual, to = size, "truncating crash debris");
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(io_err(path))?;
        file.set_len(size).map_err(io_err(path))?;
    }
    if need_marker {
        write_size_marker(path, 0)?;
    }
    Ok(size)
}

/// A writable safe-append handle
#[derive(Debug)]
pub struct SafeAppendFile {
    path: PathBuf,
    file: File,
    committed: u64,
}

impl SafeAppendFile {
    /// Open for appending, creating the file and its marker if needed
    pub fn open(path: &Path) -> Result<Self, SafeAppendError> {
        let committed = truncate_to_marker(path, true)?;
        Self::open_handle(path, committed)
    }

    /// Open for appending; the file must have been committed before
    pub fn open_existing(path: &Path) -> Result<Self, SafeAppendError> {
        let committed = truncate_to_marker(path, false)?;
        Self::open_handle(path, committed)
    }

    fn open_handle(path: &Path, committed: u64) -> Result<Self, SafeAppendError> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(io_err(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            committed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length at the last commit (or at open)
    pub fn committed_len(&self) -> u64 {
        self.committed
    }

    /// Current length including uncommitted bytes
    pub fn len(&self) -> Result<u64, SafeAppendError> {
        Ok(self.file.metadata().map_err(io_err(&self.path))?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SafeAppendError> {
        Ok(self.len()? == 0)
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<(), SafeAppendError> {
        self.file.write_all(bytes).map_err(io_err(&self.path))
    }

    /// Positional read of bytes already written by this handle
    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), SafeAppendError> {
        let len = self.len()?;
        if offset + buf.len() as u64 > len {
            return Err(SafeAppendError::PastEnd {
                path: self.path.clone(),
                offset,
                len: buf.len() as u64,
                committed: len,
            });
        }
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(io_err(&self.path))?;
        self.file.read_exact(buf).map_err(io_err(&self.path))
    }

    /// Fsync and publish the current length through the size marker
    pub fn commit(&mut self) -> Result<u64, SafeAppendError> {
        self.file.sync_all().map_err(io_err(&self.path))?;
        let len = self.len()?;
        write_size_marker(&self.path, len)?;
        tracing::debug!(path = %self.path.display(), len, "committed");
        self.committed = len;
        Ok(len)
    }

    /// Shrink the file, committed bytes included, to `len`
    pub fn truncate_committed(&mut self, len: u64) -> Result<(), SafeAppendError> {
        self.file.set_len(len).map_err(io_err(&self.path))?;
        self.file.sync_all().map_err(io_err(&self.path))?;
        write_size_marker(&self.path, len)?;
        self.committed = len;
        Ok(())
    }

    /// Discard everything written since the last commit
    pub fn rollback(self) -> Result<(), SafeAppendError> {
        self.file
            .set_len(self.committed)
            .map_err(io_err(&self.path))
    }
}

impl Write for SafeAppendFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Read-only view bounded by the committed length
///
/// Unlike [`SafeAppendFile::open`], opening a reader never truncates, so
/// it is safe against a writer appending concurrently.
#[derive(Debug)]
pub struct SafeAppendReader {
    path: PathBuf,
    file: File,
    len: u64,
}

impl SafeAppendReader {
    pub fn open(path: &Path) -> Result<Self, SafeAppendError> {
        let len = committed_size(path)?;
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SafeAppendError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(io_err(path)(e)),
        };
        let actual = file.metadata().map_err(io_err(path))?.len();
        if actual < len {
            return Err(SafeAppendError::ShortFile {
                path: path.to_path_buf(),
                recorded: len,
                actual,
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<(), SafeAppendError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(SafeAppendError::PastEnd {
                path: self.path.clone(),
                offset,
                len,
                committed: self.len,
            }),
        }
    }

    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), SafeAppendError> {
        self.check_range(offset, buf.len() as u64)?;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(io_err(&self.path))?;
        self.file.read_exact(buf).map_err(io_err(&self.path))
    }

    /// Stream `len` committed bytes starting at `offset`
    pub fn range(&mut self, offset: u64, len: u64) -> Result<impl Read + '_, SafeAppendError> {
        self.check_range(offset, len)?;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(io_err(&self.path))?;
        Ok((&mut self.file).take(len))
    }
}

/// Remove a safe-append file and its marker
///
/// The marker goes first so a crash in between leaves a file that is
/// treated as never committed.
pub fn unlink(path: &Path) -> Result<(), SafeAppendError> {
    let marker = size_path(path);
    for victim in [marker.as_path(), path] {
        match std::fs::remove_file(victim) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(victim)(e)),
        }
    }
    if let Some(dir) = path.parent() {
        File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(io_err(dir))?;
    }
    Ok(())
}

/// Give a file written before size markers existed a marker covering
/// its current length. Returns whether a marker was created.
pub fn backfill_size_marker(path: &Path) -> Result<bool, SafeAppendError> {
    if read_size_marker(path)?.is_some() {
        return Ok(false);
    }
    let Some(len) = physical_len(path)? else {
        return Ok(false);
    };
    write_size_marker(path, len)?;
    Ok(true)
}

#[cfg(test)]
#[path = "safe_append_tests.rs"]
mod tests;
