// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive `<path>.lock` files with rename-on-commit
//!
//! Creating the lock file with `O_EXCL` is the mutual exclusion. New
//! content is written into the lock file and becomes visible under the
//! target name only when [`LockFile::commit`] renames it into place.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const LOCK_SUFFIX: &str = ".lock";

/// Number of acquisition attempts made by [`LockFile::acquire_with_retry`]
pub const LOCK_RETRY_ATTEMPTS: u32 = 100;
pub const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);
const LOCK_RETRY_WARN_EVERY: u32 = 25;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("unable to create '{}': another process holds the lock", .0.display())]
    Held(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> LockError + '_ {
    move |source| LockError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Path of the lock guarding `target`
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

/// A held lock; removed on drop unless committed
#[derive(Debug)]
pub struct LockFile {
    target: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
}

impl LockFile {
    pub fn acquire(target: &Path) -> Result<Self, LockError> {
        let lock_path = lock_path(target);
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => Ok(Self {
                target: target.to_path_buf(),
                lock_path,
                file: Some(file),
            }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(LockError::Held(lock_path)),
            Err(e) => Err(io_err(&lock_path)(e)),
        }
    }

    /// Retry while another process holds the lock
    pub fn acquire_with_retry(
        target: &Path,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, LockError> {
        let mut tries = 0;
        loop {
            match Self::acquire(target) {
                Err(LockError::Held(path)) if tries + 1 < attempts => {
                    tries += 1;
                    if tries % LOCK_RETRY_WARN_EVERY == 0 {
                        tracing::warn!(
                            lock = %path.display(),
                            attempts = tries,
                            "still waiting for lock"
                        );
                    }
                    std::thread::sleep(delay);
                }
                other => return other,
            }
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Replace the pending content of the lock file
    pub fn write_contents(&mut self, bytes: &[u8]) -> Result<(), LockError> {
        let path = self.lock_path.clone();
        let Some(file) = self.file.as_mut() else {
            return Err(io_err(&path)(io::Error::other("lock already released")));
        };
        file.set_len(0).map_err(io_err(&path))?;
        file.seek(SeekFrom::Start(0)).map_err(io_err(&path))?;
        file.write_all(bytes).map_err(io_err(&path))?;
        Ok(())
    }

    /// Fsync the pending content and rename it over the target
    pub fn commit(mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(io_err(&self.lock_path))?;
        }
        if let Err(e) = std::fs::rename(&self.lock_path, &self.target) {
            let _ = std::fs::remove_file(&self.lock_path);
            return Err(io_err(&self.lock_path)(e));
        }
        Ok(())
    }

    /// Drop the lock without touching the target
    pub fn rollback(self) {}
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

/// Replace `target` with `bytes` through a lock file
pub fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), LockError> {
    let mut lock = LockFile::acquire(target)?;
    lock.write_contents(bytes)?;
    lock.commit()
}

#[cfg(test)]
#[path = "lockfile_tests.rs"]
mod tests;
