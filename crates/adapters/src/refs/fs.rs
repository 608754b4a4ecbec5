// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loose refs under a git directory

use super::{check_conflicts, RefError, RefStore, RefTransaction};
use gj_core::ObjectId;
use gj_storage::write_atomically;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> RefError + '_ {
    move |source| RefError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One file per ref, holding the hex id and a newline
#[derive(Debug, Clone)]
pub struct FsRefStore {
    git_dir: PathBuf,
}

impl FsRefStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.git_dir.join(name)
    }

    fn collect(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), RefError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_err(dir)(e)),
        };
        for entry in entries {
            let entry = entry.map_err(io_err(dir))?;
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let name = format!("{}/{}", prefix, file_name);
            let path = entry.path();
            if path.is_dir() {
                self.collect(&path, &name, out)?;
            } else if !file_name.ends_with(".lock") {
                out.push(name);
            }
        }
        Ok(())
    }

    /// Every loose ref name under `refs/`
    fn all_refs(&self) -> Result<Vec<String>, RefError> {
        let mut names = Vec::new();
        self.collect(&self.git_dir.join("refs"), "refs", &mut names)?;
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &str) -> Result<(), RefError> {
        let path = self.ref_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_err(&path)(e)),
        }
        // Prune directories left empty, stopping at refs/
        let stop = self.git_dir.join("refs");
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == stop || !current.starts_with(&stop) {
                break;
            }
            if fs::remove_dir(current).is_err() {
                break;
            }
            dir = current.parent();
        }
        Ok(())
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, RefError> {
        let path = self.ref_path(name);
        if path.is_dir() {
            return Ok(None);
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path)(e)),
        };
        content
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RefError::Corrupt {
                name: name.to_string(),
            })
    }

    fn refs_with_prefix(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>, RefError> {
        let mut refs = Vec::new();
        for name in self.all_refs()? {
            if !name.starts_with(prefix) {
                continue;
            }
            if let Some(id) = self.read_ref(&name)? {
                refs.push((name, id));
            }
        }
        Ok(refs)
    }

    fn commit(&self, tx: &RefTransaction) -> Result<(), RefError> {
        let existing = self.all_refs()?;
        check_conflicts(existing.iter().map(String::as_str), tx)?;

        for update in tx.updates().iter().filter(|u| !u.is_delete()) {
            let path = self.ref_path(&update.name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
            if let Some(id) = update.new {
                write_atomically(&path, format!("{}\n", id).as_bytes())?;
            }
        }
        for update in tx.updates().iter().filter(|u| u.is_delete()) {
            self.remove(&update.name)?;
        }
        Ok(())
    }

    fn head_target(&self) -> Result<Option<String>, RefError> {
        let path = self.git_dir.join("HEAD");
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content
                .trim()
                .strip_prefix("ref: ")
                .map(str::to_string)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&path)(e)),
        }
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
