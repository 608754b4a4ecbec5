// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store over `objects/pack/`

use super::{ObjectStore, ObjectStoreError};
use gj_core::{ObjectId, PackIndex};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ObjectStoreError + '_ {
    move |source| ObjectStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Packs stored as `pack-<hex>.pack` / `pack-<hex>.idx` pairs
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    pack_dir: PathBuf,
}

impl FsObjectStore {
    pub fn new(pack_dir: impl Into<PathBuf>) -> Self {
        Self {
            pack_dir: pack_dir.into(),
        }
    }

    pub fn pack_path(&self, pack: &ObjectId) -> PathBuf {
        self.pack_dir.join(format!("pack-{}.pack", pack))
    }

    pub fn index_path(&self, pack: &ObjectId) -> PathBuf {
        self.pack_dir.join(format!("pack-{}.idx", pack))
    }

    fn incoming_dir(&self) -> PathBuf {
        self.pack_dir.join("incoming")
    }

    fn staged_path(&self, pack: &ObjectId) -> PathBuf {
        self.incoming_dir().join(format!("pack-{}.pack", pack))
    }

    fn temp_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("tmp-{}", uuid::Uuid::new_v4()))
    }

    /// Every installed pack, in directory order
    pub fn list_packs(&self) -> Result<Vec<ObjectId>, ObjectStoreError> {
        let entries = match fs::read_dir(&self.pack_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.pack_dir)(e)),
        };
        let mut packs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_err(&self.pack_dir))?;
            let name = entry.file_name();
            let Some(hex) = name
                .to_str()
                .and_then(|n| n.strip_prefix("pack-"))
                .and_then(|n| n.strip_suffix(".idx"))
            else {
                continue;
            };
            if let Ok(id) = hex.parse::<ObjectId>() {
                packs.push(id);
            }
        }
        Ok(packs)
    }

    fn read(&self, path: &Path, pack: &ObjectId) -> Result<Vec<u8>, ObjectStoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ObjectStoreError::MissingPack(*pack))
            }
            Err(e) => Err(io_err(path)(e)),
        }
    }

    /// Write through a temporary name so readers never see a partial file
    fn write_via_temp(
        &self,
        dir: &Path,
        target: &Path,
        source: &mut dyn Read,
    ) -> Result<u64, ObjectStoreError> {
        fs::create_dir_all(dir).map_err(io_err(dir))?;
        let temp = self.temp_path(dir);
        let mut file = File::create(&temp).map_err(io_err(&temp))?;
        let written = io::copy(source, &mut file).map_err(io_err(&temp))?;
        file.flush().map_err(io_err(&temp))?;
        file.sync_all().map_err(io_err(&temp))?;
        if let Err(e) = fs::rename(&temp, target) {
            let _ = fs::remove_file(&temp);
            return Err(io_err(target)(e));
        }
        Ok(written)
    }
}

impl ObjectStore for FsObjectStore {
    fn has_pack(&self, pack: &ObjectId) -> Result<bool, ObjectStoreError> {
        Ok(self.index_path(pack).is_file() && self.pack_path(pack).is_file())
    }

    fn read_pack(&self, pack: &ObjectId) -> Result<Vec<u8>, ObjectStoreError> {
        self.read(&self.pack_path(pack), pack)
    }

    fn read_index(&self, pack: &ObjectId) -> Result<Vec<u8>, ObjectStoreError> {
        self.read(&self.index_path(pack), pack)
    }

    fn find_pack_containing(
        &self,
        object: &ObjectId,
    ) -> Result<Option<ObjectId>, ObjectStoreError> {
        for pack in self.list_packs()? {
            let bytes = self.read_index(&pack)?;
            match PackIndex::parse(&bytes) {
                Ok(index) if index.contains(object) => return Ok(Some(pack)),
                Ok(_) => {}
                Err(e) => tracing::warn!(%pack, error = %e, "skipping unreadable pack index"),
            }
        }
        Ok(None)
    }

    fn stage_pack(&self, pack: &ObjectId, payload: &mut dyn Read) -> Result<u64, ObjectStoreError> {
        let dir = self.incoming_dir();
        let written = self.write_via_temp(&dir, &self.staged_path(pack), payload)?;
        tracing::debug!(%pack, bytes = written, "staged pack");
        Ok(written)
    }

    fn has_staged_pack(&self, pack: &ObjectId) -> bool {
        self.staged_path(pack).is_file()
    }

    fn install_pack(&self, pack: &ObjectId, index: &[u8]) -> Result<bool, ObjectStoreError> {
        PackIndex::parse(index)?;
        if self.has_pack(pack)? {
            self.discard_staged(pack)?;
            return Ok(false);
        }
        let staged = self.staged_path(pack);
        if !staged.is_file() {
            return Err(ObjectStoreError::NotStaged(*pack));
        }

        // The index goes last: a pack without one is invisible.
        let target = self.pack_path(pack);
        fs::rename(&staged, &target).map_err(io_err(&staged))?;
        let dir = self.pack_dir.clone();
        self.write_via_temp(&dir, &self.index_path(pack), &mut &index[..])?;
        tracing::info!(%pack, "installed pack");
        Ok(true)
    }

    fn discard_staged(&self, pack: &ObjectId) -> Result<(), ObjectStoreError> {
        let staged = self.staged_path(pack);
        match fs::remove_file(&staged) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&staged)(e)),
        }
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
