// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository configuration (`<git-dir>/journal.toml`)
//!
//! ```toml
//! [journal]
//! size_limit = "3g"
//! integrity = true
//!
//! [fetch]
//! merge_wait = "5m"
//!
//! [remotes.origin]
//! urls = ["https://git.example.com/repo.git"]
//! ```

use crate::refname::{validate_remote_name, NameError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "journal.toml";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML syntax error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid size '{0}'")]
    InvalidSize(String),

    #[error("journal size limit must be < 4G (got {0})")]
    SizeLimitTooLarge(u64),

    #[error("journal size limit must be positive")]
    SizeLimitZero,

    #[error("no such remote '{0}'")]
    UnknownRemote(String),

    #[error("remote '{0}' has no urls configured")]
    NoUrls(String),

    #[error(transparent)]
    Name(#[from] NameError),
}

/// Parse a byte count with an optional binary `k`, `m` or `g` suffix
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let trimmed = input.trim();
    let (digits, unit) = match trimmed.char_indices().last() {
        Some((at, c)) if c.is_ascii_alphabetic() => (&trimmed[..at], c.to_ascii_lowercase()),
        _ => (trimmed, ' '),
    };
    let multiplier = match unit {
        ' ' => 1,
        'k' => KIB,
        'm' => MIB,
        'g' => GIB,
        _ => return Err(ConfigError::InvalidSize(input.to_string())),
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| ConfigError::InvalidSize(input.to_string()))
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct SizeVisitor;

    impl de::Visitor<'_> for SizeVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a byte count or a string such as \"3g\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative size {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            parse_size(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(SizeVisitor)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalSection {
    /// Segment size at which the writer rotates to a new serial
    #[serde(deserialize_with = "deserialize_size")]
    pub size_limit: u64,
    /// Maintain `integrity.bin` alongside `extents.bin`
    pub integrity: bool,
    /// Refuse to journal packs larger than this (0 disables the check)
    #[serde(deserialize_with = "deserialize_size")]
    pub max_pack_size: u64,
    /// Journals of every remote share the top-level journal directory
    pub bare: bool,
}

impl Default for JournalSection {
    fn default() -> Self {
        Self {
            size_limit: 3 * GIB,
            integrity: false,
            max_pack_size: 0,
            bare: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    #[serde(deserialize_with = "deserialize_size")]
    pub repack_size_limit: u64,
    pub repack_command: Vec<String>,
    /// How long a detached epilogue waits for the invoking pull to exit
    #[serde(with = "humantime_serde")]
    pub merge_wait: Duration,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            repack_size_limit: 128 * MIB,
            repack_command: vec!["git".to_string(), "combine-pack".to_string()],
            merge_wait: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    pub urls: Vec<String>,
    pub mirror: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub journal: JournalSection,
    pub fetch: FetchSection,
    pub remotes: BTreeMap<String, RemoteSection>,
}

/// A configured remote, resolved and validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub urls: Vec<String>,
    pub mirror: bool,
}

impl JournalConfig {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: JournalConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `<git_dir>/journal.toml`; a missing file yields defaults
    pub fn load(git_dir: &Path) -> Result<Self, ConfigError> {
        let path = git_dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.journal.size_limit == 0 {
            return Err(ConfigError::SizeLimitZero);
        }
        if self.journal.size_limit >= u64::from(u32::MAX) {
            return Err(ConfigError::SizeLimitTooLarge(self.journal.size_limit));
        }
        for name in self.remotes.keys() {
            validate_remote_name(name)?;
        }
        Ok(())
    }

    pub fn remote(&self, name: &str) -> Result<Remote, ConfigError> {
        validate_remote_name(name)?;
        let section = self
            .remotes
            .get(name)
            .ok_or_else(|| ConfigError::UnknownRemote(name.to_string()))?;
        if section.urls.is_empty() {
            return Err(ConfigError::NoUrls(name.to_string()));
        }
        Ok(Remote {
            name: name.to_string(),
            urls: section.urls.clone(),
            mirror: section.mirror,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
