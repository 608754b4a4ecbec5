// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference and remote naming rules

use regex::Regex;
use thiserror::Error;

const REMOTE_NAME_PATTERN: &str = r"^[0-9A-Za-z_.\-]+$";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid ref name '{name}': {reason}")]
    InvalidRef { name: String, reason: &'static str },
    #[error("invalid remote name '{0}': only [0-9A-Za-z_.-] are allowed")]
    InvalidRemote(String),
}

/// Check a full ref name (`refs/...`) against the loose-ref naming rules
pub fn validate_ref_name(name: &str) -> Result<(), NameError> {
    let invalid = |reason| {
        Err(NameError::InvalidRef {
            name: name.to_string(),
            reason,
        })
    };

    if !name.starts_with("refs/") {
        return invalid("must start with refs/");
    }
    if name.ends_with('/') || name.ends_with(".lock") || name.ends_with('.') {
        return invalid("bad suffix");
    }
    if name.contains("..") || name.contains("//") || name.contains("@{") {
        return invalid("forbidden sequence");
    }
    if name
        .chars()
        .any(|c| c.is_control() || " ~^:?*[\\".contains(c))
    {
        return invalid("forbidden character");
    }
    if name.split('/').any(|part| part.starts_with('.')) {
        return invalid("component starts with '.'");
    }
    Ok(())
}

pub fn validate_remote_name(name: &str) -> Result<(), NameError> {
    let valid = Regex::new(REMOTE_NAME_PATTERN)
        .map(|re| re.is_match(name))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(NameError::InvalidRemote(name.to_string()))
    }
}

/// Map a producer-side ref name to where a replica stores it
///
/// Branches land under `refs/remotes/<remote>/` unless mirroring; every
/// other namespace is kept as is.
pub fn replica_ref_name(remote: &str, name: &str, mirror: bool) -> String {
    match name.strip_prefix("refs/heads/") {
        Some(branch) if !mirror => format!("refs/remotes/{}/{}", remote, branch),
        _ => name.to_string(),
    }
}

/// Name without its namespace prefix, as shown in FETCH_HEAD
pub fn short_ref_name<'a>(remote: &str, name: &'a str) -> &'a str {
    if let Some(rest) = name.strip_prefix("refs/heads/") {
        return rest;
    }
    if let Some(rest) = name.strip_prefix("refs/tags/") {
        return rest;
    }
    if let Some(rest) = name
        .strip_prefix("refs/remotes/")
        .and_then(|r| r.strip_prefix(remote))
        .and_then(|r| r.strip_prefix('/'))
    {
        return rest;
    }
    name
}

pub fn is_tag(name: &str) -> bool {
    name.starts_with("refs/tags/")
}

#[cfg(test)]
#[path = "refname_tests.rs"]
mod tests;
