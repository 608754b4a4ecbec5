// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;
use yare::parameterized;

#[parameterized(
    plain = { "1234", 1234 },
    kilo = { "4k", 4096 },
    mega = { "2M", 2 * 1024 * 1024 },
    giga = { "3g", 3 * 1024 * 1024 * 1024 },
    padded = { " 10 ", 10 },
)]
fn sizes_parse_with_binary_suffixes(input: &str, expected: u64) {
    assert_eq!(parse_size(input).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    unit_only = { "g" },
    bad_unit = { "3t" },
    negative = { "-1" },
    overflow = { "99999999999999999999g" },
)]
fn bad_sizes_are_rejected(input: &str) {
    assert!(matches!(parse_size(input), Err(ConfigError::InvalidSize(_))));
}

#[test]
fn defaults_apply_without_a_file() {
    let dir = TempDir::new().unwrap();
    let config = JournalConfig::load(dir.path()).unwrap();

    assert_eq!(config.journal.size_limit, 3 * 1024 * 1024 * 1024);
    assert!(!config.journal.integrity);
    assert_eq!(config.journal.max_pack_size, 0);
    assert_eq!(config.fetch.repack_size_limit, 134_217_728);
    assert_eq!(config.fetch.merge_wait, Duration::from_secs(300));
    assert!(config.remotes.is_empty());
}

#[test]
fn full_file_parses() {
    let config = JournalConfig::parse(
        r#"
[journal]
size_limit = 65536
integrity = true
max_pack_size = "1m"

[fetch]
merge_wait = "30s"
repack_command = ["true"]

[remotes.origin]
urls = ["https://example.com/repo.git", "file:///srv/repo.git"]

[remotes.backup]
urls = ["https://backup.example.com/repo.git"]
mirror = true
"#,
    )
    .unwrap();

    assert_eq!(config.journal.size_limit, 65536);
    assert!(config.journal.integrity);
    assert_eq!(config.journal.max_pack_size, 1024 * 1024);
    assert_eq!(config.fetch.merge_wait, Duration::from_secs(30));
    assert_eq!(config.fetch.repack_command, vec!["true".to_string()]);

    let origin = config.remote("origin").unwrap();
    assert_eq!(origin.urls.len(), 2);
    assert!(!origin.mirror);
    assert!(config.remote("backup").unwrap().mirror);
}

#[test]
fn size_limit_must_fit_in_32_bits() {
    let err = JournalConfig::parse("[journal]\nsize_limit = \"4g\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::SizeLimitTooLarge(_)));

    let err = JournalConfig::parse("[journal]\nsize_limit = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::SizeLimitZero));
}

#[test]
fn remote_lookup_errors() {
    let config = JournalConfig::parse("[remotes.empty]\n").unwrap();

    assert!(matches!(
        config.remote("missing"),
        Err(ConfigError::UnknownRemote(_))
    ));
    assert!(matches!(config.remote("empty"), Err(ConfigError::NoUrls(_))));
    assert!(matches!(config.remote("a/b"), Err(ConfigError::Name(_))));
}

#[test]
fn invalid_remote_names_fail_validation() {
    let err = JournalConfig::parse("[remotes.\"bad name\"]\nurls = [\"x\"]\n").unwrap_err();
    assert!(matches!(err, ConfigError::Name(_)));
}
