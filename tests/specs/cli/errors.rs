//! Error reporting specs

use crate::prelude::*;

#[test]
fn missing_git_dir_is_fatal() {
    let temp = Project::empty();
    let mut cmd = Command::cargo_bin("gj").unwrap();
    cmd.arg("--git-dir")
        .arg(temp.path().join("nowhere"))
        .args(["control", "--version"])
        .assert()
        .code(128)
        .stderr(predicates::str::contains("not a git repository"));
}

#[test]
fn unknown_remote_is_fatal() {
    let temp = Project::empty();
    temp.gj()
        .args(&["fetch", "origin"])
        .exits(128)
        .stderr_has("no such remote 'origin'");
}

#[test]
fn invalid_remote_name_is_rejected() {
    let temp = Project::empty();
    temp.gj()
        .args(&["extents-dump", "--remote", "a/b"])
        .exits(128);
}

#[test]
fn deleting_an_unknown_ref_is_refused() {
    let temp = Project::empty();
    temp.gj()
        .args(&["append", "ref", "refs/heads/gone", &oid("00")])
        .exits(128)
        .stderr_has("no such ref");
}

#[test]
fn git_dir_is_read_from_the_environment() {
    let temp = Project::empty();
    let elsewhere = tempfile::TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("gj").unwrap();
    cmd.current_dir(elsewhere.path())
        .env("GIT_DIR", temp.git_dir())
        .env_remove("GJ_LOG")
        .args(["append", "ref", "refs/heads/main", oid("01").as_str()])
        .assert()
        .success();

    temp.gj()
        .args(&["extents-dump"])
        .passes()
        .stdout_eq("0: (r) 0@0+43\n");
}
