//! Append specs
//!
//! Records written by `gj append` show up in `extents-dump`.

use crate::prelude::*;

#[test]
fn refs_are_journaled_back_to_back() {
    let temp = Project::empty();
    temp.gj()
        .args(&["append", "ref", "refs/heads/main", &oid("01")])
        .passes();
    temp.gj()
        .args(&["append", "ref", "refs/tags/v1", &oid("02")])
        .passes();

    temp.gj()
        .args(&["extents-dump"])
        .passes()
        .stdout_eq("0: (r) 0@0+43\n16: (r) 0@43+40\n");
}

#[test]
fn auto_journals_the_pack_before_the_ref() {
    let temp = Project::empty();
    temp.pack(&oid("aa"), &[&oid("07")]);

    temp.gj()
        .args(&["append", "auto", "refs/heads/main", &oid("07")])
        .passes();

    let run = temp.gj().args(&["extents-dump"]).passes();
    let ops: Vec<&str> = run
        .stdout()
        .lines()
        .map(|line| &line[line.find('(').unwrap()..line.find(')').unwrap() + 1])
        .collect();
    assert_eq!(ops, vec!["(p)", "(i)", "(r)"]);
}

#[test]
fn tips_read_names_and_hashes_from_stdin() {
    let temp = Project::empty();
    temp.pack(&oid("aa"), &[&oid("07"), &oid("08")]);

    temp.gj()
        .args(&["append", "tips"])
        .stdin(&format!(
            "refs/heads/main {}\nrefs/heads/dev {}\n",
            oid("07"),
            oid("08")
        ))
        .passes();

    let run = temp.gj().args(&["extents-dump"]).passes();
    assert_eq!(run.stdout().lines().count(), 4);
}

#[test]
fn upgrade_notice_is_header_only() {
    let temp = Project::empty();
    temp.gj().args(&["append", "upgrade"]).passes();
    temp.gj()
        .args(&["extents-dump"])
        .passes()
        .stdout_eq("0: (V) 0@0+28\n");
}
