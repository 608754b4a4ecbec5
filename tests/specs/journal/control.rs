//! Control specs

use crate::prelude::*;

#[test]
fn version_prints_the_wire_version() {
    let temp = Project::empty();
    temp.gj()
        .args(&["control", "--version"])
        .passes()
        .stdout_eq("1\n");
}

#[test]
fn increment_serial_moves_to_the_next_segment() {
    let temp = Project::empty();
    temp.gj()
        .args(&["append", "ref", "refs/heads/main", &oid("01")])
        .passes();
    temp.gj()
        .args(&["control", "--increment-serial"])
        .passes()
        .stdout_eq("1\n");
    temp.gj()
        .args(&["control", "--show-serial"])
        .passes()
        .stdout_eq("1\n");

    temp.gj()
        .args(&["append", "ref", "refs/heads/main", &oid("02")])
        .passes();
    temp.gj()
        .args(&["extents-dump"])
        .passes()
        .stdout_eq("0: (r) 0@0+43\n16: (r) 1@0+43\n");
}

#[test]
fn packlog_keeps_each_pack_once() {
    let temp = Project::empty();
    temp.gj()
        .args(&["control", "--packlog-append"])
        .stdin(&format!("{}\nbogus\n{}\n", oid("aa"), oid("aa")))
        .passes()
        .stderr_has("bogus");

    temp.gj()
        .args(&["control", "--packlog-dump"])
        .passes()
        .stdout_eq(&format!("{}\n", oid("aa")));
}

#[test]
fn logged_pack_is_not_journaled_again() {
    let temp = Project::empty();
    temp.pack(&oid("aa"), &[&oid("07")]);
    temp.gj()
        .args(&["control", "--packlog-append"])
        .stdin(&oid("aa"))
        .passes();

    temp.gj()
        .args(&["append", "pack", &oid("aa")])
        .passes();

    temp.gj().args(&["extents-dump"]).passes().stdout_eq("");
}
