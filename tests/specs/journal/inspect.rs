//! Inspection specs: dump, verify, identity

use crate::prelude::*;

fn journal_with_pack() -> Project {
    let temp = Project::empty();
    temp.pack(&oid("aa"), &[&oid("07"), &oid("03")]);
    temp.gj()
        .args(&["append", "auto", "refs/heads/main", &oid("07")])
        .passes();
    temp
}

#[test]
fn dump_lists_objects_of_the_segment() {
    let temp = journal_with_pack();
    temp.gj()
        .args(&["dump", "0"])
        .passes()
        .stdout_eq(&format!("{}\n{}\n", oid("03"), oid("07")));
}

#[test]
fn clean_journal_verifies() {
    let temp = journal_with_pack();
    temp.gj().args(&["verify", "0"]).passes().stdout_eq("");
}

#[test]
fn verbose_verify_marks_each_record_ok() {
    let temp = journal_with_pack();
    let run = temp.gj().args(&["-v", "verify", "0"]).passes();
    assert!(!run.stdout().is_empty());
    assert!(run.stdout().lines().all(|line| line.starts_with("ok ")));
}

#[test]
fn corrupted_segment_fails_verification() {
    let temp = Project::empty();
    temp.gj()
        .args(&["append", "ref", "refs/heads/main", &oid("01")])
        .passes();

    let path = temp.git_dir().join("objects/journals/0.bin");
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] = b'p';
    std::fs::write(&path, bytes).unwrap();

    temp.gj()
        .args(&["verify", "0"])
        .exits(1)
        .stdout_has("err ");
}

#[test]
fn local_identity_covers_everything_written() {
    let temp = journal_with_pack();
    temp.gj()
        .args(&["identity"])
        .passes()
        .stdout_eq("journal_serial=0 extents_processed_offset=48\n");
}
