//! Fetch specs: a replica replays a producer's journal over file://

use crate::prelude::*;

fn producer() -> Project {
    let temp = Project::empty();
    temp.pack(&oid("aa"), &[&oid("07")]);
    temp.gj()
        .args(&["append", "auto", "refs/heads/main", &oid("07")])
        .passes();
    temp
}

fn replica_of(source: &Project) -> Project {
    let temp = Project::empty();
    temp.remote("origin", &source.url());
    temp
}

#[test]
fn fetch_replays_refs_and_packs() {
    let source = producer();
    let replica = replica_of(&source);

    replica
        .gj()
        .args(&["fetch", "origin", "--foreground"])
        .passes()
        .stdout_eq(&format!(
            "origin: Updating from {}\norigin: Extents updated: 3 transactions\n",
            source.url()
        ));

    assert_eq!(
        replica.read(".git/refs/remotes/origin/main"),
        format!("{}\n", oid("07"))
    );
    assert!(replica
        .git_dir()
        .join(format!("objects/pack/pack-{}.idx", oid("aa")))
        .is_file());
}

#[test]
fn fetch_head_names_the_extracted_branch() {
    let source = producer();
    let replica = replica_of(&source);
    replica
        .gj()
        .args(&["fetch", "origin", "--foreground"])
        .passes();

    let fetch_head = replica.read(".git/FETCH_HEAD");
    assert!(fetch_head.contains(&oid("07")));
    assert!(fetch_head.contains("branch 'main' of file://"));
}

#[test]
fn second_fetch_is_up_to_date() {
    let source = producer();
    let replica = replica_of(&source);
    replica
        .gj()
        .args(&["fetch", "origin", "--foreground"])
        .passes();

    replica
        .gj()
        .args(&["fetch", "origin", "--foreground"])
        .passes()
        .stdout_has("Extents already up-to-date");
}

#[test]
fn later_appends_are_picked_up() {
    let source = producer();
    let replica = replica_of(&source);
    replica
        .gj()
        .args(&["fetch", "origin", "--foreground"])
        .passes();

    source
        .gj()
        .args(&["append", "ref", "refs/heads/dev", &oid("07")])
        .passes();
    replica
        .gj()
        .args(&["fetch", "origin", "--foreground", "--quiet"])
        .passes()
        .stdout_eq("");

    assert_eq!(
        replica.read(".git/refs/remotes/origin/dev"),
        format!("{}\n", oid("07"))
    );
    replica
        .gj()
        .args(&["identity", "--remote", "origin"])
        .passes()
        .stdout_eq("journal_serial=0 extents_processed_offset=64\n");
}

#[test]
fn no_extract_downloads_without_replaying() {
    let source = producer();
    let replica = replica_of(&source);

    replica
        .gj()
        .args(&["fetch", "origin", "--foreground", "--no-extract"])
        .passes();

    assert!(!replica.git_dir().join("refs/remotes/origin/main").exists());
    replica
        .gj()
        .args(&["extents-dump", "--remote", "origin"])
        .passes()
        .stdout_has("processed_offset: 0\n");
}

#[test]
fn quiet_fetch_prints_nothing() {
    let source = producer();
    let replica = replica_of(&source);
    replica
        .gj()
        .args(&["fetch", "origin", "--foreground", "-q"])
        .passes()
        .stdout_eq("");
}
