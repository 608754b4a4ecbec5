//! Mirror specs: a mirror keeps the journal so it can be fetched from

use crate::prelude::*;

fn producer() -> Project {
    let temp = Project::empty();
    temp.gj()
        .args(&["append", "ref", "refs/heads/main", &oid("01")])
        .passes();
    temp.gj()
        .args(&["append", "ref", "refs/tags/v1", &oid("02")])
        .passes();
    temp
}

fn mirror_of(source: &Project) -> Project {
    let temp = Project::empty();
    temp.file(
        ".git/journal.toml",
        &format!(
            "[fetch]\nrepack_command = [\"true\"]\n\n[remotes.origin]\nurls = [\"{}\"]\nmirror = true\n",
            source.url()
        ),
    );
    temp
}

#[test]
fn mirror_keeps_refs_and_segments() {
    let source = producer();
    let mirror = mirror_of(&source);

    mirror.gj().args(&["fetch", "origin"]).passes();

    assert_eq!(
        mirror.read(".git/refs/heads/main"),
        format!("{}\n", oid("01"))
    );
    assert_eq!(mirror.read(".git/refs/tags/v1"), format!("{}\n", oid("02")));
    assert!(mirror.git_dir().join("objects/journals/0.bin").is_file());
    mirror
        .gj()
        .args(&["control", "--show-serial"])
        .passes()
        .stdout_eq("0\n");
}

#[test]
fn replicas_can_fetch_from_a_mirror() {
    let source = producer();
    let mirror = mirror_of(&source);
    mirror.gj().args(&["fetch", "origin"]).passes();

    let replica = Project::empty();
    replica.remote("upstream", &mirror.url());
    replica
        .gj()
        .args(&["fetch", "upstream", "--foreground"])
        .passes()
        .stdout_has("Extents updated: 2 transactions");

    assert_eq!(
        replica.read(".git/refs/remotes/upstream/main"),
        format!("{}\n", oid("01"))
    );
}

#[test]
fn metadata_in_a_replica_copy_is_refused() {
    let source = producer();
    let replica = Project::empty();
    replica.remote("origin", &source.url());
    replica.file(".git/objects/journals/origin/metadata.bin", "");

    replica
        .gj()
        .args(&["fetch", "origin", "--foreground"])
        .exits(128);
}
