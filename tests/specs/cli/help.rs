//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_the_journal_commands() {
    let temp = Project::empty();
    temp.gj()
        .args(&["--help"])
        .passes()
        .stdout_has("append")
        .stdout_has("fetch")
        .stdout_has("extents-dump")
        .stdout_has("verify");
}

#[test]
fn epilogue_is_hidden_from_help() {
    let temp = Project::empty();
    let run = temp.gj().args(&["--help"]).passes();
    assert!(!run.stdout().contains("epilogue"));
}

#[test]
fn completions_are_generated() {
    let temp = Project::empty();
    temp.gj()
        .args(&["completions", "bash"])
        .passes()
        .stdout_has("gj");
}
