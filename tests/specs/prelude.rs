//! Shared fixtures for the CLI specs

pub use assert_cmd::Command;
use predicates::Predicate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway git directory the binary is pointed at
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        std::fs::create_dir_all(project.git_dir().join("refs/heads")).unwrap();
        std::fs::create_dir_all(project.git_dir().join("objects/pack")).unwrap();
        project.file(".git/HEAD", "ref: refs/heads/main\n");
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git_dir(&self) -> PathBuf {
        self.path().join(".git")
    }

    pub fn url(&self) -> String {
        format!("file://{}", self.git_dir().display())
    }

    pub fn file(&self, relative: &str, content: &str) {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path().join(relative)).unwrap()
    }

    /// `journal.toml` with a single remote and a harmless repack command
    pub fn remote(&self, name: &str, url: &str) {
        self.file(
            ".git/journal.toml",
            &format!(
                "[fetch]\nrepack_command = [\"true\"]\n\n[remotes.{}]\nurls = [\"{}\"]\n",
                name, url
            ),
        );
    }

    /// Install a pack whose index lists `objects`
    pub fn pack(&self, pack: &str, objects: &[&str]) {
        let dir = self.git_dir().join("objects/pack");
        std::fs::write(dir.join(format!("pack-{}.pack", pack)), b"PACK").unwrap();
        std::fs::write(dir.join(format!("pack-{}.idx", pack)), pack_index(objects)).unwrap();
    }

    pub fn gj(&self) -> CliBuilder {
        let mut cmd = Command::cargo_bin("gj").unwrap();
        cmd.arg("--git-dir").arg(self.git_dir());
        cmd.env_remove("GJ_LOG");
        cmd.env_remove("JOURNAL_PULL_PID");
        CliBuilder { cmd }
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert_eq!(run.code, 0, "expected success\nstderr: {}", run.stderr);
        run
    }

    pub fn exits(mut self, code: i32) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert_eq!(run.code, code, "unexpected exit\nstderr: {}", run.stderr);
        run
    }
}

pub struct RunAssert {
    code: i32,
    stdout: String,
    stderr: String,
}

impl From<std::process::Output> for RunAssert {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunAssert {
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout, expected);
        self
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            predicates::str::contains(needle).eval(&self.stdout),
            "stdout missing {:?}:\n{}",
            needle,
            self.stdout
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            predicates::str::contains(needle).eval(&self.stderr),
            "stderr missing {:?}:\n{}",
            needle,
            self.stderr
        );
        self
    }
}

/// Version 2 pack index listing `objects` (sorted hex ids)
pub fn pack_index(objects: &[&str]) -> Vec<u8> {
    let mut ids: Vec<Vec<u8>> = objects.iter().map(|hex| hex_bytes(hex)).collect();
    ids.sort();
    let mut out = vec![0xff, b't', b'O', b'c', 0, 0, 0, 2];
    for bucket in 0..256usize {
        let n = ids.iter().filter(|id| usize::from(id[0]) <= bucket).count() as u32;
        out.extend_from_slice(&n.to_be_bytes());
    }
    for id in &ids {
        out.extend_from_slice(id);
    }
    out.resize(out.len() + ids.len() * 8 + 40, 0);
    out
}

fn hex_bytes(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

/// A 40-digit id made of one repeated byte
pub fn oid(byte: &str) -> String {
    byte.repeat(20)
}
