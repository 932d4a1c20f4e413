use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Echoes the input back as the parser output; crashes on files named `*crash*`
pub const ECHO_SUBJECT: &str = r#"case "$0" in *crash*) echo boom >&2; exit 2;; esac; cat "$0""#;

pub struct TestEnv {
    tmp: TempDir,
    pub corpus: PathBuf,
    pub workdir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let corpus = tmp.path().join("corpus");
        fs::create_dir_all(corpus.join("inputs")).expect("create inputs");
        fs::create_dir_all(corpus.join("expected")).expect("create expected");
        let workdir = tmp.path().join("work");
        Self {
            tmp,
            corpus,
            workdir,
        }
    }

    /// Add a corpus pair; the echo subject outputs `input` verbatim
    pub fn pair(&self, stem: &str, input: &str, expected: &str) -> &Self {
        fs::write(self.corpus.join(format!("inputs/{stem}.conf")), input).expect("write input");
        fs::write(self.corpus.join(format!("expected/{stem}.json")), expected)
            .expect("write expected");
        self
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.tmp.path().join(name);
        fs::write(&path, content).expect("write file");
        path
    }

    /// Binary in an isolated cwd with no config file
    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("hocon-conformance");
        cmd.current_dir(self.tmp.path()).env("RUST_LOG", "warn");
        cmd
    }

    /// Binary wired to the local corpus and the echo subject
    pub fn run(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--corpus-dir")
            .arg(&self.corpus)
            .arg("--workdir")
            .arg(&self.workdir)
            .args(["--subject", "sh", "--subject-arg", "-c", "--subject-arg", ECHO_SUBJECT]);
        cmd
    }
}
