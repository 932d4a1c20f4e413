
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::subject::{InvokeError, ParseSubject, SubjectExit, SubjectRun};

/// Create an empty temporary directory
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a file (and its parent directories) with content
pub fn create_test_file(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}

/// Create a corpus in the default layout from `(stem, input, expected)` triples
pub fn create_test_corpus(pairs: &[(&str, &str, &str)]) -> TempDir {
    let dir = create_test_dir();
    fs::create_dir_all(dir.path().join("inputs")).unwrap();
    fs::create_dir_all(dir.path().join("expected")).unwrap();
    for (stem, input, expected) in pairs {
        create_test_file(&dir, &format!("inputs/{stem}.conf"), input);
        create_test_file(&dir, &format!("expected/{stem}.json"), expected);
    }
    dir
}

/// Subject that echoes the input file back, or crashes when it contains `CRASH`
pub struct EchoSubject;

impl ParseSubject for EchoSubject {
    fn parse(&self, input: &Path) -> Result<SubjectRun, InvokeError> {
        let content = fs::read(input)?;
        if content.windows(5).any(|w| w == b"CRASH") {
            return Ok(SubjectRun {
                stdout: b"partial".to_vec(),
                stderr: b"boom".to_vec(),
                exit: SubjectExit::Failed(Some(101)),
            });
        }
        Ok(SubjectRun {
            stdout: content,
            stderr: Vec::new(),
            exit: SubjectExit::Success,
        })
    }
}
