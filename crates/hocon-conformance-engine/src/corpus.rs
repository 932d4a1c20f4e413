use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to run git: {0}")]
    GitUnavailable(std::io::Error),
    #[error("git clone of {url} failed ({status}): {stderr}")]
    CloneFailed {
        url: String,
        status: String,
        stderr: String,
    },
    #[error("git checkout of {reference} failed ({status}): {stderr}")]
    CheckoutFailed {
        reference: String,
        status: String,
        stderr: String,
    },
    #[error("Local corpus not found: {0}")]
    LocalNotFound(PathBuf),
    #[error("Local corpus {corpus} is inside the workdir {workdir}, which is wiped on every run")]
    CorpusInsideWorkdir { corpus: PathBuf, workdir: PathBuf },
    #[error("Corpus directory missing: {0}")]
    MissingDirectory(PathBuf),
}

/// Where the corpus comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    /// A git repository, optionally pinned to a branch, tag or commit
    Git {
        url: String,
        reference: Option<String>,
    },
    /// A directory on disk, copied into the workdir
    Local(PathBuf),
}

/// Names of the two parallel trees and the extensions that pair them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusLayout {
    pub inputs_dir: String,
    pub expected_dir: String,
    pub input_extension: String,
    pub expected_extension: String,
}

impl Default for CorpusLayout {
    fn default() -> Self {
        Self {
            inputs_dir: "inputs".to_string(),
            expected_dir: "expected".to_string(),
            input_extension: "conf".to_string(),
            expected_extension: "json".to_string(),
        }
    }
}

/// A freshly populated corpus checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDirs {
    pub root: PathBuf,
    pub inputs_dir: PathBuf,
    pub expected_dir: PathBuf,
    pub actual_dir: PathBuf,
}

/// One input document paired with its expected output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    /// File name of the input, used in reports and the known-failure registry
    pub name: String,
    pub input: PathBuf,
    pub expected: PathBuf,
    pub actual: PathBuf,
}

/// Wipe `workdir` and re-populate it from `source`.
///
/// The returned `actual_dir` always exists and is empty. Any failure here is
/// fatal for the run. A local corpus may contain the workdir (it is left out
/// of the copy) but may not live inside it.
pub fn prepare(
    source: &CorpusSource,
    workdir: &Path,
    layout: &CorpusLayout,
) -> Result<CorpusDirs, CorpusError> {
    if let CorpusSource::Local(path) = source {
        if !path.is_dir() {
            return Err(CorpusError::LocalNotFound(path.clone()));
        }
        if workdir.exists() && fs::canonicalize(path)?.starts_with(fs::canonicalize(workdir)?) {
            return Err(CorpusError::CorpusInsideWorkdir {
                corpus: path.clone(),
                workdir: workdir.to_path_buf(),
            });
        }
    }

    if workdir.exists() {
        log::info!("Removing stale workdir {}", workdir.display());
        fs::remove_dir_all(workdir)?;
    }
    if let Some(parent) = workdir.parent() {
        fs::create_dir_all(parent)?;
    }

    let root = workdir.join("corpus");
    match source {
        CorpusSource::Git { url, reference } => clone(url, reference.as_deref(), &root)?,
        CorpusSource::Local(path) => {
            log::info!("Copying corpus from {}", path.display());
            fs::create_dir_all(&root)?;
            let workdir = fs::canonicalize(workdir)?;
            copy_dir_all(path, &root, &workdir)?;
        }
    }

    let inputs_dir = root.join(&layout.inputs_dir);
    let expected_dir = root.join(&layout.expected_dir);
    for dir in [&inputs_dir, &expected_dir] {
        if !dir.is_dir() {
            return Err(CorpusError::MissingDirectory(dir.clone()));
        }
    }

    let actual_dir = workdir.join("actual");
    fs::create_dir_all(&actual_dir)?;

    Ok(CorpusDirs {
        root,
        inputs_dir,
        expected_dir,
        actual_dir,
    })
}

/// List corpus entries sorted by name.
///
/// Entries are driven by the expected-output tree; an expected file whose
/// input is absent on disk is skipped.
pub fn entries(dirs: &CorpusDirs, layout: &CorpusLayout) -> Result<Vec<CorpusEntry>, CorpusError> {
    let mut expected_files = Vec::new();
    for entry in fs::read_dir(&dirs.expected_dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == layout.expected_extension.as_str())
        {
            expected_files.push(path);
        }
    }
    expected_files.sort();

    let mut out = Vec::with_capacity(expected_files.len());
    for expected in expected_files {
        let Some(stem) = expected.file_stem() else {
            continue;
        };
        let input = dirs
            .inputs_dir
            .join(with_extension(stem, &layout.input_extension));
        if !input.is_file() {
            log::debug!("Skipping {}: no input at {}", expected.display(), input.display());
            continue;
        }
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let actual = dirs
            .actual_dir
            .join(with_extension(stem, &layout.expected_extension));
        out.push(CorpusEntry {
            name,
            input,
            expected,
            actual,
        });
    }
    Ok(out)
}

/// `<stem>.<extension>`, without treating dots inside the stem as an extension
fn with_extension(stem: &OsStr, extension: &str) -> OsString {
    let mut file = stem.to_os_string();
    file.push(".");
    file.push(extension);
    file
}

fn clone(url: &str, reference: Option<&str>, dest: &Path) -> Result<(), CorpusError> {
    log::info!(
        "Cloning corpus {url}{}",
        reference.map(|r| format!(" at {r}")).unwrap_or_default()
    );
    let mut cmd = Command::new("git");
    cmd.arg("clone").arg("--quiet");
    match reference {
        // `--branch` only takes branch and tag names, so commits need the full history
        Some(commit) if is_commit_id(commit) => {
            cmd.arg("--no-checkout").arg(url).arg(dest);
            git(&mut cmd, |status, stderr| CorpusError::CloneFailed {
                url: url.to_string(),
                status,
                stderr,
            })?;

            let mut checkout = Command::new("git");
            checkout
                .arg("-C")
                .arg(dest)
                .args(["checkout", "--quiet", "--detach", commit]);
            git(&mut checkout, |status, stderr| CorpusError::CheckoutFailed {
                reference: commit.to_string(),
                status,
                stderr,
            })
        }
        _ => {
            cmd.arg("--depth").arg("1");
            if let Some(reference) = reference {
                cmd.arg("--branch").arg(reference);
            }
            cmd.arg(url).arg(dest);
            git(&mut cmd, |status, stderr| CorpusError::CloneFailed {
                url: url.to_string(),
                status,
                stderr,
            })
        }
    }
}

/// An abbreviated or full hex object name
fn is_commit_id(reference: &str) -> bool {
    (7..=40).contains(&reference.len()) && reference.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Run a git command; a non-zero exit becomes `failed(status, stderr)`
fn git(
    cmd: &mut Command,
    failed: impl FnOnce(String, String) -> CorpusError,
) -> Result<(), CorpusError> {
    let output = cmd.output().map_err(CorpusError::GitUnavailable)?;
    if !output.status.success() {
        return Err(failed(
            output.status.to_string(),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Recursive copy that leaves out `skip` (a canonical path) and everything below it
fn copy_dir_all(src: &Path, dst: &Path, skip: &Path) -> Result<(), CorpusError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            if fs::canonicalize(entry.path())? == skip {
                log::debug!("Not copying the workdir {}", entry.path().display());
                continue;
            }
            copy_dir_all(&entry.path(), &to, skip)?;
        } else {
            fs::copy(entry.path(), to)?;
        }
    }
    Ok(())
}
