use clap::Parser;
use hocon_conformance_config::{CommandConfig, Config};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "hocon-conformance",
    version,
    about = "Run a HOCON parser against a conformance corpus"
)]
pub struct Cli {
    #[arg(long, help = "Config file (default: ./hocon-conformance.toml if present)")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Git URL of the corpus repository")]
    pub corpus_repo: Option<String>,
    #[arg(long, help = "Branch, tag or commit of the corpus repository")]
    pub corpus_ref: Option<String>,
    #[arg(
        long,
        conflicts_with = "corpus_repo",
        help = "Use a local corpus directory instead of cloning"
    )]
    pub corpus_dir: Option<PathBuf>,
    #[arg(long, help = "Scratch directory, wiped before each run")]
    pub workdir: Option<PathBuf>,
    #[arg(long, help = "Parser under test, invoked as <subject> [args] <input>")]
    pub subject: Option<PathBuf>,
    #[arg(
        long = "subject-arg",
        allow_hyphen_values = true,
        help = "Extra argument passed to the subject before the input path (repeatable)"
    )]
    pub subject_args: Vec<String>,
    #[arg(long, help = "Per-file timeout in seconds; a timeout counts as a crash")]
    pub timeout_secs: Option<u64>,
    #[arg(long, help = "External canonicalizer, invoked as <canonicalizer> <path>")]
    pub canonicalizer: Option<PathBuf>,
    #[arg(long, help = "Allowlist file of tolerated failures, one filename per line")]
    pub known_failures: Option<PathBuf>,
    #[arg(long, help = "Output machine-readable JSON")]
    pub json: bool,
}

impl Cli {
    /// Command-line values win over the config file.
    ///
    /// Only the paths given here are expanded; the loaded config is already
    /// expanded and is not expanded again.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(repo) = &self.corpus_repo {
            config.corpus.repository = Some(repo.clone());
            config.corpus.path = None;
        }
        if let Some(reference) = &self.corpus_ref {
            config.corpus.reference = Some(reference.clone());
        }
        if let Some(dir) = &self.corpus_dir {
            config.corpus.path = Some(expanded(dir));
        }
        if let Some(workdir) = &self.workdir {
            config.workdir = expanded(workdir);
        }
        if let Some(subject) = &self.subject {
            config.subject.program = expanded(subject);
            config.subject.args = self.subject_args.clone();
        } else if !self.subject_args.is_empty() {
            config.subject.args = self.subject_args.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            config.subject.timeout_secs = Some(timeout);
        }
        if let Some(program) = &self.canonicalizer {
            config.canonicalizer = Some(CommandConfig {
                program: expanded(program),
                args: Vec::new(),
            });
        }
        if let Some(path) = &self.known_failures {
            config.known_failures_file = Some(expanded(path));
        }
    }
}

fn expanded(path: &Path) -> PathBuf {
    Config::expand_path(path).unwrap_or_else(|| path.to_path_buf())
}
