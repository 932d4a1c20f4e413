use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "hocon-conformance.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scratch directory, wiped at the start of every run
    pub workdir: PathBuf,
    /// Input filenames whose comparison failure is tolerated
    pub known_failures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_failures_file: Option<PathBuf>,
    pub corpus: CorpusConfig,
    pub subject: SubjectConfig,
    /// External canonicalizer; the built-in one is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonicalizer: Option<CommandConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("target/hocon-conformance"),
            known_failures: Vec::new(),
            known_failures_file: None,
            corpus: CorpusConfig::default(),
            subject: SubjectConfig::default(),
            canonicalizer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Git URL of the corpus repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Branch, tag or commit to check out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Local corpus directory, used instead of `repository` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub inputs_dir: String,
    pub expected_dir: String,
    pub input_extension: String,
    pub expected_extension: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            repository: None,
            reference: None,
            path: None,
            inputs_dir: "inputs".to_string(),
            expected_dir: "expected".to_string(),
            input_extension: "conf".to_string(),
            expected_extension: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Per-file limit; unset means wait forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("hocon2json"),
            args: Vec::new(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.expand_paths();
        Ok(Some(config))
    }

    /// Load the config file from the working directory, if there is one
    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Expand `~` and `$VAR` in every path-valued field
    fn expand_paths(&mut self) {
        expand_in_place(&mut self.workdir);
        if let Some(path) = self.corpus.path.as_mut() {
            expand_in_place(path);
        }
        expand_in_place(&mut self.subject.program);
        if let Some(canonicalizer) = self.canonicalizer.as_mut() {
            expand_in_place(&mut canonicalizer.program);
        }
        if let Some(path) = self.known_failures_file.as_mut() {
            expand_in_place(path);
        }
    }

    /// Expand `~` and `$VAR` in one path; `None` when a variable is unset
    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

fn expand_in_place(path: &mut PathBuf) {
    if let Some(expanded) = Config::expand_path(path) {
        *path = expanded;
    }
}
