use serde::Serialize;

use crate::canonical::OutputSide;
use crate::known_failures::KnownFailures;

/// Terminal state of one corpus entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileOutcome {
    Matched,
    /// The subject exited non-zero, timed out or could not be started
    Crashed { detail: String },
    Mismatched,
    /// One side could not be canonicalized
    Malformed { side: OutputSide, detail: String },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, FileOutcome::Matched)
    }

    pub fn is_crash(&self) -> bool {
        matches!(self, FileOutcome::Crashed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Accumulates per-file outcomes during a run
#[derive(Debug, Default)]
pub struct RunRecorder {
    total: usize,
    crashes: usize,
    failed_comparisons: usize,
    failures: Vec<Failure>,
}

impl RunRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, outcome: FileOutcome) {
        self.total += 1;
        match outcome {
            FileOutcome::Matched => return,
            FileOutcome::Crashed { .. } => self.crashes += 1,
            FileOutcome::Mismatched | FileOutcome::Malformed { .. } => {
                self.failed_comparisons += 1
            }
        }
        self.failures.push(Failure {
            name: name.into(),
            outcome,
        });
    }

    pub fn finish(self) -> RunSummary {
        RunSummary {
            total: self.total,
            crashes: self.crashes,
            failed_comparisons: self.failed_comparisons,
            failures: self.failures,
        }
    }
}

/// Frozen result of a whole corpus run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    total: usize,
    crashes: usize,
    failed_comparisons: usize,
    failures: Vec<Failure>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn crashes(&self) -> usize {
        self.crashes
    }

    pub fn failed_comparisons(&self) -> usize {
        self.failed_comparisons
    }

    /// Failing entries in processing order
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Split comparison failures against the known-failure registry and
    /// decide the verdict. Crashes are kept apart: they are never tolerated.
    pub fn triage<'a>(&'a self, known: &KnownFailures) -> Triage<'a> {
        let mut crashed = Vec::new();
        let mut unexpected = Vec::new();
        let mut tolerated = Vec::new();
        for failure in &self.failures {
            let name = failure.name.as_str();
            if failure.outcome.is_crash() {
                crashed.push(name);
            } else if known.is_known(name) {
                tolerated.push(name);
            } else {
                unexpected.push(name);
            }
        }

        let verdict = if self.crashes > 0 {
            Verdict::CrashFailure
        } else if !unexpected.is_empty() {
            Verdict::UnexpectedFailure
        } else {
            Verdict::Pass
        };

        Triage {
            crashed,
            unexpected,
            tolerated,
            verdict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// At least one crash; takes precedence over unexpected failures
    CrashFailure,
    UnexpectedFailure,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }

    pub fn exit_code(self) -> u8 {
        if self.is_pass() { 0 } else { 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triage<'a> {
    pub crashed: Vec<&'a str>,
    pub unexpected: Vec<&'a str>,
    pub tolerated: Vec<&'a str>,
    pub verdict: Verdict,
}
