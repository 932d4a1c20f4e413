use std::fs;

use crate::canonical::{Canonicalize, Comparison, OutputSide, compare};
use crate::corpus::CorpusEntry;
use crate::subject::ParseSubject;
use crate::summary::{FileOutcome, RunRecorder, RunSummary};

/// Drives the subject over a corpus, one file at a time
pub struct Harness<'a> {
    subject: &'a dyn ParseSubject,
    canonicalizer: &'a dyn Canonicalize,
}

impl<'a> Harness<'a> {
    pub fn new(subject: &'a dyn ParseSubject, canonicalizer: &'a dyn Canonicalize) -> Self {
        Self {
            subject,
            canonicalizer,
        }
    }

    /// Process every entry in order. Per-file failures are recorded, never
    /// propagated.
    pub fn run(&self, entries: &[CorpusEntry]) -> RunSummary {
        log::info!("Running {} corpus files", entries.len());
        let mut recorder = RunRecorder::new();
        for entry in entries {
            let outcome = self.check(entry);
            match &outcome {
                FileOutcome::Matched => log::debug!("{}: ok", entry.name),
                FileOutcome::Crashed { detail } => log::warn!("{}: crashed: {detail}", entry.name),
                FileOutcome::Mismatched => log::warn!("{}: output differs", entry.name),
                FileOutcome::Malformed { side, detail } => {
                    log::warn!("{}: {side:?} output is not valid JSON: {detail}", entry.name)
                }
            }
            recorder.record(entry.name.as_str(), outcome);
        }
        recorder.finish()
    }

    /// Run the subject on a single entry and classify the result
    pub fn check(&self, entry: &CorpusEntry) -> FileOutcome {
        let run = match self.subject.parse(&entry.input) {
            Ok(run) => run,
            Err(e) => {
                return FileOutcome::Crashed {
                    detail: e.to_string(),
                };
            }
        };

        // Kept on disk for triage, crash output included
        if let Err(e) = fs::write(&entry.actual, &run.stdout) {
            log::warn!("Failed to write {}: {e}", entry.actual.display());
        }

        if !run.is_success() {
            let stderr = String::from_utf8_lossy(&run.stderr);
            let detail = match stderr.lines().find(|l| !l.trim().is_empty()) {
                Some(line) => format!("{}: {}", run.exit, line.trim()),
                None => run.exit.to_string(),
            };
            return FileOutcome::Crashed { detail };
        }

        let expected = match fs::read(&entry.expected) {
            Ok(bytes) => bytes,
            Err(e) => {
                return FileOutcome::Malformed {
                    side: OutputSide::Expected,
                    detail: e.to_string(),
                };
            }
        };

        match compare(self.canonicalizer, &expected, &run.stdout) {
            Ok(Comparison::Match) => FileOutcome::Matched,
            Ok(Comparison::Mismatch) => FileOutcome::Mismatched,
            Err(malformed) => FileOutcome::Malformed {
                side: malformed.side,
                detail: malformed.error.to_string(),
            },
        }
    }
}
