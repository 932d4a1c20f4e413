use serde::Serialize;
use std::io::{self, Write};

use crate::summary::{RunSummary, Triage, Verdict};

/// Machine-readable form of a finished run
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub ok: bool,
    pub summary: &'a RunSummary,
    pub triage: &'a Triage<'a>,
}

impl<'a> JsonReport<'a> {
    pub fn new(summary: &'a RunSummary, triage: &'a Triage<'a>) -> Self {
        Self {
            ok: triage.verdict.is_pass(),
            summary,
            triage,
        }
    }
}

/// Write the human-readable report.
///
/// The failing-file line is always written, blank on a clean run. The crash
/// line precedes the unexpected-failure lines, and crashed files never get an
/// `UNEXPECTED FAILURE` line.
pub fn write_console_report<W: Write>(
    out: &mut W,
    summary: &RunSummary,
    triage: &Triage<'_>,
) -> io::Result<()> {
    writeln!(
        out,
        "{} files : {} crashes, {} failed comparisons",
        summary.total(),
        summary.crashes(),
        summary.failed_comparisons()
    )?;

    let names: Vec<_> = summary.failures().iter().map(|f| f.name.as_str()).collect();
    writeln!(out, "{}", names.join(" "))?;

    if triage.verdict == Verdict::CrashFailure {
        writeln!(out, "FATAL: {} crashes", summary.crashes())?;
    }

    for name in &triage.unexpected {
        writeln!(out, "UNEXPECTED FAILURE: {name}")?;
    }
    Ok(())
}

pub fn render_console_report(summary: &RunSummary, triage: &Triage<'_>) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_console_report(&mut buf, summary, triage);
    String::from_utf8_lossy(&buf).into_owned()
}
