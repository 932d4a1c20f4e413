use anyhow::{Context, Result, bail};
use clap::Parser;
use hocon_conformance_config::Config;
use hocon_conformance_engine::{
    Canonicalize, CorpusLayout, CorpusSource, Harness, JsonCanonicalizer, JsonReport,
    KnownFailures, ProcessCanonicalizer, ProcessSubject, Verdict, corpus, write_console_report,
};
use std::io::{Write, stdout};
use std::process::ExitCode;
use std::time::Duration;

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report. RUST_LOG overrides the level.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(e) => {
            log::error!("Run aborted: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Verdict> {
    let mut config = load_config(cli)?;
    cli.apply_to(&mut config);

    let known = known_failures(&config)?;
    log::info!("{} known failures registered", known.len());

    let source = corpus_source(&config)?;
    let layout = CorpusLayout {
        inputs_dir: config.corpus.inputs_dir.clone(),
        expected_dir: config.corpus.expected_dir.clone(),
        input_extension: config.corpus.input_extension.clone(),
        expected_extension: config.corpus.expected_extension.clone(),
    };
    let dirs = corpus::prepare(&source, &config.workdir, &layout)
        .context("Failed to acquire the corpus")?;
    let entries = corpus::entries(&dirs, &layout).context("Failed to list the corpus")?;

    let subject = ProcessSubject::new(&config.subject.program)
        .with_args(config.subject.args.iter().cloned())
        .with_timeout(config.subject.timeout_secs.map(Duration::from_secs));
    let canonicalizer: Box<dyn Canonicalize> = match &config.canonicalizer {
        Some(command) => Box::new(
            ProcessCanonicalizer::new(&command.program).with_args(command.args.iter().cloned()),
        ),
        None => Box::new(JsonCanonicalizer),
    };
    log::info!("Subject: {}", subject.program().display());

    let summary = Harness::new(&subject, &*canonicalizer).run(&entries);
    let triage = summary.triage(&known);

    let mut out = stdout().lock();
    if cli.json {
        let report = JsonReport::new(&summary, &triage);
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_console_report(&mut out, &summary, &triage)?;
    }
    out.flush()?;

    log::info!("Verdict: {:?}", triage.verdict);
    Ok(triage.verdict)
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => match Config::load_from_path(path)? {
            Some(config) => Ok(config),
            None => bail!("Config file not found: {}", path.display()),
        },
        None => {
            let config = Config::load()?;
            if config.is_none() {
                log::info!(
                    "No {} found, using defaults",
                    Config::config_path().display()
                );
            }
            Ok(config.unwrap_or_default())
        }
    }
}

fn corpus_source(config: &Config) -> Result<CorpusSource> {
    if let Some(path) = &config.corpus.path {
        return Ok(CorpusSource::Local(path.clone()));
    }
    match &config.corpus.repository {
        Some(url) => Ok(CorpusSource::Git {
            url: url.clone(),
            reference: config.corpus.reference.clone(),
        }),
        None => bail!(
            "No corpus configured: pass --corpus-repo or --corpus-dir, or set [corpus] in {}",
            Config::config_path().display()
        ),
    }
}

fn known_failures(config: &Config) -> Result<KnownFailures> {
    let listed: KnownFailures = config.known_failures.iter().cloned().collect();
    match &config.known_failures_file {
        Some(path) => Ok(listed.merged(KnownFailures::load_from_path(path)?)),
        None => Ok(listed),
    }
}
