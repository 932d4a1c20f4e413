#![cfg(unix)]

mod common;

use common::TestEnv;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use serde_json::Value;

#[test]
fn clean_corpus_passes() {
    let env = TestEnv::new();
    env.pair("a", r#"{"b": 2, "a": 1}"#, r#"{"a":1,"b":2}"#)
        .pair("b", "[1, 2, 3]", "[1,2,3]");

    env.run()
        .assert()
        .success()
        .stdout("2 files : 0 crashes, 0 failed comparisons\n\n");
}

#[test]
fn known_mismatches_are_tolerated() {
    let env = TestEnv::new();
    env.pair("dot-number", r#"{"a": 0.5}"#, r#"{"a": ".5"}"#)
        .pair("ok", "{}", "{}");
    let known = env.write("known.txt", "# lexed as a number\ndot-number.conf\n");

    env.run()
        .arg("--known-failures")
        .arg(&known)
        .assert()
        .success()
        .stdout("2 files : 0 crashes, 1 failed comparisons\ndot-number.conf\n");
}

#[test]
fn unexpected_mismatch_fails() {
    let env = TestEnv::new();
    env.pair("drift", r#"{"a": 1}"#, r#"{"a": 2}"#);

    env.run()
        .assert()
        .code(1)
        .stdout(contains("UNEXPECTED FAILURE: drift.conf"));
}

#[test]
fn crash_fails_without_unexpected_line() {
    let env = TestEnv::new();
    env.pair("crash-me", "{}", "{}").pair("fine", "{}", "{}");

    let output = env.run().assert().code(1).get_output().stdout.clone();

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "2 files : 1 crashes, 0 failed comparisons\ncrash-me.conf\nFATAL: 1 crashes\n"
    );
}

#[test]
fn crash_on_known_failure_still_fails() {
    let env = TestEnv::new();
    env.pair("crash-known", "{}", "{}");
    let known = env.write("known.txt", "crash-known.conf\n");

    env.run()
        .arg("--known-failures")
        .arg(&known)
        .assert()
        .code(1)
        .stdout(contains("FATAL: 1 crashes"));
}

#[test]
fn malformed_output_is_a_failed_comparison() {
    let env = TestEnv::new();
    env.pair("garbage", "a = 1", "{\"a\": 1}");

    env.run()
        .assert()
        .code(1)
        .stdout(contains("1 files : 0 crashes, 1 failed comparisons"))
        .stdout(contains("UNEXPECTED FAILURE: garbage.conf"));
}

#[test]
fn timeout_counts_as_crash() {
    let env = TestEnv::new();
    env.pair("slow", "{}", "{}");

    env.cmd()
        .arg("--corpus-dir")
        .arg(&env.corpus)
        .arg("--workdir")
        .arg(&env.workdir)
        .args(["--subject", "sh", "--subject-arg", "-c", "--subject-arg", "exec sleep 30"])
        .args(["--timeout-secs", "1"])
        .assert()
        .code(1)
        .stdout(contains("1 files : 1 crashes, 0 failed comparisons"));
}

#[test]
fn json_report_lists_triage() {
    let env = TestEnv::new();
    env.pair("known", r#"{"a": 1}"#, r#"{"a": 2}"#)
        .pair("crash-x", "{}", "{}")
        .pair("ok", "{}", "{}");
    let known = env.write("known.txt", "known.conf\n");

    let out = env
        .run()
        .arg("--json")
        .arg("--known-failures")
        .arg(&known)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&out).expect("valid json output");

    assert_eq!(report["ok"], false);
    assert_eq!(report["summary"]["total"], 3);
    assert_eq!(report["summary"]["crashes"], 1);
    assert_eq!(report["triage"]["verdict"], "crash_failure");
    assert_eq!(report["triage"]["crashed"], serde_json::json!(["crash-x.conf"]));
    assert_eq!(report["triage"]["tolerated"], serde_json::json!(["known.conf"]));
}

#[test]
fn config_file_drives_the_run() {
    let env = TestEnv::new();
    env.pair("dot-number", r#"{"a": 0.5}"#, r#"{"a": ".5"}"#);
    let config = env.write(
        "conformance.toml",
        &format!(
            r#"
workdir = "{workdir}"
known_failures = ["dot-number.conf"]

[corpus]
path = "{corpus}"

[subject]
program = "sh"
args = ["-c", 'cat "$0"']
"#,
            workdir = env.workdir.display(),
            corpus = env.corpus.display(),
        ),
    );

    env.cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout("1 files : 0 crashes, 1 failed comparisons\ndot-number.conf\n");
}

#[test]
fn rerun_is_idempotent() {
    let env = TestEnv::new();
    env.pair("a", "{}", "{}").pair("b", "[1]", "[2]");

    let first = env.run().assert().code(1).get_output().stdout.clone();
    let second = env.run().assert().code(1).get_output().stdout.clone();

    assert_eq!(first, second);
}

#[test]
fn missing_corpus_aborts_before_running() {
    let env = TestEnv::new();

    env.cmd()
        .arg("--corpus-dir")
        .arg(env.corpus.join("does-not-exist"))
        .arg("--workdir")
        .arg(&env.workdir)
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("Failed to acquire the corpus"));
}

#[test]
fn no_corpus_configured_is_an_error() {
    let env = TestEnv::new();

    env.cmd()
        .assert()
        .code(1)
        .stderr(contains("No corpus configured"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let env = TestEnv::new();

    env.cmd()
        .args(["--config", "nope.toml"])
        .assert()
        .code(1)
        .stderr(contains("Config file not found"));
}
