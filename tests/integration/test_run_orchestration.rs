//! Integration tests for run orchestration
//!
//! Dry runs, transcript files, and the teardown guarantee across both
//! successful and failed runs.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::fs;
use std::io::Write;

use gaiactl::config::{ConnectionProfile, RunConfig};
use gaiactl::logsink::{build_log_path, LogSink};
use gaiactl::{runner, template};

use test_utils::MockTransport;

#[tokio::test]
async fn test_dry_run_emits_blocks_without_connecting() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "set hostname gw-1\n::Sleep 2\n::ExpertMode command=expert prompt='password:' s3cret expert-prompt='#'\nid\n::ExpertModeEnd\n"
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("dry.cfg");
    let mut sink = LogSink::to_file(&log_path).unwrap();

    let profile = ConnectionProfile::new("203.0.113.5");
    let config = RunConfig {
        dry_run: true,
        ..RunConfig::default()
    };

    let outcome = runner::run(&profile, config, file.path(), &mut sink).await;
    assert!(outcome.success);
    assert_eq!(outcome.blocks_executed, 0);

    let transcript = fs::read_to_string(&log_path).unwrap();
    assert!(transcript.contains("Parsed 3 blocks"));
    assert!(transcript.contains("DRY RUN"));
    assert!(transcript.contains("\"type\": \"sleep\""));
    assert!(transcript.contains("\"type\": \"expert\""));
    // The inline expert password never reaches the transcript.
    assert!(!transcript.contains("s3cret"));
}

#[tokio::test]
async fn test_run_fails_cleanly_on_unreadable_template() {
    let profile = ConnectionProfile::new("gw-1");
    let config = RunConfig::default();
    let mut sink = LogSink::console_only();

    let outcome = runner::run(
        &profile,
        config,
        std::path::Path::new("/no/such/template.cfg"),
        &mut sink,
    )
    .await;
    assert!(!outcome.success);
    assert_eq!(outcome.blocks_executed, 0);
}

#[tokio::test]
async fn test_transport_closed_once_on_success() {
    let template = template::parse("set x\nset y");
    let mut transport = MockTransport::new();
    let config = RunConfig::default();
    let mut sink = LogSink::console_only();

    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;
    assert!(outcome.success);
    assert_eq!(transport.close_count, 1);
}

#[tokio::test]
async fn test_transport_closed_once_on_failure() {
    let template = template::parse("set x");
    let mut transport = MockTransport::new();
    transport.push_timeout("no prompt came back");
    let config = RunConfig::default();
    let mut sink = LogSink::console_only();

    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;
    assert!(!outcome.success);
    assert_eq!(transport.close_count, 1);
}

#[tokio::test]
async fn test_transcript_records_commands_and_terminal_line() {
    let template = template::parse("set hostname gw-1");
    let mut transport = MockTransport::new();
    let config = RunConfig::default();

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("run.cfg");
    let mut sink = LogSink::to_file(&log_path).unwrap();

    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;
    assert!(outcome.success);

    let transcript = fs::read_to_string(&log_path).unwrap();
    assert!(transcript.contains("CLISH> set hostname gw-1"));
    assert!(transcript.contains("All blocks applied."));
}

#[test]
fn test_derived_log_path_matches_template_stem() {
    let dir = tempfile::tempdir().unwrap();
    let derived = build_log_path(
        Some(dir.path()),
        None,
        std::path::Path::new("templates/branch-gw.cfg"),
    )
    .unwrap();
    let name = derived.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with("_branch-gw.cfg"));
    assert!(derived.starts_with(dir.path()));
}
