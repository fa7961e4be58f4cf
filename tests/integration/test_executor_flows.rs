//! Integration tests for block execution flows
//!
//! Drives the block executor and orchestrator over a scripted transport,
//! covering the tolerated-error policy, expert-mode entry and exit, and
//! teardown guarantees.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use zeroize::Zeroizing;

use gaiactl::config::{DeviceMode, RunConfig};
use gaiactl::error::Error;
use gaiactl::executor::BlockExecutor;
use gaiactl::logsink::LogSink;
use gaiactl::models::SessionMode;
use gaiactl::{runner, template};

use test_utils::MockTransport;

#[tokio::test]
async fn test_tolerated_failure_continues_run() {
    let template = template::parse("add network net-a\nadd network net-a\nset ntp active on");
    let mut transport = MockTransport::new();
    transport
        .push_match(0, "")
        .push_timeout("CLINFR0329  Object already exists")
        .push_match(0, "");

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(outcome.success);
    assert!(outcome.error_tolerated);
    assert_eq!(outcome.blocks_executed, 1);
    assert_eq!(transport.sent_lines.len(), 3);
    assert_eq!(transport.close_count, 1);
}

#[tokio::test]
async fn test_fatal_failure_stops_run() {
    let template = template::parse("set bogus thing\n::Sleep 0\nset ntp active on");
    let mut transport = MockTransport::new();
    transport.push_timeout("Invalid command: 'set bogus thing'");

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(!outcome.success);
    assert_eq!(outcome.blocks_executed, 0);
    match outcome.error {
        Some(Error::CommandTimeout { command }) => assert_eq!(command, "set bogus thing"),
        other => panic!("unexpected outcome error: {:?}", other),
    }
    // Nothing past the failing command went out, and teardown still ran.
    assert_eq!(transport.sent_lines.len(), 1);
    assert_eq!(transport.close_count, 1);
}

#[tokio::test]
async fn test_expert_commands_are_never_tolerated() {
    let text = "::ExpertMode command=expert prompt='password:' expert-prompt='#'\n\
                cp /etc/hosts /etc/hosts.bak\n\
                ::ExpertModeEnd";
    let template = template::parse(text);

    let mut transport = MockTransport::new();
    // Direct entry to the expert prompt, then a failure whose text would
    // be tolerated at the clish level.
    transport
        .push_match(1, "")
        .push_timeout("object already exists");

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(!outcome.success);
    assert!(!outcome.error_tolerated);
    match outcome.error {
        Some(Error::CommandFatal { command }) => {
            assert_eq!(command, "cp /etc/hosts /etc/hosts.bak");
        }
        other => panic!("unexpected outcome error: {:?}", other),
    }
    assert_eq!(transport.close_count, 1);
}

#[tokio::test]
async fn test_expert_entry_sends_inline_password() {
    let text = "::ExpertMode command=expert prompt='password:' secret123 expert-prompt='#'\n\
                show version\n\
                ::ExpertModeEnd command=exit prompt='>'";
    let template = template::parse(text);

    let mut transport = MockTransport::new();
    transport
        .push_match(0, "") // password prompt
        .push_match(0, "") // expert prompt after the password
        .push_match(0, "") // command completed
        .push_match(0, ""); // exit prompt

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(outcome.success);
    assert_eq!(transport.sent_secrets, vec!["secret123".to_string()]);
    assert_eq!(
        transport.sent_lines,
        vec![
            "expert".to_string(),
            "show version".to_string(),
            "exit".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_expert_password_falls_back_to_run_config() {
    let text = "::ExpertMode command=expert prompt='password:' expert-prompt='#'\nid\n::ExpertModeEnd";
    let template = template::parse(text);

    let mut transport = MockTransport::new();
    transport.push_match(0, ""); // password prompt; remaining waits default to matches

    let config = RunConfig {
        expert_password: Some(Zeroizing::new("fallback-pw".to_string())),
        ..RunConfig::default()
    };
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(outcome.success);
    assert_eq!(transport.sent_secrets, vec!["fallback-pw".to_string()]);
}

#[tokio::test]
async fn test_expert_password_missing_is_fatal() {
    let text = "::ExpertMode command=expert prompt='password:' expert-prompt='#'\nid\n::ExpertModeEnd";
    let template = template::parse(text);

    let mut transport = MockTransport::new();
    transport.push_match(0, ""); // password prompt with nothing to answer it

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(!outcome.success);
    match outcome.error {
        Some(Error::ExpertEntryFailed { reason }) => assert!(reason.contains("missing")),
        other => panic!("unexpected outcome error: {:?}", other),
    }
    assert!(transport.sent_secrets.is_empty());
    assert_eq!(transport.close_count, 1);
}

#[tokio::test]
async fn test_failed_expert_exit_is_fatal() {
    let text = "::ExpertMode command=expert prompt='password:' expert-prompt='#'\n\
                id\n\
                ::ExpertModeEnd command=exit prompt='>'";
    let template = template::parse(text);

    // Raw output script: entry and the command land at the expert prompt,
    // but the exit is refused and the device reprints '#'. No '>' ever
    // appears, so the exit wait must not be satisfied.
    let mut transport = MockTransport::new();
    transport
        .push_output("[Expert@gw-1]# ")
        .push_output("uid=0(admin)\r\n[Expert@gw-1]# ")
        .push_output("exit blocked by policy\r\n[Expert@gw-1]# ");

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(!outcome.success);
    assert!(matches!(outcome.error, Some(Error::ExpertExitFailed)));
    assert_eq!(outcome.blocks_executed, 0);
    assert_eq!(transport.close_count, 1);
}

#[tokio::test]
async fn test_mode_stays_expert_when_exit_fails() {
    let text = "::ExpertMode command=expert prompt='password:' expert-prompt='#'\nid\n::ExpertModeEnd";
    let template = template::parse(text);

    let mut transport = MockTransport::new();
    transport
        .push_output("[Expert@gw-1]# ")
        .push_output("[Expert@gw-1]# ")
        .push_output("[Expert@gw-1]# ");

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let mut executor = BlockExecutor::new(&mut transport, &config);
    assert_eq!(executor.mode(), SessionMode::Clish);

    let err = executor
        .execute_block(&template.blocks()[0], &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ExpertExitFailed));
    assert_eq!(executor.mode(), SessionMode::Expert);
}

#[tokio::test]
async fn test_mode_returns_to_clish_after_expert_exit() {
    let text = "::ExpertMode command=expert prompt='password:' expert-prompt='#'\nid\n::ExpertModeEnd";
    let template = template::parse(text);

    let mut transport = MockTransport::new();
    transport
        .push_output("[Expert@gw-1]# ")
        .push_output("[Expert@gw-1]# ")
        .push_output("logout\r\ngw-1> ");

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let mut executor = BlockExecutor::new(&mut transport, &config);
    executor
        .execute_block(&template.blocks()[0], &mut sink)
        .await
        .unwrap();
    assert_eq!(executor.mode(), SessionMode::Clish);
}

#[tokio::test]
async fn test_full_mode_wraps_clish_commands() {
    let template = template::parse("set hostname gw-1");
    let mut transport = MockTransport::new();

    let config = RunConfig {
        device_mode: DeviceMode::Full,
        ..RunConfig::default()
    };
    let mut sink = LogSink::console_only();
    let outcome = runner::run_with_transport(&mut transport, &template, &config, &mut sink).await;

    assert!(outcome.success);
    assert_eq!(
        transport.sent_lines,
        vec!["clish -s -c 'set hostname gw-1'".to_string()]
    );
}

#[tokio::test]
async fn test_sleep_block_sends_nothing() {
    let template = template::parse("::Sleep 0");
    let mut transport = MockTransport::new();

    let config = RunConfig::default();
    let mut sink = LogSink::console_only();
    let mut executor = BlockExecutor::new(&mut transport, &config);
    executor
        .execute_block(&template.blocks()[0], &mut sink)
        .await
        .unwrap();
    assert_eq!(executor.tolerated_hits(), 0);
    drop(executor);
    assert!(transport.sent_lines.is_empty());
}
