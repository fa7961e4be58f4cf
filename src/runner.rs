//! Run Orchestrator
//!
//! Glues the pieces of a run together: load and parse the template, emit
//! the header, short-circuit for dry runs, connect, execute every block,
//! and always tear the session down exactly once before reporting the
//! outcome.

use std::path::Path;

use chrono::Local;

use crate::config::{ConnectionProfile, RunConfig};
use crate::error::{Error, Result};
use crate::executor::BlockExecutor;
use crate::logsink::LogSink;
use crate::models::{ExecutionOutcome, Template};
use crate::session::{ShellSession, Transport};
use crate::template;

/// Read and parse a template file
pub fn load_template(path: &Path) -> Result<Template> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::TemplateRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(template::parse(&content))
}

/// Run one template against one device end to end.
///
/// When `config.expert_password` is unset, the login password doubles as
/// the expert password, matching how Gaia appliances are usually set up.
pub async fn run(
    profile: &ConnectionProfile,
    mut config: RunConfig,
    template_path: &Path,
    sink: &mut LogSink,
) -> ExecutionOutcome {
    let template = match load_template(template_path) {
        Ok(template) => template,
        Err(e) => {
            sink.write(&format!("FAILED: {}", e));
            return ExecutionOutcome::failed(0, e);
        }
    };

    sink.write(&format!(
        "Parsed {} blocks from {}",
        template.len(),
        template_path.display()
    ));
    sink.write(&format!(
        "Host: {}  User: {}  Gaia mode: {:?}",
        profile.host, profile.user, config.device_mode
    ));
    sink.write(&format!(
        "Start: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    if config.dry_run {
        return dry_run(&template, sink);
    }

    if config.expert_password.is_none() {
        config.expert_password = profile.password.clone();
    }

    let mut session = match ShellSession::connect(profile, config.timeouts.login()).await {
        Ok(session) => session,
        Err(e) => {
            sink.write(&format!("FAILED: {}", e));
            return ExecutionOutcome::failed(0, e);
        }
    };

    run_with_transport(&mut session, &template, &config, sink).await
}

/// Print the parsed blocks without touching any device
fn dry_run(template: &Template, sink: &mut LogSink) -> ExecutionOutcome {
    sink.write("DRY RUN: no commands will be sent");
    match serde_json::to_string_pretty(template.blocks()) {
        Ok(json) => {
            sink.write(&json);
            sink.write("Dry run complete.");
            ExecutionOutcome::ok(0, false)
        }
        Err(e) => {
            let e = Error::from(e);
            sink.write(&format!("FAILED: {}", e));
            ExecutionOutcome::failed(0, e)
        }
    }
}

/// Execute every block over an already-connected transport.
///
/// The transport is closed exactly once on every path out of this
/// function, success or failure.
pub async fn run_with_transport<T: Transport>(
    transport: &mut T,
    template: &Template,
    config: &RunConfig,
    sink: &mut LogSink,
) -> ExecutionOutcome {
    let mut executor = BlockExecutor::new(transport, config);
    let mut blocks_executed = 0usize;
    let mut failure: Option<Error> = None;

    for (index, block) in template.iter().enumerate() {
        debug!("Executing block {} of {} ({})", index + 1, template.len(), block.kind());
        match executor.execute_block(block, sink).await {
            Ok(()) => blocks_executed += 1,
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    let tolerated = executor.tolerated_hits() > 0;
    transport.close().await;

    match failure {
        None => {
            sink.write("All blocks applied.");
            sink.write(&format!(
                "End: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
            ExecutionOutcome::ok(blocks_executed, tolerated)
        }
        Some(e) => {
            sink.write(&format!("FAILED: {}", e));
            ExecutionOutcome::failed(blocks_executed, e)
        }
    }
}
