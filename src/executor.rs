//! Block Executor
//!
//! Drives the transport session through clish and expert sub-states, one
//! block at a time, applying the tolerated-error policy. Execution is
//! strictly sequential: a fatal error in any block aborts the rest of the
//! run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{DeviceMode, RunConfig};
use crate::error::{Error, Result};
use crate::logsink::LogSink;
use crate::models::{Block, ExpertBlock, SessionMode};
use crate::session::{Expect, ExpectEvent, Transport};

/// Known-benign failure fragments: a clish command whose captured output
/// contains one of these (case-insensitive) is logged and skipped instead
/// of aborting the run. Operators extend the set per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleratedErrors {
    substrings: Vec<String>,
}

impl ToleratedErrors {
    pub fn new(substrings: impl IntoIterator<Item = String>) -> Self {
        Self {
            substrings: substrings.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Append extra substrings to the set
    pub fn extend(&mut self, extra: impl IntoIterator<Item = String>) {
        self.substrings
            .extend(extra.into_iter().map(|s| s.to_lowercase()));
    }

    /// Case-insensitive containment check against the captured output
    pub fn is_tolerated(&self, output: &str) -> bool {
        let lowered = output.to_lowercase();
        self.substrings.iter().any(|s| lowered.contains(s))
    }

    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }
}

impl Default for ToleratedErrors {
    fn default() -> Self {
        Self::new([
            "already configured".to_string(),
            "object already exists".to_string(),
            "a contradicting route already exists".to_string(),
            "internetconnection.ipaddr property or method does not exist".to_string(),
            "failed to find the requested interface".to_string(),
        ])
    }
}

/// Quote a string for a POSIX shell single-quoted context
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Outgoing text for a clish command line.
///
/// The full-OS variant lands in a bash shell after login, so every command
/// re-enters the restricted shell as a single-shot invocation.
pub fn format_clish_command(line: &str, mode: DeviceMode) -> String {
    match mode {
        DeviceMode::Spark => line.to_string(),
        DeviceMode::Full => format!("clish -s -c {}", shell_quote(line)),
    }
}

/// Executes blocks over a transport, tracking the session sub-state
pub struct BlockExecutor<'a, T: Transport> {
    transport: &'a mut T,
    config: &'a RunConfig,
    mode: SessionMode,
    tolerated_hits: usize,
}

impl<'a, T: Transport> BlockExecutor<'a, T> {
    /// Wrap a connected transport; the session starts in clish
    pub fn new(transport: &'a mut T, config: &'a RunConfig) -> Self {
        Self {
            transport,
            config,
            mode: SessionMode::Clish,
            tolerated_hits: 0,
        }
    }

    /// Number of clish failures downgraded by the tolerated policy so far
    pub fn tolerated_hits(&self) -> usize {
        self.tolerated_hits
    }

    /// Current sub-state
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Execute one block to completion or fatal error
    pub async fn execute_block(&mut self, block: &Block, sink: &mut LogSink) -> Result<()> {
        match block {
            Block::Sleep { seconds } => {
                sink.write(&format!("-- SLEEP {}s", seconds));
                tokio::time::sleep(Duration::from_secs(*seconds)).await;
                Ok(())
            }
            Block::Clish { items } => self.run_clish_items(items, sink).await,
            Block::Expert(expert) => self.run_expert_block(expert, sink).await,
        }
    }

    async fn run_clish_items(&mut self, items: &[String], sink: &mut LogSink) -> Result<()> {
        let timeout = self.config.timeouts.clish();
        for line in items {
            sink.write(&format!("CLISH> {}", line));
            let command = format_clish_command(line, self.config.device_mode);
            self.transport.send_line(&command).await?;

            let event = self
                .transport
                .expect_any(&[Expect::Operational], timeout)
                .await?;
            let output = event.before().trim().to_string();
            if !output.is_empty() {
                sink.write(&output);
            }

            if !event.is_match() {
                if self.config.tolerated.is_tolerated(&output) {
                    self.tolerated_hits += 1;
                    sink.write("  (tolerated)");
                    continue;
                }
                return Err(Error::CommandTimeout {
                    command: line.clone(),
                });
            }
        }
        Ok(())
    }

    async fn run_expert_block(&mut self, block: &ExpertBlock, sink: &mut LogSink) -> Result<()> {
        let timeout = self.config.timeouts.expert();
        sink.write(&format!("-- ENTER EXPERT ({})", block.enter_cmd));

        self.enter_expert(block, timeout).await?;
        self.mode = SessionMode::Expert;

        let expert_prompt = Expect::Literal(block.expert_prompt.clone());
        for command in &block.items {
            sink.write(&format!("EXPERT# {}", command));
            self.transport.send_line(command).await?;
            let event = self
                .transport
                .expect_any(std::slice::from_ref(&expert_prompt), timeout)
                .await?;
            let output = event.before().trim().to_string();
            if !output.is_empty() {
                sink.write(&output);
            }
            if !event.is_match() {
                // Expert failures are never run through the tolerated set.
                return Err(Error::CommandFatal {
                    command: command.clone(),
                });
            }
        }

        self.transport.send_line(&block.exit_cmd).await?;
        // The generic fallback is the clish prompt only. A '#' here means
        // the exit failed and the session is still in the expert shell.
        let event = self
            .transport
            .expect_any(
                &[
                    Expect::Literal(block.exit_prompt.clone()),
                    Expect::ClishPrompt,
                ],
                timeout,
            )
            .await?;
        if !event.is_match() {
            return Err(Error::ExpertExitFailed);
        }
        sink.write("-- EXIT EXPERT");
        self.mode = SessionMode::Clish;
        Ok(())
    }

    /// Enter expert mode, answering the password prompt if one appears.
    async fn enter_expert(&mut self, block: &ExpertBlock, timeout: Duration) -> Result<()> {
        self.transport.send_line(&block.enter_cmd).await?;

        let patterns = [
            Expect::Literal(block.pre_password_prompt.clone()),
            Expect::Literal(block.expert_prompt.clone()),
        ];
        match self.transport.expect_any(&patterns, timeout).await? {
            ExpectEvent::Matched { index: 0, .. } => {
                let password = self.resolve_expert_password(block)?;
                self.transport.send_secret(&password).await?;
                let event = self
                    .transport
                    .expect_any(&[Expect::Literal(block.expert_prompt.clone())], timeout)
                    .await?;
                if !event.is_match() {
                    return Err(Error::ExpertEntryFailed {
                        reason: "did not reach expert prompt after password".to_string(),
                    });
                }
                Ok(())
            }
            // The expert prompt directly: passwordless entry.
            ExpectEvent::Matched { .. } => Ok(()),
            ExpectEvent::Eof { .. } | ExpectEvent::TimedOut { .. } => {
                Err(Error::ExpertEntryFailed {
                    reason: "no password or expert prompt observed".to_string(),
                })
            }
        }
    }

    /// Fallback chain: block-local password first, then the run-level
    /// password (which the orchestrator seeds from the login password when
    /// no explicit override is given).
    fn resolve_expert_password(&self, block: &ExpertBlock) -> Result<String> {
        if !block.password.is_empty() {
            return Ok(block.password.clone());
        }
        if let Some(password) = self.config.expert_password.as_deref() {
            if !password.is_empty() {
                return Ok(password.to_string());
            }
        }
        Err(Error::ExpertEntryFailed {
            reason: "expert password required but missing".to_string(),
        })
    }
}
