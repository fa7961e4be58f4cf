//! Transport Session
//!
//! Owns one interactive shell channel (an `ssh` process spawned inside a
//! PTY) and provides blocking, pattern-matched, timeout-bounded waits on
//! its output. The [`Transport`] trait is the seam the block executor
//! drives, so execution logic is testable against a scripted mock.

pub mod expect;
pub mod login;

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ConnectionProfile;
use crate::error::{Error, Result};
use crate::pty::{spawn_pty_process, PtyChild, PtyStreams, ReadEvent};

pub use expect::{Expect, ExpectEvent};
pub use login::{LoginAction, LoginEvent, LoginFailure, LoginState};

static PASSWORD_PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[Pp]assword:").expect("static regex")
});

/// Operations the block executor performs on an interactive session.
///
/// Mirrors the pexpect contract: send a line, wait for the first of a set
/// of patterns, tear down. Implemented by [`ShellSession`] for real
/// transports and by scripted mocks in tests.
#[async_trait]
pub trait Transport: Send {
    /// Write `line` plus a line terminator to the session
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Write a secret plus a line terminator; implementations must never
    /// echo the content to logs or diagnostics.
    async fn send_secret(&mut self, secret: &str) -> Result<()>;

    /// Wait for the first of `patterns`, end-of-stream, or `timeout`.
    async fn expect_any(&mut self, patterns: &[Expect], timeout: Duration)
        -> Result<ExpectEvent>;

    /// Best-effort teardown; never fails, idempotent.
    async fn close(&mut self);
}

/// One interactive SSH session to a Gaia device
pub struct ShellSession {
    child: PtyChild,
    streams: PtyStreams,
    /// Output received beyond the last match, carried into the next wait
    residual: String,
    closed: bool,
}

impl ShellSession {
    /// Spawn `ssh` to the target and drive the login loop until an
    /// operational prompt appears.
    ///
    /// The loop answers host-authenticity questions affirmatively and
    /// replies to password prompts, possibly several times, before the
    /// prompt is reached. Each individual wait is bounded by
    /// `login_timeout`.
    pub async fn connect(profile: &ConnectionProfile, login_timeout: Duration) -> Result<Self> {
        let args = ssh_args(profile);
        info!("Connecting to {}@{}:{}", profile.user, profile.host, profile.port);

        let (child, streams) = spawn_pty_process("ssh", &args)?;
        let mut session = Self {
            child,
            streams,
            residual: String::new(),
            closed: false,
        };

        let patterns = [
            Expect::Literal("Are you sure you want to continue connecting".to_string()),
            Expect::Pattern(PASSWORD_PROMPT_RE.clone()),
            Expect::Operational,
        ];

        let mut state = LoginState::Connecting;
        loop {
            let event = match session.expect_any(&patterns, login_timeout).await? {
                ExpectEvent::Matched { index: 0, .. } => LoginEvent::HostAuthenticityPrompt,
                ExpectEvent::Matched { index: 1, .. } => LoginEvent::PasswordPrompt,
                ExpectEvent::Matched { .. } => LoginEvent::OperationalPrompt,
                ExpectEvent::Eof { .. } => LoginEvent::Eof,
                ExpectEvent::TimedOut { .. } => LoginEvent::TimedOut,
            };

            let (next, action) = login::step(state, event, profile.has_password());
            state = next;

            match action {
                LoginAction::AnswerYes => {
                    debug!("Accepting host authenticity prompt");
                    session.send_line("yes").await?;
                }
                LoginAction::SendPassword => {
                    // has_password was checked by the state machine
                    let password = profile
                        .password
                        .as_deref()
                        .ok_or(Error::AuthRequired)?
                        .to_string();
                    session.send_secret(&password).await?;
                }
                LoginAction::Complete => {
                    info!("Login complete, session is operational");
                    return Ok(session);
                }
                LoginAction::Abort(failure) => {
                    session.close().await;
                    return Err(match failure {
                        LoginFailure::PasswordRequired => Error::AuthRequired,
                        LoginFailure::ConnectionClosed => Error::ConnectionClosed,
                        LoginFailure::TimedOut => Error::LoginTimeout,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Transport for ShellSession {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        debug!("send: {}", line);
        self.streams.write(format!("{}\n", line).as_bytes())
    }

    async fn send_secret(&mut self, secret: &str) -> Result<()> {
        debug!("send: <redacted>");
        self.streams.write(format!("{}\n", secret).as_bytes())
    }

    async fn expect_any(&mut self, patterns: &[Expect], timeout: Duration)
        -> Result<ExpectEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut buf = std::mem::take(&mut self.residual);

        loop {
            if let Some((index, start, end)) = expect::first_match(patterns, &buf) {
                let before = buf[..start].to_string();
                self.residual = buf[end..].to_string();
                return Ok(ExpectEvent::Matched { index, before });
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(ExpectEvent::TimedOut { before: buf });
            }

            match self.streams.read_bounded(remaining).await {
                ReadEvent::Data(bytes) => {
                    buf.push_str(&String::from_utf8_lossy(&bytes));
                }
                ReadEvent::Eof => {
                    return Ok(ExpectEvent::Eof { before: buf });
                }
                ReadEvent::TimedOut => {
                    return Ok(ExpectEvent::TimedOut { before: buf });
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Best effort: ask the remote shell to exit, then make sure the
        // child is gone either way.
        let _ = self.streams.write(b"exit\n");
        let drained = self.streams.drain_output();
        if drained > 0 {
            debug!("Discarded {} pending output chunks on close", drained);
        }
        self.child.kill();
        info!("Session closed");
    }
}

/// Argument vector for the spawned `ssh` process.
///
/// Host-key checking is disabled because appliances are routinely
/// re-imaged and their keys churn; the host-authenticity prompt is still
/// handled in case an older ssh ignores the options.
fn ssh_args(profile: &ConnectionProfile) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "-o".to_string(),
        "UserKnownHostsFile=/dev/null".to_string(),
        "-p".to_string(),
        profile.port.to_string(),
    ];
    if let Some(keyfile) = &profile.keyfile {
        args.push("-i".to_string());
        args.push(keyfile.display().to_string());
    }
    args.push(format!("{}@{}", profile.user, profile.host));
    args
}
