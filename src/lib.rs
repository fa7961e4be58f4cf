//! gaiactl - Check Point Gaia configuration automation
//!
//! Applies line-oriented configuration templates to Gaia appliances over a
//! single interactive SSH session. A template is parsed into ordered blocks
//! (clish command runs, timed pauses, expert-mode excursions), and each
//! block is driven over the session with pattern-matched, timeout-bounded
//! waits. Known-benign command failures are tolerated and logged; anything
//! else aborts the run with the session torn down cleanly.
//!
//! ## Architecture
//!
//! - **template**: parser for the `::`-directive mini-language
//! - **models**: blocks, templates, session mode, run outcome
//! - **pty**: process spawning inside a pseudoterminal, async stream bridge
//! - **session**: the interactive transport, login loop, expect primitives
//! - **executor**: per-block state machine with the tolerated-error policy
//! - **runner**: end-to-end orchestration, dry-run, guaranteed teardown
//! - **config**: connection profiles, timeouts, defaults file
//! - **logsink**: console/file tee for the run transcript

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod executor;
pub mod logsink;
pub mod models;
pub mod pty;
pub mod runner;
pub mod session;
pub mod template;

pub use config::{ConnectionProfile, DeviceMode, RunConfig, Timeouts};
pub use error::{Error, Result};
pub use executor::{BlockExecutor, ToleratedErrors};
pub use logsink::LogSink;
pub use models::{Block, ExecutionOutcome, ExpertBlock, SessionMode, Template};
pub use session::{Expect, ExpectEvent, ShellSession, Transport};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = "gaiactl";
