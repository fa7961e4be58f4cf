//! Run Outcome Model
//!
//! Session mode and the summary returned by the run orchestrator.

use uuid::Uuid;

use crate::error::Error;

/// Mode of the interactive session.
///
/// Transitions are driven only by the connect sequence and the block
/// executor; a session is never in two modes at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// No transport attached
    #[default]
    Disconnected,
    /// Transport spawned, login loop in progress
    Connecting,
    /// Restricted operational shell
    Clish,
    /// Privileged sub-shell
    Expert,
}

/// Summary of a completed (or aborted) run
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Unique identifier for this run
    pub run_id: String,

    /// Whether every block completed (tolerated failures count as success)
    pub success: bool,

    /// Number of blocks that finished executing
    pub blocks_executed: usize,

    /// The fatal error that aborted the run, if any
    pub error: Option<Error>,

    /// Whether at least one command failure was tolerated along the way
    pub error_tolerated: bool,
}

impl ExecutionOutcome {
    /// Successful run, optionally noting tolerated failures
    pub fn ok(blocks_executed: usize, error_tolerated: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            success: true,
            blocks_executed,
            error: None,
            error_tolerated,
        }
    }

    /// Aborted run with the fatal error that stopped it
    pub fn failed(blocks_executed: usize, error: Error) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            success: false,
            blocks_executed,
            error: Some(error),
            error_tolerated: false,
        }
    }
}
