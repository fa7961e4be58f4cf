//! Data Models
//!
//! Core domain entities: template blocks, the parsed template,
//! session mode and run outcome.

pub mod block;
pub mod outcome;

pub use block::{Block, ExpertBlock, Template};
pub use outcome::{ExecutionOutcome, SessionMode};
