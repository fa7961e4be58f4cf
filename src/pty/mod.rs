//! PTY Transport Plumbing
//!
//! Spawns the interactive shell process inside a pseudoterminal (via
//! `portable-pty`) and bridges its blocking I/O to async code with a
//! reader/writer thread pair and channels.

pub mod process;
pub mod streams;

pub use process::{spawn_pty_process, PtyChild};
pub use streams::{PtyStreams, ReadEvent};
