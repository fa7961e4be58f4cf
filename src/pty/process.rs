//! PTY Process Spawning
//!
//! Creates the pseudoterminal pair and spawns the transport process on its
//! slave side, using the portable-pty crate for cross-platform support.
//! The blocking master reader/writer are moved onto dedicated threads and
//! bridged to async consumers via channels.

use portable_pty::{native_pty_system, Child, CommandBuilder, PtyPair, PtySize};
use std::io::{Read, Write};
use std::sync::mpsc::channel;
use std::thread;
use tokio::sync::mpsc::unbounded_channel;

use super::streams::PtyStreams;
use crate::error::{Error, Result};

/// Handle to the spawned child process
pub struct PtyChild {
    child: Box<dyn Child + Send + Sync>,
    pid: Option<u32>,
}

impl PtyChild {
    /// Process ID of the spawned child, if known
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Forcefully terminate the child. Errors are ignored; the process may
    /// already have exited.
    pub fn kill(&mut self) {
        let _ = self.child.kill();
    }
}

impl std::fmt::Debug for PtyChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChild").field("pid", &self.pid).finish()
    }
}

/// Spawn a process inside a new PTY and return its handle plus I/O streams.
pub fn spawn_pty_process(command: &str, args: &[String]) -> Result<(PtyChild, PtyStreams)> {
    let pty_system = native_pty_system();

    let pair = pty_system
        .openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| Error::SpawnFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    let mut cmd_builder = CommandBuilder::new(command);
    cmd_builder.args(args);

    let child = pair
        .slave
        .spawn_command(cmd_builder)
        .map_err(|e| Error::SpawnFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    let pid = child.process_id();
    let streams = create_pty_streams(pair)?;

    Ok((PtyChild { child, pid }, streams))
}

/// Bridge blocking PTY I/O to async via channels and background threads.
fn create_pty_streams(pair: PtyPair) -> Result<PtyStreams> {
    let mut master_reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| format!("failed to clone PTY reader: {}", e))?;
    let mut master_writer = pair
        .master
        .take_writer()
        .map_err(|e| format!("failed to take PTY writer: {}", e))?;

    // Channel: PTY output -> async consumer
    let (tx_async_out, rx_async_out) = unbounded_channel::<Vec<u8>>();
    // Channel: async producer (stdin) -> PTY writer thread
    let (tx_stdin, rx_stdin) = channel::<Vec<u8>>();

    // Reader thread: forward PTY output until EOF. Dropping the sender on
    // exit is what signals end-of-stream to the async side.
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match master_reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - process terminated");
                    break;
                }
                Ok(n) => {
                    if tx_async_out.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY read: receiver dropped, stopping reader thread");
                        break;
                    }
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }
                    if e.kind() == std::io::ErrorKind::WouldBlock {
                        thread::sleep(std::time::Duration::from_millis(10));
                        continue;
                    }
                    debug!("PTY read error ({}): {}", e.kind(), e);
                    break;
                }
            }
        }
        debug!("PTY reader thread exiting");
    });

    // Writer thread: receive stdin data and write to the PTY master.
    thread::spawn(move || {
        while let Ok(data) = rx_stdin.recv() {
            loop {
                match master_writer.write_all(&data) {
                    Ok(()) => {
                        if let Err(e) = master_writer.flush() {
                            debug!("PTY flush error: {}", e);
                        }
                        break;
                    }
                    Err(e) => {
                        if e.kind() == std::io::ErrorKind::Interrupted {
                            continue;
                        }
                        warn!("PTY write error ({}): {}", e.kind(), e);
                        return;
                    }
                }
            }
        }
        debug!("PTY writer thread exiting");
    });

    Ok(PtyStreams::from_channels(rx_async_out, tx_stdin))
}
