//! PTY Streams
//!
//! Async-friendly interface for PTY I/O: blocking master reads/writes are
//! bridged to async via channels. End-of-stream is distinguished from
//! timeout — the expect layer classifies them as different failures.

use std::sync::mpsc::Sender as StdSender;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{Error, Result};

/// Outcome of a bounded read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Bytes arrived from the PTY
    Data(Vec<u8>),
    /// The PTY stream ended (process exited or connection closed)
    Eof,
    /// No data arrived within the bound
    TimedOut,
}

/// PTY I/O streams wrapper
pub struct PtyStreams {
    /// Receiver for output bytes from the PTY (stdout/stderr combined)
    output_rx: UnboundedReceiver<Vec<u8>>,
    /// Sender for input bytes to the PTY (stdin)
    input_tx: StdSender<Vec<u8>>,
}

impl PtyStreams {
    /// Create new PTY streams from channels
    pub fn from_channels(
        output_rx: UnboundedReceiver<Vec<u8>>,
        input_tx: StdSender<Vec<u8>>,
    ) -> Self {
        Self {
            output_rx,
            input_tx,
        }
    }

    /// Write data to the PTY stdin.
    ///
    /// A dead writer thread means the process is gone, so the failure is
    /// reported as a closed connection.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.input_tx
            .send(data.to_vec())
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Read the next chunk, waiting at most `bound`.
    pub async fn read_bounded(&mut self, bound: Duration) -> ReadEvent {
        match tokio::time::timeout(bound, self.output_rx.recv()).await {
            Ok(Some(bytes)) => ReadEvent::Data(bytes),
            Ok(None) => ReadEvent::Eof,
            Err(_) => ReadEvent::TimedOut,
        }
    }

    /// Drain all pending output from the channel (discard it).
    /// Used before teardown so stale output is not misattributed.
    pub fn drain_output(&mut self) -> usize {
        let mut count = 0;
        while self.output_rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}
