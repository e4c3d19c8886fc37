//! Consumer-side reader over the transfer channel.
//!
//! [`ConsumerReader`] is the pull API handed to the writer/plotter side. It
//! owns the receiving half of the transfer channel and tracks the small state
//! machine from the transfer contract:
//!
//! ```text
//! Idle → (data observed) → Draining → (queue empty) → Idle
//!                                   ↘ (producer finished, final pass empty) → Stopped
//! ```
//!
//! `Stopped` is terminal and only reached after the producer has completed
//! its final flush and a draining pass has come back clean.

use crate::channel::TransferReceiver;
use crate::data::SampleRecord;
use crate::error::{DaqError, Result};
use std::time::Duration;
use tracing::debug;

/// Observable state of the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Not currently draining.
    Idle,
    /// A drain pass is in progress.
    Draining,
    /// Producer finished and everything has been drained.
    Stopped,
}

/// Drains transferred chunks into ordered record batches.
#[derive(Debug)]
pub struct ConsumerReader {
    receiver: TransferReceiver,
    state: ReaderState,
}

impl ConsumerReader {
    /// Wrap the receiving half of a transfer channel.
    pub fn new(receiver: TransferReceiver) -> Self {
        Self {
            receiver,
            state: ReaderState::Idle,
        }
    }

    /// Current reader state.
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Records queued in the channel and not yet read.
    pub fn available(&self) -> u64 {
        self.receiver.queued()
    }

    /// Whether the producer has completed its final flush.
    pub fn producer_finished(&self) -> bool {
        self.receiver.is_finished()
    }

    /// Drain everything currently available without waiting.
    ///
    /// May return an empty batch; chunk boundaries are invisible to the
    /// caller. A producer that vanished without finishing surfaces as
    /// [`DaqError::ChannelClosed`] rather than an empty read.
    pub fn read_buffer(&mut self) -> Result<Vec<SampleRecord>> {
        if self.state == ReaderState::Stopped {
            return Ok(Vec::new());
        }
        self.state = ReaderState::Draining;
        let result = self.receiver.try_drain();
        self.state = ReaderState::Idle;
        result
    }

    /// Drain, waiting up to `timeout` for data to arrive.
    ///
    /// An empty `Ok` batch means the producer finished cleanly with nothing
    /// left to read.
    pub async fn drain(&mut self, timeout: Duration) -> Result<Vec<SampleRecord>> {
        if self.state == ReaderState::Stopped {
            return Ok(Vec::new());
        }
        self.state = ReaderState::Draining;
        let result = self.receiver.drain(timeout).await;
        self.state = match &result {
            Ok(batch) if batch.is_empty() => ReaderState::Stopped,
            _ => ReaderState::Idle,
        };
        result
    }

    /// Drain to clean completion, collecting every remaining record.
    ///
    /// Loops over incoming chunks, waiting at most `timeout` for each, until
    /// the producer's clean end-of-stream. Each wait is individually bounded,
    /// so a stalled producer manifests as [`DaqError::TransferTimeout`]
    /// instead of an indefinite hang.
    pub async fn finish(&mut self, timeout: Duration) -> Result<Vec<SampleRecord>> {
        if self.state == ReaderState::Stopped {
            return Ok(Vec::new());
        }
        self.state = ReaderState::Draining;
        let mut records = Vec::new();
        loop {
            match tokio::time::timeout(timeout, self.receiver.recv_chunk()).await {
                Err(_) => {
                    self.state = ReaderState::Idle;
                    return Err(DaqError::TransferTimeout(timeout));
                }
                Ok(Ok(Some(batch))) => records.extend(batch),
                Ok(Ok(None)) => {
                    self.state = ReaderState::Stopped;
                    debug!(records = records.len(), "final drain complete");
                    return Ok(records);
                }
                Ok(Err(err)) => {
                    self.state = ReaderState::Idle;
                    return Err(err);
                }
            }
        }
    }
}
