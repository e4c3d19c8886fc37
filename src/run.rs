//! Run orchestration: the surface handed to the recorder/GUI side.
//!
//! [`start_run`] validates the settings, wires the producer task to a
//! transfer channel and returns a [`RunHandle`] with the three operations
//! external collaborators need: cheap availability polling, non-blocking
//! reads of whatever has arrived, and a stop that never discards unread
//! data.

use crate::buffer::LengthGauge;
use crate::channel::transfer_channel;
use crate::config::Settings;
use crate::consumer::{ConsumerReader, ReaderState};
use crate::data::SampleRecord;
use crate::device::AnalogSource;
use crate::error::{DaqError, Result};
use crate::producer::{AcquisitionLoop, RunReport, RunStats};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Everything a finished run hands back to the caller.
#[derive(Debug)]
pub struct RunOutcome {
    /// All records drained after the stop request, in append order.
    pub records: Vec<SampleRecord>,
    /// Producer-side counters for the run.
    pub stats: RunStats,
    /// Device error that ended the run early under the abort policy, if any.
    /// The flushed records above are complete either way.
    pub device_error: Option<DaqError>,
}

/// Handle to a live acquisition run.
pub struct RunHandle {
    reader: ConsumerReader,
    buffered: LengthGauge,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<RunReport>>,
    drain_timeout: Duration,
}

/// Validate `settings`, spawn the producer over `device` and return the
/// consumer-side handle.
pub fn start_run(settings: &Settings, device: Box<dyn AnalogSource>) -> Result<RunHandle> {
    settings.validate()?;
    let (sender, receiver) = transfer_channel(settings.run.channel_capacity);
    let acquisition =
        AcquisitionLoop::new(device, settings.device.rate_hz, settings.run.clone());
    let buffered = acquisition.gauge();
    let (stop_tx, stop_rx) = watch::channel(false);
    let task = tokio::spawn(acquisition.run(sender, stop_rx));
    info!(
        physical_channel = %settings.device.physical_channel(),
        "run started"
    );
    Ok(RunHandle {
        reader: ConsumerReader::new(receiver),
        buffered,
        stop_tx,
        task,
        drain_timeout: settings.run.drain_timeout(),
    })
}

impl RunHandle {
    /// Number of records acquired and not yet read: still buffered on the
    /// producer side plus queued in the transfer channel.
    ///
    /// Two atomic loads; repeated calls without an intervening tick or read
    /// report the same value.
    pub fn poll_available(&self) -> u64 {
        self.buffered.load(Ordering::Acquire) + self.reader.available()
    }

    /// Drain everything currently transferred, without waiting.
    pub fn read_buffer(&mut self) -> Result<Vec<SampleRecord>> {
        self.reader.read_buffer()
    }

    /// Drain, waiting up to the configured bound for data.
    pub async fn drain(&mut self) -> Result<Vec<SampleRecord>> {
        self.reader.drain(self.drain_timeout).await
    }

    /// Whether the producer has completed its final flush (for instance
    /// after reaching a configured target tick count).
    pub fn is_finished(&self) -> bool {
        self.reader.producer_finished()
    }

    /// Current state of the consumer-side reader.
    pub fn reader_state(&self) -> ReaderState {
        self.reader.state()
    }

    /// Stop the run and collect every remaining record.
    ///
    /// Sequencing: request the producer stop, drain the channel to its clean
    /// end (each wait bounded by the drain timeout), then join the producer
    /// task. A stop racing a flush loses nothing: chunks stay receivable
    /// until drained. A device error that ended the run early is reported in
    /// the outcome alongside the records it managed to flush.
    pub async fn stop_run(mut self) -> Result<RunOutcome> {
        // Producer may already be finished; a send to a dead receiver is fine.
        let _ = self.stop_tx.send(true);
        let records = self.reader.finish(self.drain_timeout).await?;

        let report = tokio::time::timeout(self.drain_timeout, self.task)
            .await
            .map_err(|_| DaqError::TransferTimeout(self.drain_timeout))?
            .map_err(|join_err| DaqError::Producer(join_err.to_string()))??;

        if let Some(err) = &report.device_error {
            // The channel still finished cleanly, so the drained records are
            // complete up to the abort point.
            error!(%err, "run ended early on a device error");
        }
        info!(
            records = records.len(),
            ticks = report.stats.ticks,
            chunks = report.stats.chunks_pushed,
            "run stopped"
        );
        Ok(RunOutcome {
            records,
            stats: report.stats,
            device_error: report.device_error,
        })
    }
}
