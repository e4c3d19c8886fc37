//! The acquisition producer: tick loop, buffering and chunked flushing.
//!
//! Two owned objects compose the producer, kept deliberately separate: a
//! [`DeviceSession`] owning the hardware lifecycle and a
//! [`SampleBuffer`](crate::buffer::SampleBuffer) owning the queued records.
//! [`AcquisitionLoop`] drives both: one record per tick, a non-blocking
//! watermark flush while running, and a full chunk-by-chunk flush at stop.
//!
//! The tick loop never waits on the consumer. Mid-run flushes back off when
//! the transfer conduit is full; only the final flush awaits capacity, after
//! ticking has already ended.

use crate::buffer::{LengthGauge, SampleBuffer};
use crate::channel::TransferSender;
use crate::config::{ReadErrorPolicy, RunSettings};
use crate::data::SampleRecord;
use crate::device::AnalogSource;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Counters describing one completed acquisition run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Wall-clock time the run started.
    pub started_at: DateTime<Utc>,
    /// Ticks attempted, including failed reads.
    pub ticks: u64,
    /// Records appended to the buffer.
    pub records_appended: u64,
    /// Device reads that failed.
    pub read_failures: u64,
    /// Chunks pushed onto the transfer channel.
    pub chunks_pushed: u64,
}

impl RunStats {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            ticks: 0,
            records_appended: 0,
            read_failures: 0,
            chunks_pushed: 0,
        }
    }
}

/// Result of a completed producer lifecycle.
///
/// A device error under the abort policy ends the run early but still gets a
/// full flush, so it is reported here rather than replacing the stats.
/// Transfer-level failures are real errors and surface as `Err` from
/// [`AcquisitionLoop::run`] instead.
#[derive(Debug)]
pub struct RunReport {
    /// Counters for the run.
    pub stats: RunStats,
    /// Device read error that ended the run early, if any.
    pub device_error: Option<crate::error::DaqError>,
}

/// Owns the device handle and its start/stop lifecycle.
///
/// Nothing else in the producer touches the hardware directly.
pub struct DeviceSession {
    device: Box<dyn AnalogSource>,
}

impl DeviceSession {
    /// Wrap a device for exclusive use by one producer.
    pub fn new(device: Box<dyn AnalogSource>) -> Self {
        Self { device }
    }

    /// Id of the wrapped device.
    pub fn device_id(&self) -> i32 {
        self.device.device_id()
    }

    /// Start acquisition on the device (idempotent).
    pub async fn start(&mut self) -> Result<()> {
        self.device.start().await
    }

    /// Stop acquisition on the device (idempotent).
    pub async fn stop(&mut self) -> Result<()> {
        self.device.stop().await
    }

    async fn read_tick(&mut self) -> Result<crate::device::TickReading> {
        self.device.read_tick().await
    }
}

/// Drives acquisition ticks and flushes the buffer in bounded chunks.
pub struct AcquisitionLoop {
    session: DeviceSession,
    buffer: SampleBuffer,
    counter: u64,
    epoch: Instant,
    rate_hz: f64,
    run: RunSettings,
    stats: RunStats,
}

impl AcquisitionLoop {
    /// Build a producer over `device`, ticking at `rate_hz`.
    pub fn new(device: Box<dyn AnalogSource>, rate_hz: f64, run: RunSettings) -> Self {
        Self {
            session: DeviceSession::new(device),
            buffer: SampleBuffer::new(),
            counter: 0,
            epoch: Instant::now(),
            rate_hz,
            run,
            stats: RunStats::new(),
        }
    }

    /// Shared gauge of the accumulation buffer's length.
    pub fn gauge(&self) -> LengthGauge {
        self.buffer.gauge()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Records currently buffered and not yet flushed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Run one acquisition tick.
    ///
    /// Every tick consumes one counter value, successful or not, so a failed
    /// read leaves a visible gap instead of silently renumbering later
    /// samples. On success the fully formed record is appended and the
    /// published length updated; on failure the buffer is untouched.
    ///
    /// Returns `Ok(true)` if a record was appended, `Ok(false)` for a skipped
    /// tick under [`ReadErrorPolicy::Skip`], and the read error itself under
    /// [`ReadErrorPolicy::Abort`].
    pub async fn tick(&mut self) -> Result<bool> {
        let counter = self.counter;
        self.counter += 1;
        self.stats.ticks += 1;
        let time_ms = self.epoch.elapsed().as_millis() as i32;

        match self.session.read_tick().await {
            Ok(reading) => {
                let record = SampleRecord::new(
                    self.session.device_id(),
                    time_ms,
                    counter,
                    reading.forces,
                    reading.trigger,
                );
                self.buffer.push(record);
                self.stats.records_appended += 1;
                Ok(true)
            }
            Err(err) => {
                self.stats.read_failures += 1;
                match self.run.read_error_policy {
                    ReadErrorPolicy::Skip => {
                        warn!(counter, %err, "device read failed, tick skipped");
                        Ok(false)
                    }
                    ReadErrorPolicy::Abort => Err(err),
                }
            }
        }
    }

    /// Push full-size chunks without waiting for the consumer.
    ///
    /// Stops as soon as the conduit is full, restoring the untransferred
    /// chunk to the buffer front. Partial chunks are left for the final
    /// flush.
    pub fn flush_ready(&mut self, sender: &TransferSender) {
        while self.buffer.len() >= self.run.chunk_size {
            let chunk = self.buffer.take_chunk(self.run.chunk_size);
            match sender.try_push(chunk) {
                Ok(()) => self.stats.chunks_pushed += 1,
                Err(returned) => {
                    self.buffer.restore_front(returned);
                    break;
                }
            }
        }
    }

    /// Flush everything remaining, chunk by chunk.
    ///
    /// Each chunk is pushed individually and the published length drops after
    /// each removal, so an observer polling availability sees steady progress
    /// rather than one instantaneous jump to zero. The last chunk truncates
    /// to the remaining length; nothing is ever padded and empty chunks are
    /// never sent.
    pub async fn flush_all(&mut self, sender: &TransferSender) -> Result<()> {
        while !self.buffer.is_empty() {
            let chunk = self.buffer.take_chunk(self.run.chunk_size);
            sender.push(chunk).await?;
            self.stats.chunks_pushed += 1;
        }
        Ok(())
    }

    /// Run the full producer lifecycle.
    ///
    /// Ticks at the configured rate until a stop is requested or the target
    /// tick count is reached, then executes the stop sequence in order: stop
    /// ticking, stop the device, flush all remaining records, mark the
    /// transfer finished. Undrained chunks stay receivable after the task
    /// ends, so a consumer that is still catching up loses nothing.
    pub async fn run(
        mut self,
        sender: TransferSender,
        mut stop_rx: watch::Receiver<bool>,
    ) -> Result<RunReport> {
        info!(
            device_id = self.session.device_id(),
            rate_hz = self.rate_hz,
            chunk_size = self.run.chunk_size,
            "acquisition run starting"
        );
        self.session.start().await?;
        self.epoch = Instant::now();

        let mut interval = tokio::time::interval(RunSettings::tick_period(self.rate_hz));
        // Catch up after a slow flush instead of drifting off the hardware clock.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        let device_error: Option<crate::error::DaqError> = loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(err) = self.tick().await {
                        break Some(err);
                    }
                    if let Some(watermark) = self.run.flush_watermark {
                        if self.buffer.len() >= watermark {
                            self.flush_ready(&sender);
                        }
                    }
                    if let Some(target) = self.run.target_ticks {
                        if self.stats.ticks >= target {
                            debug!(ticks = self.stats.ticks, "target tick count reached");
                            break None;
                        }
                    }
                }
                changed = stop_rx.changed() => {
                    // A dropped handle counts as a stop request.
                    if changed.is_err() || *stop_rx.borrow() {
                        debug!("stop requested");
                        break None;
                    }
                }
            }
        };

        let device_stop = self.session.stop().await;
        self.flush_all(&sender).await?;
        sender.finish();
        info!(
            ticks = self.stats.ticks,
            records = self.stats.records_appended,
            failures = self.stats.read_failures,
            chunks = self.stats.chunks_pushed,
            "acquisition run finished"
        );

        device_stop?;
        Ok(RunReport {
            stats: self.stats,
            device_error,
        })
    }
}
