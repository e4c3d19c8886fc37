//! Producer-side accumulation buffer.
//!
//! [`SampleBuffer`] is the unbounded, append-only FIFO the producer fills one
//! record per tick. It is owned exclusively by the producer; the only state
//! visible outside is its current length, published through a shared atomic
//! gauge after every append and every chunk removal. Removal happens only in
//! whole chunks from the front, never reordering and never splitting a chunk.

use crate::data::SampleRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared view of the buffer's current length.
///
/// Updated with a single atomic store after each append/removal; no lock is
/// ever held across a flush.
pub type LengthGauge = Arc<AtomicU64>;

/// FIFO of pending sample records, exclusively producer-owned.
#[derive(Debug)]
pub struct SampleBuffer {
    records: VecDeque<SampleRecord>,
    gauge: LengthGauge,
}

impl SampleBuffer {
    /// Create an empty buffer with a fresh length gauge.
    pub fn new() -> Self {
        Self {
            records: VecDeque::new(),
            gauge: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Clone the shared length gauge for an observer.
    pub fn gauge(&self) -> LengthGauge {
        Arc::clone(&self.gauge)
    }

    /// Append one record at the back and publish the new length.
    pub fn push(&mut self, record: SampleRecord) {
        self.records.push_back(record);
        self.publish();
    }

    /// Current number of buffered records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the buffer holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove up to `max` records from the front, preserving order.
    ///
    /// The returned chunk is truncated to the remaining length when fewer
    /// than `max` records are buffered; an empty buffer yields an empty
    /// vector (the caller must not transfer it). The published length is
    /// updated after the removal.
    pub fn take_chunk(&mut self, max: usize) -> Vec<SampleRecord> {
        let n = max.min(self.records.len());
        let chunk: Vec<SampleRecord> = self.records.drain(..n).collect();
        self.publish();
        chunk
    }

    /// Put records back at the front, preserving their original order.
    ///
    /// Used when a non-blocking transfer attempt finds the transport full:
    /// the untransferred chunk returns to the head of the FIFO so no record
    /// is lost or reordered.
    pub fn restore_front(&mut self, chunk: Vec<SampleRecord>) {
        for record in chunk.into_iter().rev() {
            self.records.push_front(record);
        }
        self.publish();
    }

    fn publish(&self) {
        self.gauge.store(self.records.len() as u64, Ordering::Release);
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
