//! Ordered chunk transfer between the producer and the consumer.
//!
//! The channel hands batches of encoded records from the acquisition task to
//! the consumer side. Its observable state is deliberately small: a bounded
//! conduit of wire-encoded chunks, an atomic count of records that are queued
//! but not yet drained, and a completion flag the producer sets when its final
//! flush is done. There is no raw shared scalar and no wait/clear event pair:
//! availability is counted atomically *before* a chunk becomes receivable,
//! and the drain path re-checks the queue after every wake, so a
//! cleared-signal race can never leave the consumer blocked.
//!
//! Chunks cross the boundary in the fixed 56-byte-per-record wire layout from
//! [`crate::data::wire`], so every transfer exercises the same
//! statically-checked encode/decode pair.

use crate::data::wire::{decode_chunk, encode_chunk, RECORD_WIRE_SIZE};
use crate::data::SampleRecord;
use crate::error::{DaqError, Result};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::trace;

#[derive(Debug)]
struct Shared {
    /// Records pushed onto the conduit and not yet drained.
    queued: AtomicU64,
    /// Set by the producer once every remaining record has been pushed.
    done: AtomicBool,
}

/// Create a transfer channel with room for `capacity` in-flight chunks.
///
/// The conduit is bounded: a producer that outruns the consumer blocks (or,
/// via [`TransferSender::try_push`], backs off) on the `capacity + 1`-th
/// chunk, and resumes as soon as the consumer drains.
pub fn transfer_channel(capacity: usize) -> (TransferSender, TransferReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    let shared = Arc::new(Shared {
        queued: AtomicU64::new(0),
        done: AtomicBool::new(false),
    });
    (
        TransferSender {
            tx,
            shared: Arc::clone(&shared),
        },
        TransferReceiver { rx, shared },
    )
}

/// Producer half of the transfer channel.
#[derive(Debug)]
pub struct TransferSender {
    tx: mpsc::Sender<Bytes>,
    shared: Arc<Shared>,
}

impl TransferSender {
    /// Enqueue one ordered chunk, waiting if the conduit is full.
    ///
    /// Order is preserved relative to every previously pushed chunk. Empty
    /// chunks are never transferred. The queued-record count is raised before
    /// the chunk becomes receivable, so an observer polling availability sees
    /// the data announced before (never after) it can arrive.
    pub async fn push(&self, chunk: Vec<SampleRecord>) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let n = chunk.len() as u64;
        self.shared.queued.fetch_add(n, Ordering::AcqRel);
        let payload = encode_chunk(&chunk);
        if self.tx.send(payload).await.is_err() {
            self.shared.queued.fetch_sub(n, Ordering::AcqRel);
            return Err(DaqError::ChannelClosed);
        }
        trace!(records = n, "chunk pushed");
        Ok(())
    }

    /// Non-blocking push; returns the chunk back if the conduit is full or
    /// the consumer is gone.
    ///
    /// Used for mid-run flushes so the acquisition tick loop never waits on
    /// the consumer.
    pub fn try_push(
        &self,
        chunk: Vec<SampleRecord>,
    ) -> std::result::Result<(), Vec<SampleRecord>> {
        if chunk.is_empty() {
            return Ok(());
        }
        match self.tx.try_reserve() {
            Ok(permit) => {
                let n = chunk.len() as u64;
                self.shared.queued.fetch_add(n, Ordering::AcqRel);
                permit.send(encode_chunk(&chunk));
                trace!(records = n, "chunk pushed (non-blocking)");
                Ok(())
            }
            Err(_) => Err(chunk),
        }
    }

    /// Mark the transfer complete and release the conduit.
    ///
    /// Chunks already in the conduit stay receivable after this; the consumer
    /// observes a clean end-of-stream only once it has drained them all. A
    /// sender that is dropped *without* calling `finish` makes the receiver
    /// report [`DaqError::ChannelClosed`] instead.
    pub fn finish(self) {
        self.shared.done.store(true, Ordering::Release);
    }
}

/// Consumer half of the transfer channel.
#[derive(Debug)]
pub struct TransferReceiver {
    rx: mpsc::Receiver<Bytes>,
    shared: Arc<Shared>,
}

impl TransferReceiver {
    /// Number of records currently queued and not yet drained.
    pub fn queued(&self) -> u64 {
        self.shared.queued.load(Ordering::Acquire)
    }

    /// Whether the producer has completed its final flush.
    pub fn is_finished(&self) -> bool {
        self.shared.done.load(Ordering::Acquire)
    }

    /// Receive and decode the next chunk.
    ///
    /// `Ok(None)` means the producer finished cleanly and everything has been
    /// drained. A conduit that ends without the completion flag is
    /// [`DaqError::ChannelClosed`]; a payload that does not decode to whole
    /// records is [`DaqError::MalformedChunk`].
    pub async fn recv_chunk(&mut self) -> Result<Option<Vec<SampleRecord>>> {
        match self.rx.recv().await {
            Some(payload) => self.decode(payload).map(Some),
            None => self.end_of_stream(),
        }
    }

    /// Drain everything currently queued without waiting.
    ///
    /// Returns an empty vector when nothing is queued and the producer is
    /// still alive.
    pub fn try_drain(&mut self) -> Result<Vec<SampleRecord>> {
        let mut records = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(payload) => records.extend(self.decode(payload)?),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if records.is_empty() {
                        self.end_of_stream()?;
                    }
                    break;
                }
            }
        }
        Ok(records)
    }

    /// Drain in FIFO order, waiting up to `timeout` for the first chunk.
    ///
    /// After any wake the queue is swept again, so a batch that arrives while
    /// the first chunk is being handled comes back in the same call. An empty
    /// `Ok` result means the producer finished cleanly with nothing left;
    /// waiting out `timeout` with no producer activity is
    /// [`DaqError::TransferTimeout`].
    pub async fn drain(&mut self, timeout: Duration) -> Result<Vec<SampleRecord>> {
        let ready = self.try_drain()?;
        if !ready.is_empty() {
            return Ok(ready);
        }
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Err(_) => Err(DaqError::TransferTimeout(timeout)),
            Ok(None) => self.end_of_stream().map(|_| Vec::new()),
            Ok(Some(payload)) => {
                let mut records = self.decode(payload)?;
                // Re-check after the wake: pick up anything queued behind
                // the chunk that woke us.
                records.extend(self.try_drain()?);
                Ok(records)
            }
        }
    }

    fn decode(&self, payload: Bytes) -> Result<Vec<SampleRecord>> {
        let records = decode_chunk(payload)?;
        self.shared
            .queued
            .fetch_sub(records.len() as u64, Ordering::AcqRel);
        trace!(records = records.len(), "chunk drained");
        Ok(records)
    }

    fn end_of_stream(&self) -> Result<Option<Vec<SampleRecord>>> {
        if self.is_finished() {
            Ok(None)
        } else {
            Err(DaqError::ChannelClosed)
        }
    }
}

/// Encoded size of a full chunk of `n` records, exposed for capacity math.
pub fn chunk_wire_size(n: usize) -> usize {
    n * RECORD_WIRE_SIZE
}
