//! Fixed-layout binary encoding of sample records.
//!
//! Every record that crosses the transfer boundary is encoded with the same
//! statically-checked layout:
//!
//! ```text
//! device_id: i32   (4 bytes)
//! time:      i32   (4 bytes)
//! counter:   u64   (8 bytes)
//! forces:    [f32; 6]  (24 bytes)
//! trigger:   [f32; 2]  (8 bytes)
//! ```
//!
//! 56 bytes per record, little-endian, packed, no version tag. A chunk is a
//! plain concatenation of records; any payload that is not a whole number of
//! records is rejected as [`DaqError::MalformedChunk`] rather than partially
//! decoded.

use crate::data::record::{SampleRecord, FORCE_CHANNELS, TRIGGER_CHANNELS};
use crate::error::{DaqError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Encoded size of one record in bytes.
pub const RECORD_WIRE_SIZE: usize = 4 + 4 + 8 + 4 * FORCE_CHANNELS + 4 * TRIGGER_CHANNELS;

/// Append the wire form of one record to `buf`.
pub fn encode_record(record: &SampleRecord, buf: &mut BytesMut) {
    buf.reserve(RECORD_WIRE_SIZE);
    buf.put_i32_le(record.device_id);
    buf.put_i32_le(record.time);
    buf.put_u64_le(record.counter);
    for value in &record.forces {
        buf.put_f32_le(*value);
    }
    for value in &record.trigger {
        buf.put_f32_le(*value);
    }
}

/// Decode one record from the front of `buf`.
///
/// Fails with [`DaqError::MalformedChunk`] if fewer than
/// [`RECORD_WIRE_SIZE`] bytes remain.
pub fn decode_record(buf: &mut impl Buf) -> Result<SampleRecord> {
    if buf.remaining() < RECORD_WIRE_SIZE {
        return Err(DaqError::MalformedChunk(format!(
            "need {RECORD_WIRE_SIZE} bytes for a record, {} remain",
            buf.remaining()
        )));
    }
    let device_id = buf.get_i32_le();
    let time = buf.get_i32_le();
    let counter = buf.get_u64_le();
    let mut forces = [0.0_f32; FORCE_CHANNELS];
    for slot in &mut forces {
        *slot = buf.get_f32_le();
    }
    let mut trigger = [0.0_f32; TRIGGER_CHANNELS];
    for slot in &mut trigger {
        *slot = buf.get_f32_le();
    }
    Ok(SampleRecord::new(device_id, time, counter, forces, trigger))
}

/// Encode an ordered chunk of records into a single contiguous payload.
pub fn encode_chunk(records: &[SampleRecord]) -> Bytes {
    let mut buf = BytesMut::with_capacity(records.len() * RECORD_WIRE_SIZE);
    for record in records {
        encode_record(record, &mut buf);
    }
    buf.freeze()
}

/// Decode a chunk payload back into its ordered records.
///
/// The payload length must be an exact multiple of [`RECORD_WIRE_SIZE`].
pub fn decode_chunk(mut payload: Bytes) -> Result<Vec<SampleRecord>> {
    if payload.len() % RECORD_WIRE_SIZE != 0 {
        return Err(DaqError::MalformedChunk(format!(
            "payload of {} bytes is not a multiple of the {RECORD_WIRE_SIZE}-byte record size",
            payload.len()
        )));
    }
    let mut records = Vec::with_capacity(payload.len() / RECORD_WIRE_SIZE);
    while payload.has_remaining() {
        records.push(decode_record(&mut payload)?);
    }
    Ok(records)
}
