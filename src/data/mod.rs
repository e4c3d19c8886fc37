//! Sample data types and their cross-boundary binary encoding.

pub mod record;
pub mod wire;

pub use record::{SampleRecord, FORCE_CHANNELS, TRIGGER_CHANNELS};
pub use wire::{decode_chunk, decode_record, encode_chunk, encode_record, RECORD_WIRE_SIZE};
