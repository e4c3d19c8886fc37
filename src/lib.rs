//! # force-daq
//!
//! Lossless buffering and chunked transfer pipeline for force/torque sensor
//! acquisition. A producer task reads multi-channel samples at a fixed rate,
//! accumulates them in an append-only FIFO whose length is cheaply observable,
//! and hands them to a consumer in bounded chunks — in order, without loss,
//! and without ever stalling the acquisition tick loop on a slow consumer.
//!
//! ## Crate Structure
//!
//! - **`data`**: the [`SampleRecord`] value type and its fixed 56-byte
//!   little-endian wire encoding used for every cross-boundary transfer.
//! - **`buffer`**: the producer-owned accumulation FIFO with an atomic
//!   length gauge.
//! - **`channel`**: the bounded transfer conduit with availability counting
//!   and a clean-completion handshake.
//! - **`producer`**: the acquisition loop (device session + buffer) with its
//!   tick/flush/stop sequencing.
//! - **`consumer`**: the pull-side reader and its Idle/Draining/Stopped
//!   state machine.
//! - **`run`**: [`start_run`] and [`RunHandle`], the surface handed to the
//!   recorder/GUI side.
//! - **`device`**: the [`AnalogSource`] seam to vendor drivers, plus
//!   [`MockForceSensor`] for hardware-free runs.
//! - **`config`**: TOML-backed settings with validation.
//! - **`error`**: the [`DaqError`] taxonomy.
//! - **`tracing_setup`**: logging initialization.

pub mod buffer;
pub mod channel;
pub mod config;
pub mod consumer;
pub mod data;
pub mod device;
pub mod error;
pub mod producer;
pub mod run;
pub mod tracing_setup;
pub mod validation;

pub use buffer::SampleBuffer;
pub use channel::{transfer_channel, TransferReceiver, TransferSender};
pub use config::{DeviceSettings, ReadErrorPolicy, RunSettings, Settings};
pub use consumer::{ConsumerReader, ReaderState};
pub use data::{SampleRecord, RECORD_WIRE_SIZE};
pub use device::{AnalogSource, MockForceSensor, TickReading};
pub use error::{DaqError, Result};
pub use producer::{AcquisitionLoop, RunStats};
pub use run::{start_run, RunHandle, RunOutcome};
