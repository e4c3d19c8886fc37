//! Configuration management.
//!
//! Settings load from TOML via the `config` crate and deserialize with serde
//! defaults, so a minimal file (or none at all) yields a working mock setup.
//! Semantic checks that parsing cannot catch live in [`Settings::validate`].

use crate::error::{DaqError, Result};
use crate::validation;
use config::Config;
use serde::Deserialize;
use std::time::Duration;

/// Top-level application settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    /// Tracing filter directive, e.g. `"info"` or `"force_daq=debug"`.
    pub log_level: String,
    /// Sensor device configuration.
    pub device: DeviceSettings,
    /// Acquisition-run and transfer configuration.
    pub run: RunSettings,
}

/// Settings for one sensor device, mirroring what the vendor driver needs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceSettings {
    /// Driver-level device name, e.g. `"Dev1"`.
    pub device_name: String,
    /// Analog input channel specification, e.g. `"ai0:7"`.
    pub channels: String,
    /// Id stamped into every record from this device.
    pub device_id: i32,
    /// Configured hardware sample rate in Hz.
    pub rate_hz: f64,
    /// Lower bound of the analog voltage range.
    pub min_volts: f64,
    /// Upper bound of the analog voltage range.
    pub max_volts: f64,
}

/// Settings controlling buffering, chunked transfer and shutdown.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunSettings {
    /// Maximum records per transferred chunk.
    pub chunk_size: usize,
    /// Buffer length that triggers a non-blocking mid-run flush. `None`
    /// defers all transfer to stop time.
    pub flush_watermark: Option<usize>,
    /// Stop automatically after this many ticks. `None` runs until stopped.
    pub target_ticks: Option<u64>,
    /// In-flight chunk capacity of the transfer conduit.
    pub channel_capacity: usize,
    /// Milliseconds the consumer waits for data before reporting a transfer
    /// timeout.
    pub drain_timeout_ms: u64,
    /// What the producer does with a tick whose device read failed.
    pub read_error_policy: ReadErrorPolicy,
}

/// Producer-side policy for a failed device read.
///
/// Either way the failed tick consumes its counter value; the gap is never
/// silently renumbered.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorPolicy {
    /// Log the failure and keep ticking.
    Skip,
    /// Stop the device, flush what was acquired, and end the run with the
    /// error.
    Abort,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            device: DeviceSettings::default(),
            run: RunSettings::default(),
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            device_name: "Dev1".to_string(),
            channels: "ai0:7".to_string(),
            device_id: 0,
            rate_hz: 1000.0,
            min_volts: -10.0,
            max_volts: 10.0,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            flush_watermark: None,
            target_ticks: None,
            channel_capacity: 32,
            drain_timeout_ms: 1_000,
            read_error_policy: ReadErrorPolicy::Skip,
        }
    }
}

impl DeviceSettings {
    /// Full channel path handed to the vendor driver, e.g. `"Dev1/ai0:7"`.
    pub fn physical_channel(&self) -> String {
        format!("{}/{}", self.device_name, self.channels)
    }
}

impl RunSettings {
    /// The drain timeout as a [`Duration`].
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// The tick period implied by a device sample rate.
    pub fn tick_period(rate_hz: f64) -> Duration {
        Duration::from_secs_f64(1.0 / rate_hz)
    }
}

impl Settings {
    /// Load settings from `config/<name>.toml` (default profile: `default`).
    pub fn new(config_name: Option<&str>) -> Result<Self> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        Self::from_file(&config_path)
    }

    /// Load and validate settings from an explicit file path (no extension).
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .map_err(DaqError::Config)?;
        let settings: Settings = raw.try_deserialize().map_err(DaqError::Config)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check semantic constraints that deserialization cannot express.
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, std::result::Result<(), &'static str>); 5] = [
            ("device.rate_hz", validation::is_positive(self.device.rate_hz)),
            (
                "device voltage range",
                validation::is_ordered_range(self.device.min_volts, self.device.max_volts),
            ),
            ("run.chunk_size", validation::is_nonzero(self.run.chunk_size)),
            (
                "run.channel_capacity",
                validation::is_nonzero(self.run.channel_capacity),
            ),
            (
                "run.drain_timeout_ms",
                validation::is_nonzero(self.run.drain_timeout_ms as usize),
            ),
        ];
        for (field, check) in checks {
            if let Err(reason) = check {
                return Err(DaqError::Configuration(format!("{field}: {reason}")));
            }
        }
        if let Some(watermark) = self.run.flush_watermark {
            if watermark < self.run.chunk_size {
                return Err(DaqError::Configuration(
                    "run.flush_watermark must be at least run.chunk_size".to_string(),
                ));
            }
        }
        Ok(())
    }
}
