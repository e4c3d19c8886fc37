//! The device-driver seam and a mock force sensor.
//!
//! The vendor driver that physically reads analog voltages is an external
//! collaborator; the pipeline only depends on the [`AnalogSource`] trait.
//! [`MockForceSensor`] provides a simulated implementation for tests and
//! hardware-free development, with deterministic seeding and per-tick error
//! injection.

use crate::config::DeviceSettings;
use crate::data::record::{FORCE_CHANNELS, TRIGGER_CHANNELS};
use crate::error::{DaqError, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::debug;

/// One tick's worth of freshly read channel data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReading {
    /// Raw force/torque channel values: [Fx, Fy, Fz, Tx, Ty, Tz].
    pub forces: [f32; FORCE_CHANNELS],
    /// Raw trigger channel values.
    pub trigger: [f32; TRIGGER_CHANNELS],
}

/// A sensor device that yields one multi-channel reading per tick.
///
/// `start` and `stop` are idempotent, mirroring the underlying vendor task
/// lifecycle. `read_tick` fails with [`DaqError::DeviceRead`] on a hardware
/// or timeout failure; the producer loop's configured policy decides what to
/// do with the failed tick.
#[async_trait]
pub trait AnalogSource: Send {
    /// Id of the physical device, stamped into every record it produces.
    fn device_id(&self) -> i32;

    /// Start data acquisition on the device. Safe to call when started.
    async fn start(&mut self) -> Result<()>;

    /// Stop data acquisition on the device. Safe to call when stopped.
    async fn stop(&mut self) -> Result<()>;

    /// Read one sample from every configured channel.
    async fn read_tick(&mut self) -> Result<TickReading>;
}

/// Simulated force sensor for tests and hardware-free runs.
///
/// Values come from a seeded rng so runs are reproducible. Specific ticks can
/// be scripted to fail, which exercises the producer's read-error policy
/// without real hardware.
#[derive(Debug)]
pub struct MockForceSensor {
    device_id: i32,
    rng: StdRng,
    started: bool,
    reads: u64,
    fail_ticks: HashSet<u64>,
}

impl MockForceSensor {
    /// Create a sensor with the given device id and a fixed default seed.
    pub fn new(device_id: i32) -> Self {
        Self::with_seed(device_id, 0xF0_5E)
    }

    /// Create a sensor with an explicit rng seed.
    pub fn with_seed(device_id: i32, seed: u64) -> Self {
        Self {
            device_id,
            rng: StdRng::seed_from_u64(seed),
            started: false,
            reads: 0,
            fail_ticks: HashSet::new(),
        }
    }

    /// Build a sensor from device settings, logging the channel string the
    /// way a real driver would pass it to the vendor API.
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        debug!(
            physical_channel = %settings.physical_channel(),
            rate_hz = settings.rate_hz,
            "mock sensor standing in for hardware"
        );
        Self::new(settings.device_id)
    }

    /// Script the given read indices (0-based) to fail with a device error.
    pub fn with_failures<I: IntoIterator<Item = u64>>(mut self, ticks: I) -> Self {
        self.fail_ticks = ticks.into_iter().collect();
        self
    }

    /// Whether the device is currently acquiring.
    pub fn is_acquiring(&self) -> bool {
        self.started
    }
}

#[async_trait]
impl AnalogSource for MockForceSensor {
    fn device_id(&self) -> i32 {
        self.device_id
    }

    async fn start(&mut self) -> Result<()> {
        if !self.started {
            debug!(device_id = self.device_id, "mock sensor started");
            self.started = true;
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.started {
            debug!(device_id = self.device_id, "mock sensor stopped");
            self.started = false;
        }
        Ok(())
    }

    async fn read_tick(&mut self) -> Result<TickReading> {
        if !self.started {
            return Err(DaqError::DeviceRead(
                "read_tick called before start".to_string(),
            ));
        }
        let tick = self.reads;
        self.reads += 1;
        if self.fail_ticks.contains(&tick) {
            return Err(DaqError::DeviceRead(format!(
                "injected failure at read {tick}"
            )));
        }
        let mut forces = [0.0_f32; FORCE_CHANNELS];
        for slot in &mut forces {
            *slot = self.rng.gen_range(-10.0..10.0);
        }
        let trigger = [
            self.rng.gen_range(0.0..5.0),
            self.rng.gen_range(0.0..5.0),
        ];
        Ok(TickReading { forces, trigger })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let mut sensor = MockForceSensor::new(1);
        sensor.start().await.expect("start");
        sensor.start().await.expect("second start");
        assert!(sensor.is_acquiring());
        sensor.stop().await.expect("stop");
        sensor.stop().await.expect("second stop");
        assert!(!sensor.is_acquiring());
    }

    #[tokio::test]
    async fn read_before_start_is_a_device_error() {
        let mut sensor = MockForceSensor::new(1);
        assert!(matches!(
            sensor.read_tick().await,
            Err(DaqError::DeviceRead(_))
        ));
    }

    #[tokio::test]
    async fn seeded_sensors_produce_identical_streams() {
        let mut a = MockForceSensor::with_seed(1, 7);
        let mut b = MockForceSensor::with_seed(1, 7);
        a.start().await.expect("start");
        b.start().await.expect("start");
        for _ in 0..20 {
            let ra = a.read_tick().await.expect("read");
            let rb = b.read_tick().await.expect("read");
            assert_eq!(ra, rb);
        }
    }

    #[tokio::test]
    async fn scripted_ticks_fail_and_the_stream_continues() {
        let mut sensor = MockForceSensor::new(1).with_failures([1, 3]);
        sensor.start().await.expect("start");
        assert!(sensor.read_tick().await.is_ok());
        assert!(matches!(
            sensor.read_tick().await,
            Err(DaqError::DeviceRead(_))
        ));
        assert!(sensor.read_tick().await.is_ok());
        assert!(matches!(
            sensor.read_tick().await,
            Err(DaqError::DeviceRead(_))
        ));
        assert!(sensor.read_tick().await.is_ok());
    }
}
