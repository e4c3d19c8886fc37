//! The force/torque sample record.
//!
//! One [`SampleRecord`] represents a single acquisition tick: which device it
//! came from, when, its process-local monotonic counter, six force/torque
//! channels and two trigger channels. Records are fully formed at
//! construction; nothing downstream ever sees a partial record.

use crate::error::{DaqError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of force/torque channels in a record: Fx, Fy, Fz, Tx, Ty, Tz.
pub const FORCE_CHANNELS: usize = 6;

/// Number of trigger channels in a record.
pub const TRIGGER_CHANNELS: usize = 2;

/// One acquisition tick from a force/torque sensor.
///
/// The named accessors (`fx()` .. `tz()`, `set_fx()` .. `set_tz()`) are views
/// onto slots of the `forces` array, not separate storage: writing through
/// `set_fz` and reading `forces[2]` touch the same memory. `tz` maps to its
/// own slot (index 5).
///
/// `counter` is strictly increasing per device within a run and is maintained
/// by the producer loop, never re-derived from hardware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Id of the physical sensor device that produced the sample.
    pub device_id: i32,
    /// Acquisition time in milliseconds since the run started.
    pub time: i32,
    /// Per-device monotonic sample counter, starting at 0.
    pub counter: u64,
    /// Force/torque channels: [Fx, Fy, Fz, Tx, Ty, Tz].
    pub forces: [f32; FORCE_CHANNELS],
    /// Trigger channels: [trigger1, trigger2].
    pub trigger: [f32; TRIGGER_CHANNELS],
}

impl SampleRecord {
    /// Column names of the textual form, in `Display` order.
    pub const CSV_HEADER: &'static str =
        "device_id,time,counter,Fx,Fy,Fz,Tx,Ty,Tz,trigger1,trigger2";

    /// Create a record from fixed-shape channel arrays.
    pub fn new(
        device_id: i32,
        time: i32,
        counter: u64,
        forces: [f32; FORCE_CHANNELS],
        trigger: [f32; TRIGGER_CHANNELS],
    ) -> Self {
        Self {
            device_id,
            time,
            counter,
            forces,
            trigger,
        }
    }

    /// Create a record from dynamically sized channel slices.
    ///
    /// This is the entry point for channel data coming from a driver that
    /// returns variable-length reads. Slices of the wrong length are rejected
    /// with [`DaqError::InvalidShape`] before the record can reach a buffer.
    pub fn from_slices(
        device_id: i32,
        time: i32,
        counter: u64,
        forces: &[f32],
        trigger: &[f32],
    ) -> Result<Self> {
        let forces: [f32; FORCE_CHANNELS] =
            forces
                .try_into()
                .map_err(|_| DaqError::InvalidShape {
                    what: "force",
                    expected: FORCE_CHANNELS,
                    actual: forces.len(),
                })?;
        let trigger: [f32; TRIGGER_CHANNELS] =
            trigger
                .try_into()
                .map_err(|_| DaqError::InvalidShape {
                    what: "trigger",
                    expected: TRIGGER_CHANNELS,
                    actual: trigger.len(),
                })?;
        Ok(Self::new(device_id, time, counter, forces, trigger))
    }

    /// Force along the x axis (`forces[0]`).
    pub fn fx(&self) -> f32 {
        self.forces[0]
    }

    /// Force along the y axis (`forces[1]`).
    pub fn fy(&self) -> f32 {
        self.forces[1]
    }

    /// Force along the z axis (`forces[2]`).
    pub fn fz(&self) -> f32 {
        self.forces[2]
    }

    /// Torque about the x axis (`forces[3]`).
    pub fn tx(&self) -> f32 {
        self.forces[3]
    }

    /// Torque about the y axis (`forces[4]`).
    pub fn ty(&self) -> f32 {
        self.forces[4]
    }

    /// Torque about the z axis (`forces[5]`).
    pub fn tz(&self) -> f32 {
        self.forces[5]
    }

    /// Set Fx (`forces[0]`).
    pub fn set_fx(&mut self, value: f32) {
        self.forces[0] = value;
    }

    /// Set Fy (`forces[1]`).
    pub fn set_fy(&mut self, value: f32) {
        self.forces[1] = value;
    }

    /// Set Fz (`forces[2]`).
    pub fn set_fz(&mut self, value: f32) {
        self.forces[2] = value;
    }

    /// Set Tx (`forces[3]`).
    pub fn set_tx(&mut self, value: f32) {
        self.forces[3] = value;
    }

    /// Set Ty (`forces[4]`).
    pub fn set_ty(&mut self, value: f32) {
        self.forces[4] = value;
    }

    /// Set Tz (`forces[5]`).
    pub fn set_tz(&mut self, value: f32) {
        self.forces[5] = value;
    }
}

impl fmt::Display for SampleRecord {
    /// Fixed-precision textual form: 8 decimals for forces, 4 for triggers.
    ///
    /// The format is reproducible so it can be used for logging and in
    /// golden-file comparisons.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.device_id, self.time, self.counter)?;
        for value in &self.forces {
            write!(f, ",{value:.8}")?;
        }
        for value in &self.trigger {
            write!(f, ",{value:.4}")?;
        }
        Ok(())
    }
}
