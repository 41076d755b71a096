//! Bench-top hardware doubles for the `mock` feature.
//!
//! [`BenchSensors`] and [`BenchActuators`] stand in for the node's analog
//! front end and PWM outputs. Both hand out cheap clonable handles so a
//! test (or the demo CLI) can poke sensor values and observe pulses while
//! the node owns the other end.

use crate::hw::{Actuators, Sensors, ServoChannel};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct SensorState {
    line_left: u16,
    line_right: u16,
    vbatt_mv: u16,
    estop: bool,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            line_left: 0,
            line_right: 0,
            vbatt_mv: 7400,
            estop: false,
        }
    }
}

/// Settable sensor front end. Starts at a healthy battery with the
/// E-STOP released and both line sensors reading dark.
#[derive(Debug, Clone, Default)]
pub struct BenchSensors {
    state: Arc<Mutex<SensorState>>,
}

impl BenchSensors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lines(&self, left: u16, right: u16) {
        let mut s = self.state.lock();
        s.line_left = left;
        s.line_right = right;
    }

    pub fn set_vbatt_mv(&self, mv: u16) {
        self.state.lock().vbatt_mv = mv;
    }

    pub fn set_estop(&self, engaged: bool) {
        self.state.lock().estop = engaged;
    }
}

impl Sensors for BenchSensors {
    fn line_left(&mut self) -> u16 {
        self.state.lock().line_left
    }

    fn line_right(&mut self) -> u16 {
        self.state.lock().line_right
    }

    fn vbatt_mv(&mut self) -> u16 {
        self.state.lock().vbatt_mv
    }

    fn estop_engaged(&mut self) -> bool {
        self.state.lock().estop
    }
}

/// Records the last pulse written to each servo channel.
#[derive(Debug, Clone, Default)]
pub struct BenchActuators {
    pulses: Arc<Mutex<HashMap<ServoChannel, u16>>>,
}

impl BenchActuators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last pulse applied to `channel`, if any tick has driven it.
    pub fn last_us(&self, channel: ServoChannel) -> Option<u16> {
        self.pulses.lock().get(&channel).copied()
    }
}

impl Actuators for BenchActuators {
    fn write_us(&mut self, channel: ServoChannel, us: u16) {
        self.pulses.lock().insert(channel, us);
    }
}
