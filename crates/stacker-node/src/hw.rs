//! Hardware edge of the motion node: sensor sampling and servo outputs.
//!
//! These traits isolate the only two places the core touches real
//! peripherals, so the whole node runs unchanged against bench
//! implementations in tests and the simulated rig.

/// Servo output channels. The differential drive model uses
/// `DriveFl`/`DriveFr` as its left/right wheels and leaves the rear pair
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServoChannel {
    DriveFl,
    DriveFr,
    DriveRl,
    DriveRr,
    Lift,
    Grip,
}

/// Live sensor inputs sampled by the control loop and by telemetry reads.
pub trait Sensors: Send {
    /// Left line sensor, raw ADC counts.
    fn line_left(&mut self) -> u16;

    /// Right line sensor, raw ADC counts.
    fn line_right(&mut self) -> u16;

    /// Battery voltage in millivolts.
    fn vbatt_mv(&mut self) -> u16;

    /// True while the hardware E-STOP is engaged.
    fn estop_engaged(&mut self) -> bool;
}

/// Servo pulse outputs. `us` is already clamped to the safe pulse range
/// by the controller; implementations just forward it.
pub trait Actuators: Send {
    fn write_us(&mut self, channel: ServoChannel, us: u16);
}
