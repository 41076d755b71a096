//! Interrupt-driven quadrature decoding for lift, gripper and both drive
//! wheels.
//!
//! Standard 1x-edge decode: on each transition of the driving phase the
//! opposite phase is sampled and the count steps by
//! `if a == b { +1 } else { -1 }`. Resolution is one count per edge of the
//! driving phase. Counts are monotonic relative to rotation direction and
//! do not saturate; wrap-around is a known platform limitation.

use crate::IrqCell;

/// Per-axis 1x quadrature decoder.
///
/// Tracks the last observed level of the driving phase so that repeated
/// samples at the same level are ignored (edge handlers can fire on
/// glitches).
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadratureDecoder {
    last_a: bool,
}

impl QuadratureDecoder {
    /// Feed one sample of (driving phase, opposite phase). Returns the
    /// count delta: 0 when the driving phase did not change.
    pub fn clock(&mut self, a: bool, b: bool) -> i32 {
        if a == self.last_a {
            return 0;
        }
        self.last_a = a;
        if a == b { 1 } else { -1 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    decoder: QuadratureDecoder,
    count: i32,
}

impl Channel {
    fn edge(&mut self, a: bool, b: bool) {
        self.count += self.decoder.clock(a, b);
    }
}

#[derive(Debug, Default)]
struct Bank {
    lift: Channel,
    grip: Channel,
    odo_left: Channel,
    odo_right: Channel,
}

/// Torn-free snapshot of all four counters, taken in one masked section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderSnapshot {
    pub lift: i32,
    pub grip: i32,
    pub odo_left: i32,
    pub odo_right: i32,
}

/// The four encoder counters behind one [`IrqCell`].
///
/// Each `*_edge` method is the body of that axis' edge interrupt; the
/// control loop only ever sees the counters through [`EncoderBank::snapshot`].
#[derive(Default)]
pub struct EncoderBank {
    inner: IrqCell<Bank>,
}

impl EncoderBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lift_edge(&self, a: bool, b: bool) {
        self.inner.masked(|bank| bank.lift.edge(a, b));
    }

    pub fn grip_edge(&self, a: bool, b: bool) {
        self.inner.masked(|bank| bank.grip.edge(a, b));
    }

    pub fn odo_left_edge(&self, a: bool, b: bool) {
        self.inner.masked(|bank| bank.odo_left.edge(a, b));
    }

    pub fn odo_right_edge(&self, a: bool, b: bool) {
        self.inner.masked(|bank| bank.odo_right.edge(a, b));
    }

    /// Read all counters in one masked section.
    pub fn snapshot(&self) -> EncoderSnapshot {
        self.inner.masked(|bank| EncoderSnapshot {
            lift: bank.lift.count,
            grip: bank.grip.count,
            odo_left: bank.odo_left.count,
            odo_right: bank.odo_right.count,
        })
    }

    /// HOME: lift axis re-zeroes at the current position.
    pub fn home_lift(&self) {
        self.inner.masked(|bank| bank.lift.count = 0);
    }

    /// HOME: gripper axis presets to the calibrated zero count.
    pub fn preset_grip(&self, count: i32) {
        self.inner.masked(|bank| bank.grip.count = count);
    }
}
