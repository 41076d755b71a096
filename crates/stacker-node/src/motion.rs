//! Closed-loop motion, lift and grip control plus the safety state machine.
//!
//! [`MotionController::tick`] is the body of the node's main control loop.
//! Precedence per tick: E-STOP, latched brake, command timeout, then live
//! drive mixing. Loss of the link silences motion: if no fresh DRIVE write
//! lands within the command's own validity window the wheels return to
//! neutral. The tick period must stay well under the 200 ms default window.

use crate::hw::{Actuators, Sensors, ServoChannel};
use crate::regbank::{NodeState, RegBank};
use crate::transport::RegisterTransport;
use parking_lot::Mutex;
use stacker_icd::{
    DEFAULT_HOLD_MS, ElevMode, ErrFlags, GripMode, MAX_V_MM_S, MAX_W_MRAD_S, SERVO_US_MAX,
    SERVO_US_MIN, SERVO_US_NEUTRAL, StateId,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Battery advisory threshold (2S pack, 3.3 V/cell).
const LOW_BATT_MV: u16 = 6600;

/// Proportional gain, lift position loop (pulse offset per mm of error).
const LIFT_KP: i32 = 3;
/// Proportional gain, grip angle loop (pulse offset per degree of error).
const GRIP_KP: i32 = 6;
/// Pulse offset clamp for the lift and grip loops and lift velocity mode.
const AUX_US_SPAN: i32 = 300;

/// Drive kinematics, selected once per deployment.
///
/// The two models found in the field normalize differently: differential
/// clamps each wheel independently, mecanum rescales all four outputs by
/// the largest magnitude so the commanded direction vector survives
/// saturation. They are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveModel {
    /// Two driven wheels; `vy` is ignored. Rotation term uses the
    /// calibrated track width.
    #[default]
    Differential,
    /// Four mecanum wheels with magnitude renormalization.
    Mecanum,
}

/// Wheel/servo pulse widths computed by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActuationFrame {
    wheel_us: [u16; 4],
    lift_us: u16,
    grip_us: u16,
}

impl ActuationFrame {
    fn neutral(model: DriveModel) -> Self {
        let rear = match model {
            DriveModel::Differential => 0,
            DriveModel::Mecanum => SERVO_US_NEUTRAL,
        };
        Self {
            wheel_us: [SERVO_US_NEUTRAL, SERVO_US_NEUTRAL, rear, rear],
            lift_us: SERVO_US_NEUTRAL,
            grip_us: SERVO_US_NEUTRAL,
        }
    }
}

fn clamp_i(v: i32, lo: i32, hi: i32) -> i32 {
    v.clamp(lo, hi)
}

/// Map a wheel velocity (mm/s) to a servo pulse. ±400 mm/s spans ±300 µs
/// around neutral; the result is clamped to the safe pulse range.
fn mm_s_to_us(mm_s: i32) -> u16 {
    let offset = mm_s * 300 / 400;
    clamp_i(
        SERVO_US_NEUTRAL as i32 + offset,
        SERVO_US_MIN as i32,
        SERVO_US_MAX as i32,
    ) as u16
}

/// Map a normalized wheel command [-1, 1] to a servo pulse.
fn norm_to_us(x: f32) -> u16 {
    let x = x.clamp(-1.0, 1.0);
    let span = (SERVO_US_MAX - SERVO_US_NEUTRAL) as f32;
    (SERVO_US_NEUTRAL as f32 + x * span) as u16
}

/// Differential mixing: `left = vx - rot`, `right = vx + rot` with
/// `rot = wz * track / 2`, each wheel clamped to ±500 mm/s.
fn mix_differential(vx: i16, wz: i16, track_mm: u16) -> [u16; 4] {
    let track = if track_mm == 0 { 600 } else { track_mm } as i32;
    let rot = wz as i32 * track / 2000;
    let left = clamp_i(vx as i32 - rot, -500, 500);
    let right = clamp_i(vx as i32 + rot, -500, 500);
    [mm_s_to_us(left), mm_s_to_us(right), 0, 0]
}

/// Standard mecanum mixing with magnitude renormalization: all four
/// outputs are rescaled by the largest magnitude so no single wheel
/// saturates while the others are under-driven.
fn mix_mecanum(vx: i16, vy: i16, wz: i16) -> [u16; 4] {
    let vx = vx as f32 / MAX_V_MM_S as f32;
    let vy = vy as f32 / MAX_V_MM_S as f32;
    let wz = wz as f32 / MAX_W_MRAD_S as f32;

    let mut out = [vx - vy - wz, vx + vy + wz, vx + vy - wz, vx - vy + wz];
    let max_mag = out.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max_mag > 1.0 {
        for v in &mut out {
            *v /= max_mag;
        }
    }
    [
        norm_to_us(out[0]),
        norm_to_us(out[1]),
        norm_to_us(out[2]),
        norm_to_us(out[3]),
    ]
}

/// The node's control loop over the shared state.
pub struct MotionController {
    state: Arc<NodeState>,
    actuators: Box<dyn Actuators>,
    sensors: Arc<Mutex<dyn Sensors>>,
    model: DriveModel,
}

impl MotionController {
    pub fn new(
        state: Arc<NodeState>,
        sensors: Arc<Mutex<dyn Sensors>>,
        actuators: Box<dyn Actuators>,
        model: DriveModel,
    ) -> Self {
        Self {
            state,
            actuators,
            sensors,
            model,
        }
    }

    /// One control tick: refresh the state machine, compute actuation,
    /// apply it and mirror it into the feedback registers.
    pub fn tick(&mut self, now: Instant) {
        let (estop, vbatt_mv) = {
            let mut sensors = self.sensors.lock();
            (sensors.estop_engaged(), sensors.vbatt_mv())
        };
        let enc = self.state.encoders.snapshot();
        let model = self.model;

        let frame = self.state.regs.masked(|r| {
            r.err_flags
                .assign(ErrFlags::WARN_LOW_BATT, vbatt_mv < LOW_BATT_MV);
            r.err_flags.assign(ErrFlags::ESTOP, estop);

            if estop || r.brake_latched {
                // Unconditional stop: every axis to neutral.
                r.state = StateId::Brake;
                let frame = ActuationFrame::neutral(model);
                Self::mirror(r, model, frame);
                return frame;
            }

            let mut frame = ActuationFrame::neutral(model);
            frame.wheel_us = Self::drive_tick(r, model, now);
            frame.lift_us = Self::lift_tick(r, enc.lift);
            frame.grip_us = Self::grip_tick(r, enc.grip);
            Self::mirror(r, model, frame);
            frame
        });

        self.apply(frame);
    }

    /// DRIVE handling: timeout check, envelope clamp, mixing.
    fn drive_tick(r: &mut RegBank, model: DriveModel, now: Instant) -> [u16; 4] {
        let hold_ms = if r.drive_cmd.hold_ms == 0 {
            DEFAULT_HOLD_MS
        } else {
            r.drive_cmd.hold_ms
        };
        let fresh = r
            .last_drive_write
            .is_some_and(|t| now.duration_since(t).as_millis() <= hold_ms as u128);
        if !fresh {
            // Command timeout: wheels to neutral, lift/grip keep holding.
            r.err_flags.set(ErrFlags::TIMEOUT);
            r.state = StateId::Idle;
            return ActuationFrame::neutral(model).wheel_us;
        }
        r.err_flags.clear(ErrFlags::TIMEOUT);

        let cmd = r.drive_cmd;
        let vx = clamp_i(cmd.vx_mm_s as i32, -(MAX_V_MM_S as i32), MAX_V_MM_S as i32) as i16;
        let vy = clamp_i(cmd.vy_mm_s as i32, -(MAX_V_MM_S as i32), MAX_V_MM_S as i32) as i16;
        let wz = clamp_i(
            cmd.wz_mrad_s as i32,
            -(MAX_W_MRAD_S as i32),
            MAX_W_MRAD_S as i32,
        ) as i16;
        r.err_flags.assign(
            ErrFlags::DRIVE_RNG,
            vx != cmd.vx_mm_s || vy != cmd.vy_mm_s || wz != cmd.wz_mrad_s,
        );

        r.state = StateId::Drive;
        match model {
            DriveModel::Differential => mix_differential(vx, wz, r.odo_cfg.track_mm),
            DriveModel::Mecanum => mix_mecanum(vx, vy, wz),
        }
    }

    /// Lift axis: neutral on invalid calibration, else velocity pass-through
    /// or proportional position hold.
    fn lift_tick(r: &mut RegBank, lift_count: i32) -> u16 {
        if r.lift_cfg.enc_per_mm == 0 {
            r.err_flags.set(ErrFlags::LIFT_STALL | ErrFlags::CFG);
            return SERVO_US_NEUTRAL;
        }
        let offset = match r.elev_cmd.mode {
            ElevMode::Velocity => clamp_i(r.elev_cmd.speed_mm_s as i32, -AUX_US_SPAN, AUX_US_SPAN),
            ElevMode::Position => {
                let measured = r.lift_cfg.count_to_mm(lift_count) as i32;
                let error = r.elev_cmd.height_mm as i32 - measured;
                clamp_i(error * LIFT_KP, -AUX_US_SPAN, AUX_US_SPAN)
            }
        };
        clamp_i(
            SERVO_US_NEUTRAL as i32 + offset,
            SERVO_US_MIN as i32,
            SERVO_US_MAX as i32,
        ) as u16
    }

    /// Grip axis: resolve the commanded mode to a target angle, then
    /// proportional control against the calibrated angle estimate.
    fn grip_tick(r: &mut RegBank, grip_count: i32) -> u16 {
        if r.grip_cfg.enc_per_deg_q12 == 0 {
            r.err_flags.set(ErrFlags::GRIP_RANGE | ErrFlags::CFG);
            return SERVO_US_NEUTRAL;
        }
        let (target, clamped) = match r.grip_cmd.mode {
            GripMode::Open => (r.grip_cfg.deg_min, false),
            GripMode::Close => (r.grip_cfg.deg_max, false),
            GripMode::Pose => {
                let want = r.grip_cmd.pose_deg;
                let got = want.clamp(r.grip_cfg.deg_min, r.grip_cfg.deg_max);
                (got, got != want)
            }
        };
        r.err_flags.assign(ErrFlags::GRIP_RANGE, clamped);

        let measured = r.grip_cfg.count_to_deg(grip_count) as i32;
        let error = target as i32 - measured;
        let offset = clamp_i(error * GRIP_KP, -AUX_US_SPAN, AUX_US_SPAN);
        clamp_i(
            SERVO_US_NEUTRAL as i32 + offset,
            SERVO_US_MIN as i32,
            SERVO_US_MAX as i32,
        ) as u16
    }

    /// Mirror the computed actuation into DRIVEFB/AUXFB.
    fn mirror(r: &mut RegBank, _model: DriveModel, frame: ActuationFrame) {
        r.drive_fb.wheel_us = frame.wheel_us;
        r.aux_fb.lift_us = frame.lift_us;
        r.aux_fb.grip_us = frame.grip_us;
    }

    fn apply(&mut self, frame: ActuationFrame) {
        let channels = [
            ServoChannel::DriveFl,
            ServoChannel::DriveFr,
            ServoChannel::DriveRl,
            ServoChannel::DriveRr,
        ];
        for (channel, us) in channels.into_iter().zip(frame.wheel_us) {
            // The differential model leaves the rear pair unattached.
            if self.model == DriveModel::Differential
                && matches!(channel, ServoChannel::DriveRl | ServoChannel::DriveRr)
            {
                continue;
            }
            self.actuators.write_us(channel, us);
        }
        self.actuators.write_us(ServoChannel::Lift, frame.lift_us);
        self.actuators.write_us(ServoChannel::Grip, frame.grip_us);
    }
}

/// The assembled motion node: shared state, control loop and a way to hand
/// the bus its slave-side transport.
pub struct MotionNode {
    state: Arc<NodeState>,
    sensors: Arc<Mutex<dyn Sensors>>,
    controller: MotionController,
}

impl MotionNode {
    pub fn new(
        model: DriveModel,
        sensors: impl Sensors + 'static,
        actuators: impl Actuators + 'static,
    ) -> Self {
        let state = Arc::new(NodeState::default());
        let sensors: Arc<Mutex<dyn Sensors>> = Arc::new(Mutex::new(sensors));
        state.regs.masked(|r| {
            r.validate_configs();
            r.state = StateId::Idle;
        });
        debug!(?model, "motion node up");
        let controller =
            MotionController::new(state.clone(), sensors.clone(), Box::new(actuators), model);
        Self {
            state,
            sensors,
            controller,
        }
    }

    /// Slave-side transport to attach to the bus. May be called more than
    /// once; each transport keeps only its own register pointer.
    pub fn transport(&self) -> RegisterTransport {
        RegisterTransport::new(self.state.clone(), self.sensors.clone())
    }

    pub fn state(&self) -> &Arc<NodeState> {
        &self.state
    }

    /// Run one control tick.
    pub fn tick(&mut self, now: Instant) {
        self.controller.tick(now);
    }
}
