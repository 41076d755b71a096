//! ICD register transport: services the I2C slave callbacks against the
//! shared node state.
//!
//! Both callbacks run in bus-interrupt context. Multi-byte command and
//! config writes are decoded from the transaction buffer as a whole and
//! committed in one masked section only when the record's final byte is
//! present, so the control loop can never observe a half-written command.
//! Telemetry reads synthesize records from live state per request; nothing
//! is served from a stale cache.

use crate::hw::Sensors;
use crate::regbank::NodeState;
use parking_lot::Mutex;
use stacker_icd::{
    BrakeCommand, DriveCommand, ElevCommand, GripCommand, GripConfig, LiftConfig, LineConfig,
    Lines, OdoConfig, Odometry, Power, ProtocolError, Record, Register, SensReadout, StateId,
    Status0, Status1,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{trace, warn};

/// Motion-node side of the bus: an [`stacker_bus::I2cSlave`] over the
/// shared [`NodeState`].
pub struct RegisterTransport {
    state: Arc<NodeState>,
    sensors: Arc<Mutex<dyn Sensors>>,
    /// Active register pointer, set by the first byte of every write.
    reg_ptr: u8,
}

impl RegisterTransport {
    pub fn new(state: Arc<NodeState>, sensors: Arc<Mutex<dyn Sensors>>) -> Self {
        Self {
            state,
            sensors,
            reg_ptr: 0,
        }
    }

    /// Decode a full record from the transaction data and commit it.
    /// Writes shorter than the record width never commit; longer writes
    /// ignore the trailing bytes.
    fn commit<R: Record>(&self, data: &[u8], apply: impl FnOnce(&NodeState, R)) {
        if data.len() < R::LEN {
            trace!(
                register = R::NAME,
                got = data.len(),
                want = R::LEN,
                "partial write discarded"
            );
            return;
        }
        match R::from_bytes(&data[..R::LEN]) {
            Ok(record) => apply(&self.state, record),
            Err(ProtocolError::InvalidValue { field, value }) => {
                warn!(register = R::NAME, field, value, "rejected write");
            }
            Err(err) => warn!(register = R::NAME, %err, "rejected write"),
        }
    }

    fn handle_write(&mut self, reg: Register, data: &[u8]) {
        match reg {
            Register::Drive => self.commit::<DriveCommand>(data, |state, cmd| {
                state.regs.masked(|r| {
                    r.drive_cmd = cmd;
                    // The final byte of a DRIVE write opens a fresh
                    // validity window and releases a latched brake.
                    r.last_drive_write = Some(Instant::now());
                    r.brake_latched = false;
                });
            }),
            Register::Elev => self.commit::<ElevCommand>(data, |state, cmd| {
                state.regs.masked(|r| r.elev_cmd = cmd);
            }),
            Register::Grip => self.commit::<GripCommand>(data, |state, cmd| {
                state.regs.masked(|r| r.grip_cmd = cmd);
            }),
            Register::Brake => {
                // Latches on any write, independent of the timeout window.
                self.commit::<BrakeCommand>(data, |state, _cmd| {
                    state.regs.masked(|r| r.brake_latched = true);
                });
            }
            Register::Home => {
                if data.is_empty() {
                    return;
                }
                let grip_zero = self.state.regs.masked(|r| {
                    r.state = StateId::Homing;
                    r.grip_cfg.enc_zero
                });
                self.state.encoders.home_lift();
                self.state.encoders.preset_grip(grip_zero as i32);
            }
            Register::Seq => {
                if data.is_empty() {
                    return;
                }
                self.state.regs.masked(|r| {
                    r.seq_ack = r.seq_ack.wrapping_add(1);
                    r.validate_configs();
                });
            }
            Register::CfgLine => self.commit::<LineConfig>(data, |state, cfg| {
                state.regs.masked(|r| r.line_cfg = cfg);
            }),
            Register::CfgLift => self.commit::<LiftConfig>(data, |state, cfg| {
                state.regs.masked(|r| {
                    r.lift_cfg = cfg;
                    r.validate_configs();
                });
            }),
            Register::CfgGrip => self.commit::<GripConfig>(data, |state, cfg| {
                state.regs.masked(|r| {
                    r.grip_cfg = cfg;
                    r.validate_configs();
                });
            }),
            Register::CfgOdo => self.commit::<OdoConfig>(data, |state, cfg| {
                state.regs.masked(|r| {
                    r.odo_cfg = cfg;
                    r.validate_configs();
                });
            }),
            // Telemetry registers are read-only; writes are tolerated
            // silently.
            _ => trace!(register = ?reg, "write to read-only register ignored"),
        }
    }

    /// Synthesize the telemetry record for `reg` from live state.
    /// Non-telemetry and unknown addresses answer a single zero byte so
    /// forward-compatible masters can probe unused registers.
    fn synthesize(&mut self, reg: Option<Register>) -> Vec<u8> {
        let enc = self.state.encoders.snapshot();
        match reg {
            Some(Register::Status0) => self.state.regs.masked(|r| {
                Status0 {
                    state: r.state,
                    seq_ack: r.seq_ack,
                    err_flags: r.err_flags,
                }
                .to_bytes()
            }),
            Some(Register::Status1) => self.state.regs.masked(|r| {
                Status1 {
                    elev_mm: r.lift_cfg.count_to_mm(enc.lift),
                    grip_deg: r.grip_cfg.count_to_deg(enc.grip),
                }
                .to_bytes()
            }),
            Some(Register::Lines) => {
                let mut sensors = self.sensors.lock();
                let (left, right) = (sensors.line_left(), sensors.line_right());
                drop(sensors);
                let threshold = self.state.regs.masked(|r| r.line_cfg.threshold);
                Lines {
                    left,
                    right,
                    threshold,
                }
                .to_bytes()
            }
            Some(Register::Power) => {
                let mut sensors = self.sensors.lock();
                let vbatt_mv = sensors.vbatt_mv();
                let estop = sensors.estop_engaged();
                Power {
                    vbatt_mv,
                    mps: !estop as u8,
                    estop: estop as u8,
                }
                .to_bytes()
            }
            Some(Register::DriveFb) => self.state.regs.masked(|r| r.drive_fb.to_bytes()),
            Some(Register::AuxFb) => self.state.regs.masked(|r| r.aux_fb.to_bytes()),
            Some(Register::Sens) => SensReadout {
                grip_enc: enc.grip as i16,
                lift_enc: enc.lift as i16,
            }
            .to_bytes(),
            Some(Register::Odom) => Odometry {
                left: enc.odo_left,
                right: enc.odo_right,
            }
            .to_bytes(),
            _ => vec![0],
        }
    }
}

impl stacker_bus::I2cSlave for RegisterTransport {
    fn on_receive(&mut self, bytes: &[u8]) {
        // Malformed zero-length writes carry no register pointer.
        let Some((&start, data)) = bytes.split_first() else {
            return;
        };
        self.reg_ptr = start;
        if data.is_empty() {
            // Pointer-only write: read setup, nothing to commit.
            return;
        }
        match Register::try_from(start) {
            Ok(reg) => self.handle_write(reg, data),
            Err(_) => trace!(addr = start, "write to unknown register ignored"),
        }
    }

    fn on_request(&mut self, buf: &mut [u8]) -> usize {
        let bytes = self.synthesize(Register::try_from(self.reg_ptr).ok());
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        n
    }
}
