//! Shared register-backed state of the motion node.
//!
//! One [`RegBank`] holds everything both the register transport and the
//! control loop touch: the latest committed commands, calibration configs,
//! the safety state and the actuation feedback mirrors. It lives behind an
//! [`IrqCell`] inside [`NodeState`]; the encoder counters have their own
//! cell so telemetry reads do not serialize against edge interrupts longer
//! than necessary.

use crate::{EncoderBank, IrqCell};
use stacker_icd::{
    AuxFeedback, DriveCommand, DriveFeedback, ElevCommand, ErrFlags, GripCommand, GripConfig,
    LiftConfig, LineConfig, OdoConfig, StateId,
};
use std::time::Instant;

/// Register-backed node state, owned exclusively by the transport for
/// writes and read by the controller every tick.
#[derive(Debug, Clone)]
pub struct RegBank {
    // Latest committed commands. A command only becomes visible here once
    // its final byte arrived on the bus.
    pub drive_cmd: DriveCommand,
    pub elev_cmd: ElevCommand,
    pub grip_cmd: GripCommand,

    /// Stamped when the last byte of a DRIVE write commits.
    pub last_drive_write: Option<Instant>,
    /// Set by any BRAKE write, cleared by the next committed DRIVE.
    pub brake_latched: bool,

    pub seq_ack: u8,
    pub state: StateId,
    pub err_flags: ErrFlags,

    pub line_cfg: LineConfig,
    pub lift_cfg: LiftConfig,
    pub grip_cfg: GripConfig,
    pub odo_cfg: OdoConfig,

    // Actuation mirrors, refreshed by the controller and served verbatim
    // by DRIVEFB/AUXFB reads.
    pub drive_fb: DriveFeedback,
    pub aux_fb: AuxFeedback,
}

impl Default for RegBank {
    fn default() -> Self {
        Self {
            drive_cmd: DriveCommand::default(),
            elev_cmd: ElevCommand::default(),
            grip_cmd: GripCommand::default(),
            last_drive_write: None,
            brake_latched: false,
            seq_ack: 0,
            state: StateId::Boot,
            err_flags: ErrFlags::default(),
            line_cfg: LineConfig::default(),
            lift_cfg: LiftConfig::default(),
            grip_cfg: GripConfig::default(),
            odo_cfg: OdoConfig::default(),
            drive_fb: DriveFeedback {
                wheel_us: [stacker_icd::SERVO_US_NEUTRAL, stacker_icd::SERVO_US_NEUTRAL, 0, 0],
            },
            aux_fb: AuxFeedback::default(),
        }
    }
}

impl RegBank {
    /// Re-validate every calibration config and refresh the derived error
    /// bits. Bits owned by the tick (pose clamping) are re-evaluated there.
    pub fn validate_configs(&mut self) {
        let cfg_bits =
            self.lift_cfg.validate() | self.grip_cfg.validate() | self.odo_cfg.validate();
        self.err_flags
            .clear(ErrFlags::CFG | ErrFlags::LIFT_STALL | ErrFlags::GRIP_RANGE);
        self.err_flags.set(cfg_bits);
    }
}

/// Everything the transport and controller share.
#[derive(Default)]
pub struct NodeState {
    pub regs: IrqCell<RegBank>,
    pub encoders: EncoderBank,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_configs_sets_and_clears() {
        let mut bank = RegBank::default();
        bank.validate_configs();
        assert!(bank.err_flags.is_empty());

        bank.lift_cfg.enc_per_mm = 0;
        bank.validate_configs();
        assert!(bank.err_flags.contains(ErrFlags::CFG));
        assert!(bank.err_flags.contains(ErrFlags::LIFT_STALL));

        bank.lift_cfg.enc_per_mm = 5;
        bank.validate_configs();
        assert!(bank.err_flags.is_empty());
    }
}
