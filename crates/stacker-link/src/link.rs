//! Master-side register link over an [`I2cMaster`].
//!
//! The link wraps every bus transaction with the fallback-clock hysteresis:
//! any failed transaction drops the bus to the fallback clock before the
//! next attempt, and the first success at either clock restores the primary.
//! The node's own pull-ups are weak enough that a marginal harness often
//! recovers at 100 kHz, so the downshift is worth one transaction of latency.
//!
//! Error logging is edge-triggered per register: a register that keeps
//! failing the same way logs once, and logs again on recovery or when the
//! failure changes shape. [`I2cLink::diagnostics`] always carries the latest.

use crate::error::LinkError;
use stacker_bus::I2cMaster;
use stacker_icd::{
    AuxFeedback, BrakeCommand, DriveCommand, DriveFeedback, ElevCommand, ElevMode, GripCommand,
    GripConfig, GripMode, HOME_GRIP, HOME_LIFT, HomeCommand, LiftConfig, LineConfig, Lines,
    NODE_I2C_ADDR, OdoConfig, Odometry, Power, Record, SensReadout, SeqCommit, Status0, Status1,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Build-default primary bus clock.
pub const PRIMARY_HZ_DEFAULT: u32 = 400_000;
/// Build-default fallback bus clock.
pub const FALLBACK_HZ_DEFAULT: u32 = 100_000;

const MIN_HZ: u32 = 10_000;
const MAX_HZ: u32 = 1_000_000;

/// Snapshot of the link's health, safe to log or ship over telemetry.
#[derive(Debug, Clone)]
pub struct LinkDiagnostics {
    pub ready: bool,
    pub on_fallback: bool,
    pub current_hz: u32,
    pub primary_hz: u32,
    pub fallback_hz: u32,
    pub last_ping_error: Option<LinkError>,
    /// Registers currently in a failed state, with their latest error.
    pub register_errors: Vec<(&'static str, LinkError)>,
}

/// Register link to one motion node.
///
/// Owns the bus and all link state; single-threaded by construction, callers
/// share it behind their own lock if they must.
pub struct I2cLink<B: I2cMaster> {
    bus: B,
    addr: u8,
    ready: bool,
    primary_hz: u32,
    fallback_hz: u32,
    on_fallback: bool,
    last_ping_error: Option<LinkError>,
    register_errors: HashMap<&'static str, LinkError>,
}

impl<B: I2cMaster> I2cLink<B> {
    /// Link to the motion node at its well-known address.
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, NODE_I2C_ADDR)
    }

    pub fn with_address(bus: B, addr: u8) -> Self {
        Self {
            bus,
            addr,
            ready: false,
            primary_hz: PRIMARY_HZ_DEFAULT,
            fallback_hz: FALLBACK_HZ_DEFAULT,
            on_fallback: false,
            last_ping_error: None,
            register_errors: HashMap::new(),
        }
    }

    /// Set the primary clock and probe the node once.
    pub fn init(&mut self) -> Result<(), LinkError> {
        self.on_fallback = false;
        self.bus.set_clock(self.primary_hz);
        debug!(addr = format_args!("0x{:02X}", self.addr), hz = self.primary_hz, "link init");
        self.ping()
    }

    /// Empty-write probe. A successful ping (re)arms the link.
    pub fn ping(&mut self) -> Result<(), LinkError> {
        match self.bus.probe(self.addr) {
            Ok(()) => {
                self.note_success();
                if !self.ready {
                    info!(addr = format_args!("0x{:02X}", self.addr), "node answered, link ready");
                }
                self.ready = true;
                if self.last_ping_error.take().is_some() {
                    info!("ping recovered");
                }
                Ok(())
            }
            Err(e) => {
                self.note_failure();
                let err = LinkError::Bus(e);
                if self.last_ping_error.as_ref() != Some(&err) {
                    warn!(%err, "ping failed");
                }
                self.last_ping_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn diagnostics(&self) -> LinkDiagnostics {
        let mut register_errors: Vec<_> = self
            .register_errors
            .iter()
            .map(|(name, err)| (*name, err.clone()))
            .collect();
        register_errors.sort_by_key(|(name, _)| *name);
        LinkDiagnostics {
            ready: self.ready,
            on_fallback: self.on_fallback,
            current_hz: self.bus.clock(),
            primary_hz: self.primary_hz,
            fallback_hz: self.fallback_hz,
            last_ping_error: self.last_ping_error.clone(),
            register_errors,
        }
    }

    /// Replace the clock pair. Both must lie in 10 kHz..=1 MHz.
    pub fn configure_frequencies(
        &mut self,
        primary_hz: u32,
        fallback_hz: u32,
        apply_now: bool,
    ) -> Result<(), LinkError> {
        for hz in [primary_hz, fallback_hz] {
            if !(MIN_HZ..=MAX_HZ).contains(&hz) {
                return Err(LinkError::InvalidFrequency(hz));
            }
        }
        self.primary_hz = primary_hz;
        self.fallback_hz = fallback_hz;
        if apply_now {
            let hz = if self.on_fallback {
                self.fallback_hz
            } else {
                self.primary_hz
            };
            self.bus.set_clock(hz);
        }
        debug!(primary_hz, fallback_hz, apply_now, "bus clocks configured");
        Ok(())
    }

    /// Back to the build defaults.
    pub fn reset_frequencies(&mut self, apply_now: bool) {
        // Defaults are in range, the validation cannot fail.
        let _ = self.configure_frequencies(PRIMARY_HZ_DEFAULT, FALLBACK_HZ_DEFAULT, apply_now);
    }

    /// Read one register record.
    pub fn read<R: Record>(&mut self) -> Result<R, LinkError> {
        self.require_ready()?;
        let mut buf = vec![0u8; R::LEN];
        match self.bus.write_read(self.addr, R::ADDR, &mut buf) {
            Err(e) => {
                self.note_failure();
                Err(self.record_failure(R::NAME, LinkError::Bus(e)))
            }
            Ok(n) if n < R::LEN => {
                self.note_failure();
                Err(self.record_failure(
                    R::NAME,
                    LinkError::ShortRead {
                        register: R::NAME,
                        expected: R::LEN,
                        actual: n,
                    },
                ))
            }
            Ok(_) => {
                self.note_success();
                match R::from_bytes(&buf) {
                    Ok(record) => {
                        self.record_success(R::NAME);
                        Ok(record)
                    }
                    Err(e) => Err(self.record_failure(R::NAME, LinkError::Protocol(e))),
                }
            }
        }
    }

    /// Write one register record.
    pub fn write<R: Record>(&mut self, record: &R) -> Result<(), LinkError> {
        self.require_ready()?;
        let mut frame = Vec::with_capacity(1 + R::LEN);
        frame.push(R::ADDR);
        frame.extend_from_slice(&record.to_bytes());
        match self.bus.write(self.addr, &frame) {
            Ok(()) => {
                self.note_success();
                self.record_success(R::NAME);
                Ok(())
            }
            Err(e) => {
                self.note_failure();
                Err(self.record_failure(R::NAME, LinkError::Bus(e)))
            }
        }
    }

    /// Raw register write, escape hatch for bring-up tooling.
    pub fn write_raw(&mut self, reg: u8, bytes: &[u8]) -> Result<(), LinkError> {
        self.require_ready()?;
        let mut frame = Vec::with_capacity(1 + bytes.len());
        frame.push(reg);
        frame.extend_from_slice(bytes);
        match self.bus.write(self.addr, &frame) {
            Ok(()) => {
                self.note_success();
                Ok(())
            }
            Err(e) => {
                self.note_failure();
                Err(LinkError::Bus(e))
            }
        }
    }

    /// Direct access to the bus, for tests and bring-up tooling.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn require_ready(&self) -> Result<(), LinkError> {
        if self.ready {
            Ok(())
        } else {
            Err(LinkError::NotReady)
        }
    }

    /// A transaction failed: drop to the fallback clock for the next one.
    fn note_failure(&mut self) {
        if !self.on_fallback {
            self.on_fallback = true;
            self.bus.set_clock(self.fallback_hz);
            warn!(hz = self.fallback_hz, "bus transaction failed, switching to fallback clock");
        }
    }

    /// A transaction succeeded at either clock: restore the primary.
    fn note_success(&mut self) {
        if self.on_fallback {
            self.on_fallback = false;
            self.bus.set_clock(self.primary_hz);
            info!(hz = self.primary_hz, "bus recovered, primary clock restored");
        }
    }

    fn record_failure(&mut self, register: &'static str, err: LinkError) -> LinkError {
        if self.register_errors.get(register) != Some(&err) {
            warn!(register, %err, "register transaction failing");
        }
        self.register_errors.insert(register, err.clone());
        err
    }

    fn record_success(&mut self, register: &'static str) {
        if self.register_errors.remove(register).is_some() {
            info!(register, "register transaction recovered");
        }
    }
}

/// Typed command and telemetry surface, one method per ICD operation.
impl<B: I2cMaster> I2cLink<B> {
    pub fn drive(
        &mut self,
        vx_mm_s: i16,
        vy_mm_s: i16,
        wz_mrad_s: i16,
        hold_ms: u16,
    ) -> Result<(), LinkError> {
        self.write(&DriveCommand {
            vx_mm_s,
            vy_mm_s,
            wz_mrad_s,
            hold_ms,
        })
    }

    pub fn elev(
        &mut self,
        height_mm: i16,
        speed_mm_s: i16,
        mode: ElevMode,
    ) -> Result<(), LinkError> {
        self.write(&ElevCommand {
            height_mm,
            speed_mm_s,
            mode,
        })
    }

    pub fn grip(&mut self, mode: GripMode, pose_deg: i16) -> Result<(), LinkError> {
        self.write(&GripCommand { mode, pose_deg })
    }

    pub fn brake(&mut self, on: bool) -> Result<(), LinkError> {
        self.write(&BrakeCommand { on })
    }

    /// Home both axes.
    pub fn home(&mut self) -> Result<(), LinkError> {
        self.write(&HomeCommand {
            axes: HOME_LIFT | HOME_GRIP,
        })
    }

    /// Bump the node's cycle sequence number (also revalidates its configs).
    pub fn commit_seq(&mut self) -> Result<(), LinkError> {
        self.write(&SeqCommit { increment: 1 })
    }

    pub fn set_line_config(&mut self, cfg: &LineConfig) -> Result<(), LinkError> {
        self.write(cfg)
    }

    pub fn set_lift_config(&mut self, cfg: &LiftConfig) -> Result<(), LinkError> {
        self.write(cfg)
    }

    pub fn set_grip_config(&mut self, cfg: &GripConfig) -> Result<(), LinkError> {
        self.write(cfg)
    }

    pub fn set_odo_config(&mut self, cfg: &OdoConfig) -> Result<(), LinkError> {
        self.write(cfg)
    }

    pub fn status0(&mut self) -> Result<Status0, LinkError> {
        self.read()
    }

    pub fn status1(&mut self) -> Result<Status1, LinkError> {
        self.read()
    }

    pub fn lines(&mut self) -> Result<Lines, LinkError> {
        self.read()
    }

    pub fn power(&mut self) -> Result<Power, LinkError> {
        self.read()
    }

    pub fn drive_feedback(&mut self) -> Result<DriveFeedback, LinkError> {
        self.read()
    }

    pub fn aux_feedback(&mut self) -> Result<AuxFeedback, LinkError> {
        self.read()
    }

    pub fn sens(&mut self) -> Result<SensReadout, LinkError> {
        self.read()
    }

    pub fn odometry(&mut self) -> Result<Odometry, LinkError> {
        self.read()
    }
}
