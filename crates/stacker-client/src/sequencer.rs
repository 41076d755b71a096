//! The pick-and-place cycle sequencer.
//!
//! A small open-loop behavior machine: each step issues its register writes
//! on entry, dwells for a fixed interval while the node executes, then
//! advances. Progress is committed to the node's SEQ register after every
//! step so STATUS0 telemetry exposes the cycle count.
//!
//! Link supervision: any failed transaction disables automation on the
//! spot. A disabled sequencer pings the node every two seconds, and once
//! the node answers again the in-flight cycle is abandoned and the machine
//! restarts at [`SeqStep::Pick`].

use crate::color::{ColorId, ColorSensor};
use crate::shelf::ShelfMap;
use stacker_bus::I2cMaster;
use stacker_icd::{ElevMode, GripMode};
use stacker_link::{I2cLink, LinkError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Cruise speed between stations (mm/s).
const TRANSIT_V_MM_S: i16 = 200;
/// Lift height for carrying a picked part (mm).
const CARRY_HEIGHT_MM: i16 = 120;
/// Re-ping cadence while automation is disabled.
const REPING_INTERVAL: Duration = Duration::from_secs(2);

/// Steps of one pick-and-place cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqStep {
    /// Home both axes once at startup.
    Init,
    /// Drive to the pickup station, grab and lift a part.
    Pick,
    /// Drive to the shelf with the part held.
    GoPlace,
    /// Lift to the part's shelf row, release, brake.
    Place,
}

impl SeqStep {
    fn dwell(self) -> Duration {
        let ms = match self {
            SeqStep::Init => 600,
            SeqStep::Pick => 800,
            SeqStep::GoPlace => 800,
            SeqStep::Place => 450,
        };
        Duration::from_millis(ms)
    }

    fn next(self) -> SeqStep {
        match self {
            SeqStep::Init => SeqStep::Pick,
            SeqStep::Pick => SeqStep::GoPlace,
            SeqStep::GoPlace => SeqStep::Place,
            SeqStep::Place => SeqStep::Pick,
        }
    }
}

/// Owns the link and runs cycles until told otherwise.
pub struct Sequencer<B: I2cMaster, C: ColorSensor> {
    link: I2cLink<B>,
    color: C,
    shelf: ShelfMap,
    step: SeqStep,
    entered_at: Option<Instant>,
    carried: ColorId,
    enabled: bool,
    last_ping: Option<Instant>,
    cycles: u64,
}

impl<B: I2cMaster, C: ColorSensor> Sequencer<B, C> {
    pub fn new(link: I2cLink<B>, color: C, shelf: ShelfMap) -> Self {
        Self {
            link,
            color,
            shelf,
            step: SeqStep::Init,
            entered_at: None,
            carried: ColorId::None,
            enabled: true,
            last_ping: None,
            cycles: 0,
        }
    }

    pub fn step(&self) -> SeqStep {
        self.step
    }

    /// Completed place operations since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn link_mut(&mut self) -> &mut I2cLink<B> {
        &mut self.link
    }

    /// Advance the machine. Call at the control rate; the sequencer does
    /// its own dwell timing and never blocks.
    pub fn tick(&mut self, now: Instant) {
        if !self.enabled {
            self.try_recover(now);
            return;
        }

        if let Some(entered) = self.entered_at {
            if now.duration_since(entered) < self.step.dwell() {
                return;
            }
            if self.step == SeqStep::Place {
                self.cycles += 1;
            }
            self.step = self.step.next();
            self.entered_at = None;
        }

        match self.enter(now) {
            Ok(()) => self.entered_at = Some(now),
            Err(err) => self.disable(now, err),
        }
    }

    /// Issue this step's commands. Any error abandons the cycle.
    fn enter(&mut self, _now: Instant) -> Result<(), LinkError> {
        debug!(step = ?self.step, "entering");
        match self.step {
            SeqStep::Init => {
                self.link.home()?;
            }
            SeqStep::Pick => {
                self.link.drive(TRANSIT_V_MM_S, 0, 0, 500)?;
                self.carried = self.color.detect_color();
                debug!(color = ?self.carried, "picked part");
                self.link.grip(GripMode::Close, 0)?;
                self.link.elev(CARRY_HEIGHT_MM, 0, ElevMode::Position)?;
            }
            SeqStep::GoPlace => {
                self.link.drive(TRANSIT_V_MM_S, 0, 0, 800)?;
            }
            SeqStep::Place => {
                let height = self.shelf.height_for(self.carried);
                self.link.elev(height, 0, ElevMode::Position)?;
                self.link.grip(GripMode::Open, 0)?;
                self.link.brake(true)?;
            }
        }
        self.link.commit_seq()
    }

    fn disable(&mut self, now: Instant, err: LinkError) {
        warn!(%err, step = ?self.step, "link failed, automation disabled");
        self.enabled = false;
        self.entered_at = None;
        self.last_ping = Some(now);
    }

    /// Re-ping on a fixed cadence; on answer, restart at Pick.
    fn try_recover(&mut self, now: Instant) {
        let due = self
            .last_ping
            .is_none_or(|t| now.duration_since(t) >= REPING_INTERVAL);
        if !due {
            return;
        }
        self.last_ping = Some(now);
        if self.link.ping().is_ok() {
            info!("node answered, automation resumed at Pick");
            self.enabled = true;
            self.step = SeqStep::Pick;
            self.entered_at = None;
            self.carried = ColorId::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use stacker_bus::{BusError, MockBus};
    use stacker_icd::NODE_I2C_ADDR;
    use stacker_node::{NodeState, RegisterTransport, Sensors};
    use std::sync::Arc;

    struct FixedSensors;

    impl Sensors for FixedSensors {
        fn line_left(&mut self) -> u16 {
            0
        }
        fn line_right(&mut self) -> u16 {
            0
        }
        fn vbatt_mv(&mut self) -> u16 {
            7400
        }
        fn estop_engaged(&mut self) -> bool {
            false
        }
    }

    struct ScriptedCamera(ColorId);

    impl ColorSensor for ScriptedCamera {
        fn detect_color(&mut self) -> ColorId {
            self.0
        }
    }

    fn rig(color: ColorId, shelf: ShelfMap) -> (Sequencer<MockBus, ScriptedCamera>, Arc<NodeState>) {
        let state = Arc::new(NodeState::default());
        let sensors: Arc<Mutex<dyn Sensors>> = Arc::new(Mutex::new(FixedSensors));
        let transport = RegisterTransport::new(state.clone(), sensors);
        let bus = MockBus::new(NODE_I2C_ADDR, Arc::new(Mutex::new(transport)));
        let mut link = I2cLink::new(bus);
        link.init().unwrap();
        (Sequencer::new(link, ScriptedCamera(color), shelf), state)
    }

    #[test]
    fn full_cycle_places_at_color_row() {
        let (mut seq, state) = rig(ColorId::Red, ShelfMap::default());
        let t0 = Instant::now();

        // Init: homing commanded, one SEQ commit.
        seq.tick(t0);
        assert_eq!(seq.step(), SeqStep::Init);
        state.regs.masked(|r| {
            assert_eq!(r.state, stacker_icd::StateId::Homing);
            assert_eq!(r.seq_ack, 1);
        });

        // Pick after the init dwell: carry lift + closed grip.
        seq.tick(t0 + Duration::from_millis(600));
        assert_eq!(seq.step(), SeqStep::Pick);
        state.regs.masked(|r| {
            assert_eq!(r.drive_cmd.vx_mm_s, 200);
            assert_eq!(r.grip_cmd.mode, GripMode::Close);
            assert_eq!(r.elev_cmd.height_mm, 120);
            assert_eq!(r.seq_ack, 2);
        });

        seq.tick(t0 + Duration::from_millis(1400));
        assert_eq!(seq.step(), SeqStep::GoPlace);

        // Place: Red sits on the middle row, 180 mm, then release and brake.
        seq.tick(t0 + Duration::from_millis(2200));
        assert_eq!(seq.step(), SeqStep::Place);
        state.regs.masked(|r| {
            assert_eq!(r.elev_cmd.height_mm, 180);
            assert_eq!(r.grip_cmd.mode, GripMode::Open);
            assert!(r.brake_latched);
            assert_eq!(r.seq_ack, 4);
        });

        // Cycle complete; the next pick's DRIVE write releases the brake.
        seq.tick(t0 + Duration::from_millis(2650));
        assert_eq!(seq.step(), SeqStep::Pick);
        assert_eq!(seq.cycles(), 1);
        state.regs.masked(|r| assert!(!r.brake_latched));
    }

    #[test]
    fn top_row_color_places_at_260mm() {
        let shelf = ShelfMap::new([
            [ColorId::None; 3],
            [ColorId::None; 3],
            [ColorId::Blue, ColorId::None, ColorId::None],
        ]);
        let (mut seq, state) = rig(ColorId::Blue, shelf);
        let t0 = Instant::now();

        seq.tick(t0);
        seq.tick(t0 + Duration::from_millis(600));
        seq.tick(t0 + Duration::from_millis(1400));
        seq.tick(t0 + Duration::from_millis(2200));
        assert_eq!(seq.step(), SeqStep::Place);
        state.regs.masked(|r| assert_eq!(r.elev_cmd.height_mm, 260));
    }

    #[test]
    fn dwell_times_gate_transitions() {
        let (mut seq, _state) = rig(ColorId::Green, ShelfMap::default());
        let t0 = Instant::now();

        seq.tick(t0);
        // Still inside the init dwell: no transition, no extra commands.
        seq.tick(t0 + Duration::from_millis(300));
        assert_eq!(seq.step(), SeqStep::Init);
        seq.tick(t0 + Duration::from_millis(600));
        assert_eq!(seq.step(), SeqStep::Pick);
    }

    #[test]
    fn link_failure_disables_automation() {
        let (mut seq, state) = rig(ColorId::Red, ShelfMap::default());
        let t0 = Instant::now();
        seq.tick(t0);

        // The Pick entry's first transaction fails.
        seq.link_mut().bus_mut().fail_next(BusError::Timeout);
        seq.tick(t0 + Duration::from_millis(600));
        assert!(!seq.is_enabled());

        // Disabled: no commands flow, and re-ping waits out its cadence.
        let attempts = seq.link_mut().bus_mut().clock_log().len();
        seq.tick(t0 + Duration::from_millis(700));
        assert_eq!(seq.link_mut().bus_mut().clock_log().len(), attempts);

        // Two seconds later the re-ping lands on a healthy bus.
        seq.tick(t0 + Duration::from_millis(2700));
        assert!(seq.is_enabled());
        assert_eq!(seq.step(), SeqStep::Pick);

        // Next tick restarts the cycle at Pick.
        let before = state.regs.masked(|r| r.seq_ack);
        seq.tick(t0 + Duration::from_millis(2800));
        state.regs.masked(|r| {
            assert_eq!(r.seq_ack, before.wrapping_add(1));
            assert_eq!(r.drive_cmd.vx_mm_s, 200);
        });
    }
}
