//! 安全链路场景验证
//!
//! BRAKE 锁存、急停、标定失效与低电压告警在寄存器接口两侧的可见行为。

use parking_lot::Mutex;
use stacker_bus::MockBus;
use stacker_icd::{ErrFlags, LiftConfig, NODE_I2C_ADDR, StateId};
use stacker_node::{BenchActuators, BenchSensors, DriveModel, MotionNode, ServoChannel};
use stacker_sdk::I2cLink;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn rig() -> (MotionNode, BenchSensors, BenchActuators, I2cLink<MockBus>) {
    let sensors = BenchSensors::new();
    let actuators = BenchActuators::new();
    let node = MotionNode::new(DriveModel::Differential, sensors.clone(), actuators.clone());
    let bus = MockBus::new(NODE_I2C_ADDR, Arc::new(Mutex::new(node.transport())));
    let mut link = I2cLink::new(bus);
    link.init().unwrap();
    (node, sensors, actuators, link)
}

#[test]
fn brake_latches_until_next_drive() {
    let (mut node, _sensors, actuators, mut link) = rig();
    let t0 = Instant::now();

    link.drive(300, 0, 0, 1000).unwrap();
    node.tick(t0 + Duration::from_millis(10));
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1725));

    // BRAKE 写入立即锁存，与命令窗口无关
    link.brake(true).unwrap();
    node.tick(t0 + Duration::from_millis(20));
    assert_eq!(link.status0().unwrap().state, StateId::Brake);
    assert_eq!(link.drive_feedback().unwrap().wheel_us, [1500, 1500, 0, 0]);
    let aux = link.aux_feedback().unwrap();
    assert_eq!((aux.lift_us, aux.grip_us), (1500, 1500));

    // 下一次完整 DRIVE 写入解除锁存
    link.drive(300, 0, 0, 1000).unwrap();
    node.tick(t0 + Duration::from_millis(30));
    assert_eq!(link.status0().unwrap().state, StateId::Drive);
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1725));
}

#[test]
fn estop_overrides_everything_while_engaged() {
    let (mut node, sensors, actuators, mut link) = rig();
    let t0 = Instant::now();

    link.drive(300, 0, 0, 1000).unwrap();
    sensors.set_estop(true);
    node.tick(t0 + Duration::from_millis(10));

    let s0 = link.status0().unwrap();
    assert_eq!(s0.state, StateId::Brake);
    assert!(s0.err_flags.contains(ErrFlags::ESTOP));
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1500));
    assert_eq!(link.power().unwrap().estop, 1);

    // 松开急停：命令窗口仍有效，运动恢复
    sensors.set_estop(false);
    node.tick(t0 + Duration::from_millis(20));
    let s0 = link.status0().unwrap();
    assert_eq!(s0.state, StateId::Drive);
    assert!(!s0.err_flags.contains(ErrFlags::ESTOP));
}

#[test]
fn zero_scale_lift_config_disables_axis() {
    let (mut node, _sensors, _actuators, mut link) = rig();
    let t0 = Instant::now();

    link.set_lift_config(&LiftConfig {
        enc_per_mm: 0,
        h1_mm: 100,
        h2_mm: 180,
        h3_mm: 260,
    })
    .unwrap();
    link.commit_seq().unwrap();
    link.elev(200, 0, stacker_icd::ElevMode::Position).unwrap();
    node.tick(t0 + Duration::from_millis(10));

    let s0 = link.status0().unwrap();
    assert!(s0.err_flags.contains(ErrFlags::CFG));
    assert!(s0.err_flags.contains(ErrFlags::LIFT_STALL));
    // 失效轴钉在中位
    assert_eq!(link.aux_feedback().unwrap().lift_us, 1500);
}

#[test]
fn low_battery_is_reported_not_enforced() {
    let (mut node, sensors, actuators, mut link) = rig();
    let t0 = Instant::now();

    sensors.set_vbatt_mv(6200);
    link.drive(200, 0, 0, 1000).unwrap();
    node.tick(t0 + Duration::from_millis(10));

    let s0 = link.status0().unwrap();
    assert!(s0.err_flags.contains(ErrFlags::WARN_LOW_BATT));
    assert_eq!(s0.state, StateId::Drive);
    assert_eq!(link.power().unwrap().vbatt_mv, 6200);
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1650));
}
