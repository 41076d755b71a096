//! 命令超时收敛验证
//!
//! DRIVE 命令只在自身有效窗口内驱动轮子；窗口过期后节点必须自动回中
//! 并上报 TIMEOUT，新的 DRIVE 写入则立即恢复运动并清除标志。

use parking_lot::Mutex;
use stacker_bus::MockBus;
use stacker_icd::{ErrFlags, NODE_I2C_ADDR, StateId};
use stacker_node::{BenchActuators, BenchSensors, DriveModel, MotionNode, ServoChannel};
use stacker_sdk::I2cLink;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn rig() -> (MotionNode, BenchActuators, I2cLink<MockBus>) {
    let sensors = BenchSensors::new();
    let actuators = BenchActuators::new();
    let node = MotionNode::new(DriveModel::Differential, sensors, actuators.clone());
    let bus = MockBus::new(NODE_I2C_ADDR, Arc::new(Mutex::new(node.transport())));
    let mut link = I2cLink::new(bus);
    link.init().unwrap();
    (node, actuators, link)
}

#[test]
fn drive_stops_when_hold_window_expires() {
    let (mut node, actuators, mut link) = rig();
    let t0 = Instant::now();

    link.drive(300, 0, 0, 100).unwrap();
    node.tick(t0 + Duration::from_millis(10));
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1725));
    assert_eq!(link.status0().unwrap().state, StateId::Drive);

    // 窗口过期：回中 + TIMEOUT，遥测与执行器一致
    node.tick(t0 + Duration::from_millis(150));
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1500));
    let s0 = link.status0().unwrap();
    assert_eq!(s0.state, StateId::Idle);
    assert!(s0.err_flags.contains(ErrFlags::TIMEOUT));
    assert_eq!(link.drive_feedback().unwrap().wheel_us, [1500, 1500, 0, 0]);
}

#[test]
fn fresh_drive_clears_timeout() {
    let (mut node, actuators, mut link) = rig();
    let t0 = Instant::now();

    link.drive(300, 0, 0, 100).unwrap();
    node.tick(t0 + Duration::from_millis(200));
    assert!(
        link.status0()
            .unwrap()
            .err_flags
            .contains(ErrFlags::TIMEOUT)
    );

    // 新命令落地即恢复
    link.drive(-200, 0, 0, 100).unwrap();
    node.tick(t0 + Duration::from_millis(210));
    let s0 = link.status0().unwrap();
    assert_eq!(s0.state, StateId::Drive);
    assert!(!s0.err_flags.contains(ErrFlags::TIMEOUT));
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1350));
}

#[test]
fn lift_keeps_holding_through_drive_timeout() {
    let (mut node, actuators, mut link) = rig();
    let t0 = Instant::now();

    link.drive(200, 0, 0, 100).unwrap();
    link.elev(40, 0, stacker_icd::ElevMode::Position).unwrap();
    node.tick(t0 + Duration::from_millis(500));

    // 轮子超时回中，升降仍按位置环保持
    assert_eq!(actuators.last_us(ServoChannel::DriveFl), Some(1500));
    assert_eq!(actuators.last_us(ServoChannel::Lift), Some(1620));
}
