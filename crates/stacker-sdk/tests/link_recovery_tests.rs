//! 链路降频滞回端到端验证
//!
//! 任意失败事务后，下一次事务改用备用时钟；任一时钟下的成功事务
//! 立即恢复主时钟。诊断快照始终反映最新状态。

use parking_lot::Mutex;
use stacker_bus::{BusError, MockBus};
use stacker_icd::NODE_I2C_ADDR;
use stacker_node::{BenchActuators, BenchSensors, DriveModel, MotionNode};
use stacker_sdk::{I2cLink, LinkError};
use std::sync::Arc;

fn rig() -> (MotionNode, I2cLink<MockBus>) {
    let node = MotionNode::new(
        DriveModel::Differential,
        BenchSensors::new(),
        BenchActuators::new(),
    );
    let bus = MockBus::new(NODE_I2C_ADDR, Arc::new(Mutex::new(node.transport())));
    (node, I2cLink::new(bus))
}

#[test]
fn fallback_then_primary_restore() {
    let (_node, mut link) = rig();
    link.init().unwrap();

    link.bus_mut().fail_next(BusError::Timeout);
    assert!(link.status0().is_err());
    assert!(link.diagnostics().on_fallback);

    // 备用时钟下成功，主时钟恢复
    link.status0().unwrap();
    link.power().unwrap();
    let log = link.bus_mut().clock_log().to_vec();
    assert_eq!(log, vec![400_000, 400_000, 100_000, 400_000]);
    assert!(!link.diagnostics().on_fallback);
}

#[test]
fn diagnostics_track_latest_register_error() {
    let (_node, mut link) = rig();
    link.init().unwrap();

    link.bus_mut().fail_next(BusError::Nack {
        addr: NODE_I2C_ADDR,
    });
    assert!(link.odometry().is_err());
    let diag = link.diagnostics();
    assert_eq!(diag.register_errors.len(), 1);
    assert_eq!(diag.register_errors[0].0, "ODOM");

    link.odometry().unwrap();
    assert!(link.diagnostics().register_errors.is_empty());
}

#[test]
fn not_ready_until_first_successful_probe() {
    let (_node, mut link) = rig();
    assert_eq!(link.status0().unwrap_err(), LinkError::NotReady);
    link.ping().unwrap();
    link.status0().unwrap();
}
