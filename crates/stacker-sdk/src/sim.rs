//! 进程内模拟台架：一个运动节点挂在 mock 总线上。
//!
//! 供 CLI demo 与下游集成测试使用，无任何硬件依赖。传感器与执行器
//! 两侧都留有可克隆句柄，测试脚本可以随时注入急停/电压并观察脉宽。

use parking_lot::Mutex;
use stacker_bus::MockBus;
use stacker_icd::NODE_I2C_ADDR;
use stacker_link::I2cLink;
use stacker_node::{BenchActuators, BenchSensors, DriveModel, MotionNode};
use std::sync::Arc;

/// 节点侧的模拟台架
pub struct SimRig {
    pub node: MotionNode,
    pub sensors: BenchSensors,
    pub actuators: BenchActuators,
}

impl SimRig {
    /// 搭建台架并返回已接好 mock 总线的主机侧链路（未 `init()`）。
    pub fn new(model: DriveModel) -> (Self, I2cLink<MockBus>) {
        let sensors = BenchSensors::new();
        let actuators = BenchActuators::new();
        let node = MotionNode::new(model, sensors.clone(), actuators.clone());
        let transport = node.transport();
        let bus = MockBus::new(NODE_I2C_ADDR, Arc::new(Mutex::new(transport)));
        let link = I2cLink::new(bus);
        (
            Self {
                node,
                sensors,
                actuators,
            },
            link,
        )
    }
}
