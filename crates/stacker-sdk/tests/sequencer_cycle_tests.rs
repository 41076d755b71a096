//! 取放循环全栈验证
//!
//! 序列机 + 链路 + 运动节点在 mock 总线上协同：颜色决定货架层高，
//! Place 步骤以刹车收尾，下一轮 Pick 解除刹车。

use parking_lot::Mutex;
use stacker_bus::MockBus;
use stacker_icd::{NODE_I2C_ADDR, StateId};
use stacker_node::{BenchActuators, BenchSensors, DriveModel, MotionNode};
use stacker_sdk::{ColorId, ColorSensor, I2cLink, SeqStep, Sequencer, ShelfMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct ScriptedCamera(ColorId);

impl ColorSensor for ScriptedCamera {
    fn detect_color(&mut self) -> ColorId {
        self.0
    }
}

fn rig(
    color: ColorId,
    shelf: ShelfMap,
) -> (MotionNode, Sequencer<MockBus, ScriptedCamera>) {
    let node = MotionNode::new(
        DriveModel::Differential,
        BenchSensors::new(),
        BenchActuators::new(),
    );
    let bus = MockBus::new(NODE_I2C_ADDR, Arc::new(Mutex::new(node.transport())));
    let mut link = I2cLink::new(bus);
    link.init().unwrap();
    (node, Sequencer::new(link, ScriptedCamera(color), shelf))
}

#[test]
fn place_height_follows_shelf_row() {
    // 蓝色映射到顶层：Place 升降目标 260 mm
    let shelf = ShelfMap::new([
        [ColorId::None; 3],
        [ColorId::None; 3],
        [ColorId::Blue, ColorId::None, ColorId::None],
    ]);
    let (mut node, mut seq) = rig(ColorId::Blue, shelf);
    let t0 = Instant::now();

    for ms in [0u64, 600, 1400, 2200] {
        let t = t0 + Duration::from_millis(ms);
        seq.tick(t);
        node.tick(t + Duration::from_millis(5));
    }

    assert_eq!(seq.step(), SeqStep::Place);
    node.state().regs.masked(|r| {
        assert_eq!(r.elev_cmd.height_mm, 260);
        assert!(r.brake_latched);
    });
    // 刹车锁存后节点进入 Brake 并全轴回中
    assert_eq!(seq.link_mut().status0().unwrap().state, StateId::Brake);
    assert_eq!(
        seq.link_mut().drive_feedback().unwrap().wheel_us,
        [1500, 1500, 0, 0]
    );
}

#[test]
fn next_pick_releases_place_brake() {
    let (mut node, mut seq) = rig(ColorId::Red, ShelfMap::default());
    let t0 = Instant::now();

    for ms in [0u64, 600, 1400, 2200, 2650] {
        let t = t0 + Duration::from_millis(ms);
        seq.tick(t);
        node.tick(t + Duration::from_millis(5));
    }

    assert_eq!(seq.step(), SeqStep::Pick);
    assert_eq!(seq.cycles(), 1);
    // 新一轮 Pick 的 DRIVE 写入解除刹车，节点恢复行驶
    assert_eq!(seq.link_mut().status0().unwrap().state, StateId::Drive);
}

#[test]
fn seq_ack_counts_every_committed_step() {
    let (mut node, mut seq) = rig(ColorId::Green, ShelfMap::default());
    let t0 = Instant::now();

    for ms in [0u64, 600, 1400, 2200] {
        let t = t0 + Duration::from_millis(ms);
        seq.tick(t);
        node.tick(t + Duration::from_millis(5));
    }

    // Init/Pick/GoPlace/Place 各提交一次 SEQ
    assert_eq!(seq.link_mut().status0().unwrap().seq_ack, 4);
}
