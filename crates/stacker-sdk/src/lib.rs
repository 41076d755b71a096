//! Stacker SDK - 分拣小车控制核心
//!
//! 面向上位机应用的统一入口，分层架构从底层到高层：
//!
//! - **ICD 层** (`stacker_icd`): 寄存器协议的类型安全编解码
//! - **总线层** (`stacker_bus`): I2C 主/从两侧的硬件抽象
//! - **节点层** (`stacker_node`): 运动节点核心（编码器、闭环控制、安全联锁）
//! - **链路层** (`stacker_link`): 主机侧寄存器链路与降频滞回
//! - **行为层** (`stacker_client`): 货架映射与取放循环序列机
//!
//! # 快速开始
//!
//! ```rust,ignore
//! use stacker_sdk::{I2cLink, Sequencer, ShelfMap};
//!
//! let mut link = I2cLink::new(bus);
//! link.init()?;
//! let mut seq = Sequencer::new(link, camera, ShelfMap::default());
//! ```

pub use stacker_bus::{BusError, I2cMaster, I2cSlave};
pub use stacker_client::{ColorId, ColorSensor, ROW_HEIGHTS_MM, SeqStep, Sequencer, ShelfMap};
pub use stacker_icd::{
    self as icd, ErrFlags, NODE_I2C_ADDR, ProtocolError, Record, Register, StateId,
};
pub use stacker_link::{
    FALLBACK_HZ_DEFAULT, I2cLink, LinkDiagnostics, LinkError, PRIMARY_HZ_DEFAULT,
};
pub use stacker_node::{DriveModel, MotionNode};

#[cfg(feature = "mock")]
pub mod sim;

/// 初始化日志：`log` 桥接 + `RUST_LOG` 环境过滤，默认 `info`。
///
/// 幂等，重复调用只生效第一次。
pub fn init_logging() {
    let _ = tracing_log::LogTracer::init();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
