//! # Stacker Bus Adapter Layer
//!
//! I2C 硬件抽象层，提供主机/从机两侧的统一接口抽象。
//!
//! 主机侧事务模型与寄存器指针协议一致：写事务为
//! `[寄存器地址, 数据...]`，读事务为先写寄存器地址（repeated start）
//! 再突发读取固定长度。从机侧回调与中断上下文语义一致：
//! `on_receive` / `on_request` 可能随时打断从机的主循环。

use std::fmt;
use thiserror::Error;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::MockBus;

/// 总线适配层统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// 从机无应答
    #[error("NACK from 0x{addr:02X}")]
    Nack { addr: u8 },

    /// 外设超时（总线被拉死等）
    #[error("Bus transaction timeout")]
    Timeout,

    /// 总线从未初始化
    #[error("Bus not started")]
    NotStarted,

    /// 后端特定错误
    #[error("Bus backend error: {0}")]
    Backend(String),
}

/// 主机侧 I2C 适配接口
///
/// 所有事务同步阻塞，不支持取消；卡死的事务由外设自身的超时兜底。
pub trait I2cMaster {
    /// 仅地址探测（空写事务），用于 ping
    fn probe(&mut self, addr: u8) -> Result<(), BusError>;

    /// 写事务：`bytes[0]` 为寄存器指针，其余为数据
    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), BusError>;

    /// 指针写 + 突发读事务，返回实际读到的字节数
    ///
    /// 短读（返回值小于 `buf.len()`）不是总线错误，由上层判定。
    fn write_read(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> Result<usize, BusError>;

    /// 重新配置总线时钟频率 (Hz)，立即对后续事务生效
    fn set_clock(&mut self, hz: u32);

    /// 当前总线时钟频率 (Hz)
    fn clock(&self) -> u32;
}

/// 从机侧回调接口，镜像 I2C 外设的接收/请求中断
///
/// 两个回调都可能打断从机主循环，实现方必须通过自身的临界区
/// 访问共享状态。
pub trait I2cSlave: Send {
    /// 总线送达一次写事务：首字节为寄存器指针，后续为数据。
    /// 零长度事务应被忽略。
    fn on_receive(&mut self, bytes: &[u8]);

    /// 总线请求一次读事务：按当前寄存器指针填充 `buf`，
    /// 返回实际填充的字节数。
    fn on_request(&mut self, buf: &mut [u8]) -> usize;
}

impl fmt::Debug for dyn I2cSlave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn I2cSlave")
    }
}
