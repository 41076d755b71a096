//! # Stacker ICD
//!
//! 双节点共享的寄存器映射协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `regs`: 寄存器地址与长度定义
//! - `command`: 命令寄存器编解码（主节点 → 运动节点）
//! - `telemetry`: 遥测寄存器编解码（运动节点 → 主节点）
//! - `config`: 标定配置寄存器编解码与校验
//! - `state`: 状态机 ID 与错误标志位
//!
//! ## 字节序
//!
//! 所有多字节整数均为小端（little-endian）。每个寄存器的字节布局
//! 固定宽度、地址稳定：客户端只需知道地址和长度即可独立编解码。

pub mod command;
pub mod config;
pub mod regs;
pub mod state;
pub mod telemetry;

// 重新导出常用类型
pub use command::*;
pub use config::*;
pub use regs::*;
pub use state::*;
pub use telemetry::*;

use thiserror::Error;

/// 舵机安全脉宽下限 (µs)
pub const SERVO_US_MIN: u16 = 1000;
/// 舵机中位脉宽 (µs)
pub const SERVO_US_NEUTRAL: u16 = 1500;
/// 舵机安全脉宽上限 (µs)
pub const SERVO_US_MAX: u16 = 2000;

/// 平台额定线速度包络 (mm/s)，vx/vy 共用
pub const MAX_V_MM_S: i16 = 400;
/// 平台额定角速度包络 (mrad/s)
pub const MAX_W_MRAD_S: i16 = 2000;

/// DRIVE 命令 `hold_ms == 0` 时的默认有效窗口 (ms)
pub const DEFAULT_HOLD_MS: u16 = 200;

/// 协议层统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 字节切片长度与寄存器固定宽度不符
    #[error("invalid length for {register}: expected {expected}, got {actual}")]
    InvalidLength {
        register: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 字段取值不在枚举定义内
    #[error("invalid value for {field}: 0x{value:02X}")]
    InvalidValue { field: &'static str, value: u8 },
}

/// 固定宽度寄存器记录的统一编解码接口
///
/// 每个记录绑定一个寄存器地址和固定字节宽度。编解码无副作用，
/// 两个节点使用同一实现以保证线上兼容。
pub trait Record: Sized {
    /// 寄存器地址
    const ADDR: u8;

    /// 固定字节宽度
    const LEN: usize;

    /// 记录名（用于错误报告）
    const NAME: &'static str;

    /// 编码为固定宽度字节序列
    fn to_bytes(&self) -> Vec<u8>;

    /// 从固定宽度字节序列解码
    ///
    /// 长度不匹配时返回 [`ProtocolError::InvalidLength`]。
    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError>;
}

/// 长度前置检查，供各 `Record` 实现复用
pub(crate) fn check_len<R: Record>(bytes: &[u8]) -> Result<(), ProtocolError> {
    if bytes.len() != R::LEN {
        return Err(ProtocolError::InvalidLength {
            register: R::NAME,
            expected: R::LEN,
            actual: bytes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_length_error_names_register() {
        let err = command::DriveCommand::from_bytes(&[0u8; 3]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidLength {
                register: "DRIVE",
                expected: 8,
                actual: 3,
            }
        );
        assert!(format!("{err}").contains("DRIVE"));
    }
}
