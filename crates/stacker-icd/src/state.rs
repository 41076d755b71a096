//! 状态机 ID 与错误标志位

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 运动节点状态机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum StateId {
    #[default]
    Boot = 0,
    Idle = 1,
    Drive = 2,
    ElevMove = 3,
    GripMove = 4,
    Homing = 5,
    Brake = 6,
}

/// 错误标志位掩码 (STATUS0.err_flags)
///
/// 各标志独立置位/清除：触发条件重新评估为假时清除，不随时间自动清除。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrFlags(pub u16);

impl ErrFlags {
    /// 命令超时（无新 DRIVE 命令）
    pub const TIMEOUT: u16 = 0x0001;
    /// I2C 总线事务失败
    pub const I2C: u16 = 0x0002;
    /// 硬件急停啮合
    pub const ESTOP: u16 = 0x0004;
    /// 升降回零失败
    pub const LIFT_HOME: u16 = 0x0008;
    /// 升降堵转 / 升降标定无效
    pub const LIFT_STALL: u16 = 0x0010;
    /// 夹爪越界 / 夹爪标定无效
    pub const GRIP_RANGE: u16 = 0x0020;
    /// DRIVE 命令超出速度包络
    pub const DRIVE_RNG: u16 = 0x0040;
    /// 任一标定配置无效
    pub const CFG: u16 = 0x0080;
    /// 电池电压过低（仅告警，不阻断）
    pub const WARN_LOW_BATT: u16 = 0x0100;

    pub fn set(&mut self, bits: u16) {
        self.0 |= bits;
    }

    pub fn clear(&mut self, bits: u16) {
        self.0 &= !bits;
    }

    /// 条件为真置位，为假清除
    pub fn assign(&mut self, bits: u16, raised: bool) {
        if raised {
            self.set(bits);
        } else {
            self.clear(bits);
        }
    }

    pub fn contains(self, bits: u16) -> bool {
        self.0 & bits != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}
