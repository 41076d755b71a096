//! 命令寄存器编解码（主节点 → 运动节点）

use crate::{ProtocolError, Record, Register, check_len};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// HOME 轴掩码：升降轴
pub const HOME_LIFT: u8 = 0x01;
/// HOME 轴掩码：夹爪轴
pub const HOME_GRIP: u8 = 0x02;

/// DRIVE 命令 (0x00, 8B)
///
/// 速度矢量加命令有效窗口。`hold_ms == 0` 时节点采用默认 200 ms 窗口；
/// 窗口内无新 DRIVE 写入则节点自动回中刹停（命令超时制动）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveCommand {
    /// 前向速度 (mm/s)
    pub vx_mm_s: i16,
    /// 横向速度 (mm/s)，差速模型下忽略
    pub vy_mm_s: i16,
    /// 角速度 (mrad/s)
    pub wz_mrad_s: i16,
    /// 命令有效窗口 (ms)，0 = 默认
    pub hold_ms: u16,
}

impl Record for DriveCommand {
    const ADDR: u8 = Register::Drive as u8;
    const LEN: usize = 8;
    const NAME: &'static str = "DRIVE";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.vx_mm_s.to_le_bytes());
        b.extend_from_slice(&self.vy_mm_s.to_le_bytes());
        b.extend_from_slice(&self.wz_mrad_s.to_le_bytes());
        b.extend_from_slice(&self.hold_ms.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            vx_mm_s: i16::from_le_bytes([bytes[0], bytes[1]]),
            vy_mm_s: i16::from_le_bytes([bytes[2], bytes[3]]),
            wz_mrad_s: i16::from_le_bytes([bytes[4], bytes[5]]),
            hold_ms: u16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }
}

/// 升降命令模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ElevMode {
    /// 位置模式：闭环移动到 `height_mm`
    #[default]
    Position = 0,
    /// 速度模式：按 `speed_mm_s` 直接驱动
    Velocity = 1,
}

/// ELEV 命令 (0x10, 6B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevCommand {
    /// 目标高度 (mm)，位置模式下生效
    pub height_mm: i16,
    /// 速度 (mm/s)，速度模式下生效
    pub speed_mm_s: i16,
    /// 控制模式
    pub mode: ElevMode,
}

impl Record for ElevCommand {
    const ADDR: u8 = Register::Elev as u8;
    const LEN: usize = 6;
    const NAME: &'static str = "ELEV";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.height_mm.to_le_bytes());
        b.extend_from_slice(&self.speed_mm_s.to_le_bytes());
        b.push(self.mode.into());
        b.push(0); // 保留
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        let mode = ElevMode::try_from(bytes[4]).map_err(|_| ProtocolError::InvalidValue {
            field: "ElevMode",
            value: bytes[4],
        })?;
        Ok(Self {
            height_mm: i16::from_le_bytes([bytes[0], bytes[1]]),
            speed_mm_s: i16::from_le_bytes([bytes[2], bytes[3]]),
            mode,
        })
    }
}

/// 夹爪命令模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum GripMode {
    /// 全开：移动到标定最小角
    #[default]
    Open = 0,
    /// 全闭：移动到标定最大角
    Close = 1,
    /// 指定角度：`pose_deg` 夹取（越界时被钳到标定范围）
    Pose = 2,
}

/// GRIP 命令 (0x18, 4B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GripCommand {
    /// 命令模式
    pub mode: GripMode,
    /// 目标角度 (deg)，仅 `Pose` 模式使用
    pub pose_deg: i16,
}

impl Record for GripCommand {
    const ADDR: u8 = Register::Grip as u8;
    const LEN: usize = 4;
    const NAME: &'static str = "GRIP";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.push(self.mode.into());
        b.extend_from_slice(&self.pose_deg.to_le_bytes());
        b.push(0); // 保留
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        let mode = GripMode::try_from(bytes[0]).map_err(|_| ProtocolError::InvalidValue {
            field: "GripMode",
            value: bytes[0],
        })?;
        Ok(Self {
            mode,
            pose_deg: i16::from_le_bytes([bytes[1], bytes[2]]),
        })
    }
}

/// BRAKE 命令 (0x1C, 1B)
///
/// 节点收到任何 BRAKE 写入立即锁存刹车，与命令超时窗口无关；
/// 下一次完整的 DRIVE 写入解除锁存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrakeCommand {
    pub on: bool,
}

impl Record for BrakeCommand {
    const ADDR: u8 = Register::Brake as u8;
    const LEN: usize = 1;
    const NAME: &'static str = "BRAKE";

    fn to_bytes(&self) -> Vec<u8> {
        vec![if self.on { 0xA5 } else { 0x00 }]
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self { on: bytes[0] != 0 })
    }
}

/// HOME 命令 (0x1D, 1B)：按轴掩码回零
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HomeCommand {
    /// [`HOME_LIFT`] | [`HOME_GRIP`]
    pub axes: u8,
}

impl Record for HomeCommand {
    const ADDR: u8 = Register::Home as u8;
    const LEN: usize = 1;
    const NAME: &'static str = "HOME";

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.axes]
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self { axes: bytes[0] })
    }
}

/// SEQ 命令 (0x1E, 1B)：序列号递增触发
///
/// 节点收到后递增 `seq_ack` 并重新校验全部标定配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeqCommit {
    pub increment: u8,
}

impl Record for SeqCommit {
    const ADDR: u8 = Register::Seq as u8;
    const LEN: usize = 1;
    const NAME: &'static str = "SEQ";

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.increment]
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            increment: bytes[0],
        })
    }
}
