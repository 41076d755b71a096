//! 遥测寄存器编解码（运动节点 → 主节点）
//!
//! 遥测记录由节点在每次读请求时从实时状态合成，节点侧不缓存。

use crate::{ErrFlags, ProtocolError, Record, Register, StateId, check_len};

/// STATUS0 (0x40, 4B)：状态机 + 序列确认 + 错误标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status0 {
    pub state: StateId,
    pub seq_ack: u8,
    pub err_flags: ErrFlags,
}

impl Record for Status0 {
    const ADDR: u8 = Register::Status0 as u8;
    const LEN: usize = 4;
    const NAME: &'static str = "STATUS0";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.push(self.state.into());
        b.push(self.seq_ack);
        b.extend_from_slice(&self.err_flags.0.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        let state = StateId::try_from(bytes[0]).map_err(|_| ProtocolError::InvalidValue {
            field: "StateId",
            value: bytes[0],
        })?;
        Ok(Self {
            state,
            seq_ack: bytes[1],
            err_flags: ErrFlags(u16::from_le_bytes([bytes[2], bytes[3]])),
        })
    }
}

/// STATUS1 (0x44, 4B)：标定换算后的升降高度与夹爪角度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status1 {
    pub elev_mm: i16,
    pub grip_deg: i16,
}

impl Record for Status1 {
    const ADDR: u8 = Register::Status1 as u8;
    const LEN: usize = 4;
    const NAME: &'static str = "STATUS1";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.elev_mm.to_le_bytes());
        b.extend_from_slice(&self.grip_deg.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            elev_mm: i16::from_le_bytes([bytes[0], bytes[1]]),
            grip_deg: i16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// LINES (0x48, 6B)：巡线传感器原值与阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lines {
    pub left: u16,
    pub right: u16,
    pub threshold: u16,
}

impl Record for Lines {
    const ADDR: u8 = Register::Lines as u8;
    const LEN: usize = 6;
    const NAME: &'static str = "LINES";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.left.to_le_bytes());
        b.extend_from_slice(&self.right.to_le_bytes());
        b.extend_from_slice(&self.threshold.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            left: u16::from_le_bytes([bytes[0], bytes[1]]),
            right: u16::from_le_bytes([bytes[2], bytes[3]]),
            threshold: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }
}

/// POWER (0x4E, 4B)：电池电压与急停状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Power {
    pub vbatt_mv: u16,
    /// 主电源开关状态（急停未啮合 = 1）
    pub mps: u8,
    /// 急停啮合 = 1
    pub estop: u8,
}

impl Record for Power {
    const ADDR: u8 = Register::Power as u8;
    const LEN: usize = 4;
    const NAME: &'static str = "POWER";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.vbatt_mv.to_le_bytes());
        b.push(self.mps);
        b.push(self.estop);
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            vbatt_mv: u16::from_le_bytes([bytes[0], bytes[1]]),
            mps: bytes[2],
            estop: bytes[3],
        })
    }
}

/// DRIVEFB (0x50, 8B)：四路驱动脉宽回读 (µs)
///
/// 差速模型只使用前两路，后两路恒为 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveFeedback {
    pub wheel_us: [u16; 4],
}

impl Default for DriveFeedback {
    fn default() -> Self {
        Self {
            wheel_us: [crate::SERVO_US_NEUTRAL; 4],
        }
    }
}

impl Record for DriveFeedback {
    const ADDR: u8 = Register::DriveFb as u8;
    const LEN: usize = 8;
    const NAME: &'static str = "DRIVEFB";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        for us in self.wheel_us {
            b.extend_from_slice(&us.to_le_bytes());
        }
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        let mut wheel_us = [0u16; 4];
        for (i, us) in wheel_us.iter_mut().enumerate() {
            *us = u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        }
        Ok(Self { wheel_us })
    }
}

/// AUXFB (0x58, 4B)：升降/夹爪脉宽回读 (µs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuxFeedback {
    pub lift_us: u16,
    pub grip_us: u16,
}

impl Default for AuxFeedback {
    fn default() -> Self {
        Self {
            lift_us: crate::SERVO_US_NEUTRAL,
            grip_us: crate::SERVO_US_NEUTRAL,
        }
    }
}

impl Record for AuxFeedback {
    const ADDR: u8 = Register::AuxFb as u8;
    const LEN: usize = 4;
    const NAME: &'static str = "AUXFB";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.lift_us.to_le_bytes());
        b.extend_from_slice(&self.grip_us.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            lift_us: u16::from_le_bytes([bytes[0], bytes[1]]),
            grip_us: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// SENS (0x5C, 4B)：夹爪/升降编码器原始计数（截断到 i16）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensReadout {
    pub grip_enc: i16,
    pub lift_enc: i16,
}

impl Record for SensReadout {
    const ADDR: u8 = Register::Sens as u8;
    const LEN: usize = 4;
    const NAME: &'static str = "SENS";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.grip_enc.to_le_bytes());
        b.extend_from_slice(&self.lift_enc.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            grip_enc: i16::from_le_bytes([bytes[0], bytes[1]]),
            lift_enc: i16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// ODOM (0x62, 8B)：左右轮里程计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Odometry {
    pub left: i32,
    pub right: i32,
}

impl Record for Odometry {
    const ADDR: u8 = Register::Odom as u8;
    const LEN: usize = 8;
    const NAME: &'static str = "ODOM";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.left.to_le_bytes());
        b.extend_from_slice(&self.right.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            left: i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            right: i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}
