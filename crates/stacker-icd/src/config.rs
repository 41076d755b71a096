//! 标定配置寄存器编解码与校验
//!
//! 配置写入后立即生效；SEQ 确认时节点重新校验并刷新错误标志。
//! 零标度配置视为无效：对应轴被强制回中并持续置位错误标志。

use crate::{ErrFlags, ProtocolError, Record, Register, check_len};

/// CFG_LINE (0x70, 2B)：巡线阈值，0 = 自动
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineConfig {
    pub threshold: u16,
}

impl Record for LineConfig {
    const ADDR: u8 = Register::CfgLine as u8;
    const LEN: usize = 2;
    const NAME: &'static str = "CFG_LINE";

    fn to_bytes(&self) -> Vec<u8> {
        self.threshold.to_le_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            threshold: u16::from_le_bytes([bytes[0], bytes[1]]),
        })
    }
}

/// CFG_LIFT (0x72, 8B)：升降标定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiftConfig {
    /// 每毫米编码器计数，0 = 无效
    pub enc_per_mm: u16,
    /// 货架三层高度 (mm)，下层起
    pub h1_mm: i16,
    pub h2_mm: i16,
    pub h3_mm: i16,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            enc_per_mm: 5,
            h1_mm: 100,
            h2_mm: 180,
            h3_mm: 260,
        }
    }
}

impl LiftConfig {
    /// 无效时返回需要置位的错误标志
    pub fn validate(&self) -> u16 {
        if self.enc_per_mm == 0 {
            ErrFlags::LIFT_STALL | ErrFlags::CFG
        } else {
            0
        }
    }

    /// 编码器计数 → 高度 (mm)
    pub fn count_to_mm(&self, count: i32) -> i16 {
        let enc = if self.enc_per_mm == 0 {
            1
        } else {
            self.enc_per_mm
        };
        (count / enc as i32) as i16
    }
}

impl Record for LiftConfig {
    const ADDR: u8 = Register::CfgLift as u8;
    const LEN: usize = 8;
    const NAME: &'static str = "CFG_LIFT";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.enc_per_mm.to_le_bytes());
        b.extend_from_slice(&self.h1_mm.to_le_bytes());
        b.extend_from_slice(&self.h2_mm.to_le_bytes());
        b.extend_from_slice(&self.h3_mm.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            enc_per_mm: u16::from_le_bytes([bytes[0], bytes[1]]),
            h1_mm: i16::from_le_bytes([bytes[2], bytes[3]]),
            h2_mm: i16::from_le_bytes([bytes[4], bytes[5]]),
            h3_mm: i16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }
}

/// CFG_GRIP (0x7A, 8B)：夹爪标定
///
/// `enc_per_deg_q12` 为 Q12 定点（4096 = 每度 1 个计数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GripConfig {
    /// 零位角对应的编码器计数
    pub enc_zero: i16,
    /// 每度计数 (Q12)，0 = 无效
    pub enc_per_deg_q12: u16,
    pub deg_min: i16,
    pub deg_max: i16,
}

impl Default for GripConfig {
    fn default() -> Self {
        Self {
            enc_zero: 0,
            enc_per_deg_q12: 4096,
            deg_min: 0,
            deg_max: 90,
        }
    }
}

impl GripConfig {
    /// 无效时返回需要置位的错误标志
    pub fn validate(&self) -> u16 {
        if self.enc_per_deg_q12 == 0 {
            ErrFlags::GRIP_RANGE | ErrFlags::CFG
        } else {
            0
        }
    }

    /// 编码器计数 → 角度 (deg)
    pub fn count_to_deg(&self, count: i32) -> i16 {
        if self.enc_per_deg_q12 == 0 {
            return 0;
        }
        let delta = count as i64 - self.enc_zero as i64;
        ((delta << 12) / self.enc_per_deg_q12 as i64) as i16
    }
}

impl Record for GripConfig {
    const ADDR: u8 = Register::CfgGrip as u8;
    const LEN: usize = 8;
    const NAME: &'static str = "CFG_GRIP";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.enc_zero.to_le_bytes());
        b.extend_from_slice(&self.enc_per_deg_q12.to_le_bytes());
        b.extend_from_slice(&self.deg_min.to_le_bytes());
        b.extend_from_slice(&self.deg_max.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            enc_zero: i16::from_le_bytes([bytes[0], bytes[1]]),
            enc_per_deg_q12: u16::from_le_bytes([bytes[2], bytes[3]]),
            deg_min: i16::from_le_bytes([bytes[4], bytes[5]]),
            deg_max: i16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }
}

/// CFG_ODO (0x82, 10B)：里程计/运动学标定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdoConfig {
    /// 编码器每转计数
    pub cpr: u16,
    /// 减速比分子/分母
    pub gear_num: u16,
    pub gear_den: u16,
    pub wheel_diam_mm: u16,
    /// 轮距 (mm)，差速旋转分量使用
    pub track_mm: u16,
}

impl Default for OdoConfig {
    fn default() -> Self {
        Self {
            cpr: 192,
            gear_num: 16,
            gear_den: 1,
            wheel_diam_mm: 160,
            track_mm: 600,
        }
    }
}

impl OdoConfig {
    /// 无效时返回需要置位的错误标志
    pub fn validate(&self) -> u16 {
        if self.cpr == 0 || self.gear_den == 0 || self.wheel_diam_mm == 0 || self.track_mm == 0 {
            ErrFlags::CFG
        } else {
            0
        }
    }
}

impl Record for OdoConfig {
    const ADDR: u8 = Register::CfgOdo as u8;
    const LEN: usize = 10;
    const NAME: &'static str = "CFG_ODO";

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(Self::LEN);
        b.extend_from_slice(&self.cpr.to_le_bytes());
        b.extend_from_slice(&self.gear_num.to_le_bytes());
        b.extend_from_slice(&self.gear_den.to_le_bytes());
        b.extend_from_slice(&self.wheel_diam_mm.to_le_bytes());
        b.extend_from_slice(&self.track_mm.to_le_bytes());
        b
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_len::<Self>(bytes)?;
        Ok(Self {
            cpr: u16::from_le_bytes([bytes[0], bytes[1]]),
            gear_num: u16::from_le_bytes([bytes[2], bytes[3]]),
            gear_den: u16::from_le_bytes([bytes[4], bytes[5]]),
            wheel_diam_mm: u16::from_le_bytes([bytes[6], bytes[7]]),
            track_mm: u16::from_le_bytes([bytes[8], bytes[9]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrips() {
        let line = LineConfig { threshold: 512 };
        assert_eq!(LineConfig::from_bytes(&line.to_bytes()).unwrap(), line);

        let lift = LiftConfig::default();
        assert_eq!(LiftConfig::from_bytes(&lift.to_bytes()).unwrap(), lift);

        let grip = GripConfig {
            enc_zero: -100,
            enc_per_deg_q12: 2048,
            deg_min: -10,
            deg_max: 120,
        };
        assert_eq!(GripConfig::from_bytes(&grip.to_bytes()).unwrap(), grip);

        let odo = OdoConfig::default();
        assert_eq!(OdoConfig::from_bytes(&odo.to_bytes()).unwrap(), odo);
        assert_eq!(odo.to_bytes().len(), 10);
    }

    #[test]
    fn zero_scale_lift_is_invalid() {
        let mut lift = LiftConfig::default();
        assert_eq!(lift.validate(), 0);
        lift.enc_per_mm = 0;
        let bits = lift.validate();
        assert_ne!(bits & ErrFlags::CFG, 0);
        assert_ne!(bits & ErrFlags::LIFT_STALL, 0);
    }

    #[test]
    fn zero_scale_grip_is_invalid() {
        let mut grip = GripConfig::default();
        assert_eq!(grip.validate(), 0);
        grip.enc_per_deg_q12 = 0;
        let bits = grip.validate();
        assert_ne!(bits & ErrFlags::CFG, 0);
        assert_ne!(bits & ErrFlags::GRIP_RANGE, 0);
    }

    #[test]
    fn lift_count_to_mm_uses_scale() {
        let lift = LiftConfig::default(); // 5 counts/mm
        assert_eq!(lift.count_to_mm(500), 100);
        assert_eq!(lift.count_to_mm(-50), -10);
    }

    #[test]
    fn grip_count_to_deg_q12() {
        let grip = GripConfig {
            enc_zero: 100,
            enc_per_deg_q12: 4096, // 1 count/deg
            deg_min: 0,
            deg_max: 90,
        };
        assert_eq!(grip.count_to_deg(145), 45);
        assert_eq!(grip.count_to_deg(100), 0);

        let half = GripConfig {
            enc_per_deg_q12: 2048, // 0.5 count/deg
            ..grip
        };
        assert_eq!(half.count_to_deg(145), 90);
    }

    #[test]
    fn zero_scale_grip_reads_zero_deg() {
        let grip = GripConfig {
            enc_per_deg_q12: 0,
            ..GripConfig::default()
        };
        assert_eq!(grip.count_to_deg(12345), 0);
    }
}
