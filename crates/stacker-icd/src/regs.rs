//! 寄存器地址与长度定义
//!
//! 地址表来自 ICD v0.5，两个节点必须保持一致。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 运动节点 I2C 从机地址（7 位）
pub const NODE_I2C_ADDR: u8 = 0x12;

/// ICD 寄存器表
///
/// 命令区 0x00..0x3F，遥测区 0x40..0x6F，配置区 0x70 起。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Register {
    // 命令
    Drive = 0x00,
    Elev = 0x10,
    Grip = 0x18,
    Brake = 0x1C,
    Home = 0x1D,
    Seq = 0x1E,

    // 遥测
    Status0 = 0x40,
    Status1 = 0x44,
    Lines = 0x48,
    Power = 0x4E,
    DriveFb = 0x50,
    AuxFb = 0x58,
    Sens = 0x5C,
    Odom = 0x62,

    // 配置
    CfgLine = 0x70,
    CfgLift = 0x72,
    CfgGrip = 0x7A,
    CfgOdo = 0x82,
}

impl Register {
    /// 寄存器固定字节宽度
    pub const fn len(self) -> usize {
        match self {
            Register::Drive => 8,
            Register::Elev => 6,
            Register::Grip => 4,
            Register::Brake | Register::Home | Register::Seq => 1,
            Register::Status0 | Register::Status1 => 4,
            Register::Lines => 6,
            Register::Power => 4,
            Register::DriveFb => 8,
            Register::AuxFb => 4,
            Register::Sens => 4,
            Register::Odom => 8,
            Register::CfgLine => 2,
            Register::CfgLift | Register::CfgGrip => 8,
            Register::CfgOdo => 10,
        }
    }

    /// 主节点是否可写该寄存器
    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            Register::Drive
                | Register::Elev
                | Register::Grip
                | Register::Brake
                | Register::Home
                | Register::Seq
                | Register::CfgLine
                | Register::CfgLift
                | Register::CfgGrip
                | Register::CfgOdo
        )
    }

    /// 是否为遥测寄存器（节点按请求实时合成）
    pub const fn is_telemetry(self) -> bool {
        matches!(
            self,
            Register::Status0
                | Register::Status1
                | Register::Lines
                | Register::Power
                | Register::DriveFb
                | Register::AuxFb
                | Register::Sens
                | Register::Odom
        )
    }
}
