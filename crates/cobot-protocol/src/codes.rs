//! 命令码定义
//!
//! 只列出本项目实际使用到的命令；未知命令码在 `CobotFrame::code` 中以原始字节保留。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 协议命令码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ProtocolCode {
    PowerOn = 0x10,
    PowerOff = 0x11,
    IsPowerOn = 0x12,
    ReleaseAllServos = 0x13,
    IsControllerConnected = 0x14,
    FocusAllServos = 0x18,

    GetAngles = 0x20,
    SendAngles = 0x22,
    GetCoords = 0x23,
    SendCoords = 0x25,
    Stop = 0x29,
    IsMoving = 0x2B,

    SetEncoder = 0x3A,
    GetEncoder = 0x3B,

    GetGripperValue = 0x65,
    SetGripperValue = 0x67,
    SetGripperCalibration = 0x68,
}

impl ProtocolCode {
    /// 该命令是否会收到应答帧
    pub fn expects_reply(self) -> bool {
        matches!(
            self,
            ProtocolCode::IsPowerOn
                | ProtocolCode::IsControllerConnected
                | ProtocolCode::GetAngles
                | ProtocolCode::GetCoords
                | ProtocolCode::IsMoving
                | ProtocolCode::GetEncoder
                | ProtocolCode::GetGripperValue
        )
    }
}

/// 世界坐标运动的插补方式
///
/// 语义由机械臂控制器决定，本库只负责透传。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MoveMode {
    /// 点到点（关节角插补）
    #[default]
    Angular = 0,
    /// 直线插补
    Linear = 1,
}
