//! Client 层错误类型

use cobot_driver::DriverError;
use thiserror::Error;

/// 控制器错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 端点驱动错误
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 未调用 `connect()` 或已断开
    #[error("Robot not connected. Call connect() first")]
    NotConnected,

    /// 位姿向量长度错误
    #[error("Invalid pose: expected {expected} values, got {actual}")]
    InvalidPose {
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 位姿包含 NaN / 无穷大
    #[error("Invalid pose: value at index {index} is not a finite number")]
    NonFiniteValue { index: usize },

    /// 运动步骤内的状态读取失败
    #[error("Failed to read current {0}")]
    ReadFailed(&'static str),

    /// 无限重试被取消令牌中止
    #[error("Operation cancelled")]
    Cancelled,

    /// 位姿日志写入失败
    #[error("Pose log error: {0}")]
    PoseLog(String),
}

impl ClientError {
    /// 是否为连接类错误
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Driver(_))
    }

    /// 是否为参数校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidPose { .. } | Self::NonFiniteValue { .. })
    }
}
