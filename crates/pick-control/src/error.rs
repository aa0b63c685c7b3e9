//! 抓取编排错误类型

use cobot_client::ClientError;
use pick_vision::VisionError;
use thiserror::Error;

/// 抓取编排错误类型
#[derive(Error, Debug)]
pub enum ControlError {
    /// 机械臂操作失败
    #[error("Robot error: {0}")]
    Client(#[from] ClientError),

    /// 视觉管线失败
    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    /// 取消令牌已置位
    #[error("Cancelled")]
    Cancelled,
}

impl ControlError {
    /// 取消（包括夹爪无限重试被取消）
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Client(ClientError::Cancelled))
    }
}
