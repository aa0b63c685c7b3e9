//! 驱动层错误类型定义

use cobot_protocol::ProtocolError;
use cobot_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议编码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 端点尚未打开
    #[error("Endpoint not open")]
    NotOpen,
}
