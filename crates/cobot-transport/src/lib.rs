//! # Cobot Transport Layer
//!
//! 传输层抽象：把协议帧写到链路上，再从字节流中重组应答帧。
//!
//! - [`TcpTransport`]：机械臂控制器的 TCP socket 端点
//! - [`MockTransport`]：测试用回环传输（`mock` feature）

use cobot_protocol::CobotFrame;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

pub mod tcp;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use tcp::TcpTransport;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Address resolution failed: {0}")]
    Resolve(String),
    #[error("Read timeout")]
    Timeout,
    #[error("Connection closed by peer")]
    Closed,
    #[error("Transport not connected")]
    NotConnected,
}

/// 帧级别的双向传输
pub trait Transport {
    /// 发送一帧
    fn send(&mut self, frame: &CobotFrame) -> Result<(), TransportError>;

    /// 接收下一帧（使用当前设置的接收超时）
    fn receive(&mut self) -> Result<CobotFrame, TransportError>;

    fn set_receive_timeout(&mut self, _timeout: Duration) {}

    fn receive_timeout(&mut self, timeout: Duration) -> Result<CobotFrame, TransportError> {
        self.set_receive_timeout(timeout);
        self.receive()
    }

    /// 发送请求并等待同命令码的应答
    ///
    /// 命令码不匹配的帧（上一次请求超时后迟到的应答等）会被丢弃。
    fn request(
        &mut self,
        frame: &CobotFrame,
        timeout: Duration,
    ) -> Result<CobotFrame, TransportError> {
        self.send(frame)?;
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout);
            }
            let reply = self.receive_timeout(remaining)?;
            if reply.code == frame.code {
                return Ok(reply);
            }
            debug!(
                expected = frame.code,
                actual = reply.code,
                "Discarding unmatched reply frame"
            );
        }
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &CobotFrame) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> Result<CobotFrame, TransportError> {
        (**self).receive()
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        (**self).set_receive_timeout(timeout)
    }
}
