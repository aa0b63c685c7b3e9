//! 测试用传输
//!
//! 记录所有发出的帧，并通过应答函数生成回复。

use crate::{Transport, TransportError};
use cobot_protocol::CobotFrame;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Responder = Box<dyn FnMut(&CobotFrame) -> Option<CobotFrame> + Send>;

/// 回环式 Mock 传输
pub struct MockTransport {
    sent: Arc<Mutex<Vec<CobotFrame>>>,
    pending: VecDeque<CobotFrame>,
    responder: Responder,
}

impl MockTransport {
    /// 创建 Mock 传输；`responder` 对每个发出的帧决定是否回复
    pub fn new<F>(responder: F) -> Self
    where
        F: FnMut(&CobotFrame) -> Option<CobotFrame> + Send + 'static,
    {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            pending: VecDeque::new(),
            responder: Box::new(responder),
        }
    }

    /// 从不回复的传输
    pub fn silent() -> Self {
        Self::new(|_| None)
    }

    /// 已发送帧的共享句柄（传输被移动后仍可检查）
    pub fn sent_frames(&self) -> Arc<Mutex<Vec<CobotFrame>>> {
        self.sent.clone()
    }

    /// 预先注入一帧待接收数据
    pub fn inject(&mut self, frame: CobotFrame) {
        self.pending.push_back(frame);
    }
}

impl Transport for MockTransport {
    fn send(&mut self, frame: &CobotFrame) -> Result<(), TransportError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(frame.clone());
        }
        if let Some(reply) = (self.responder)(frame) {
            self.pending.push_back(reply);
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<CobotFrame, TransportError> {
        self.pending.pop_front().ok_or(TransportError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobot_protocol::{ProtocolCode, control};
    use std::time::Duration;

    #[test]
    fn test_request_skips_stale_reply() {
        let mut transport = MockTransport::new(|frame| {
            if frame.is(ProtocolCode::GetEncoder) {
                Some(CobotFrame::new(ProtocolCode::GetEncoder, &[0x08, 0x00]))
            } else {
                None
            }
        });
        // 迟到的上一次应答
        transport.inject(CobotFrame::new(ProtocolCode::GetCoords, &[0; 12]));

        let reply = transport
            .request(&control::get_encoder(7), Duration::from_millis(10))
            .unwrap();
        assert!(reply.is(ProtocolCode::GetEncoder));
        assert_eq!(transport.sent_frames().lock().unwrap().len(), 1);
    }

    #[test]
    fn test_request_times_out_without_reply() {
        let mut transport = MockTransport::silent();
        let err = transport
            .request(&control::get_angles(), Duration::from_millis(5))
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }
}
