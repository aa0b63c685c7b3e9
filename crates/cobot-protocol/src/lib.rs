//! # Cobot Protocol
//!
//! 桌面机械臂 socket 控制协议的帧定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `codes`: 命令码定义
//! - `control`: 控制帧构建
//! - `feedback`: 应答帧解析
//!
//! ## 帧格式
//!
//! ```text
//! [0xFE][0xFE][LEN][CMD][DATA ...][0xFA]
//! LEN = DATA.len() + 2
//! ```
//!
//! 多字节数值使用大端字节序（高位在前）。

pub mod codes;
pub mod control;
pub mod feedback;

pub use codes::*;
pub use control::*;
pub use feedback::*;

use thiserror::Error;

/// 帧头字节（连续两个）
pub const HEADER: u8 = 0xFE;

/// 帧尾字节
pub const FOOTER: u8 = 0xFA;

/// 协议帧的统一抽象
///
/// 协议层与传输层之间的中间类型：传输层只负责收发字节，
/// 帧的封装和拆解都在这里完成。
///
/// ```rust
/// use cobot_protocol::{CobotFrame, ProtocolCode};
///
/// let frame = CobotFrame::new(ProtocolCode::PowerOn, &[]);
/// assert_eq!(frame.to_bytes(), vec![0xFE, 0xFE, 0x02, 0x10, 0xFA]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CobotFrame {
    /// 原始命令码（应答帧可能携带未知命令码，因此不强制为 `ProtocolCode`）
    pub code: u8,

    /// 负载数据
    pub payload: Vec<u8>,
}

impl CobotFrame {
    /// 构建命令帧
    pub fn new(code: ProtocolCode, payload: &[u8]) -> Self {
        Self {
            code: code.into(),
            payload: payload.to_vec(),
        }
    }

    /// 命令码（未知命令码返回 `None`）
    pub fn protocol_code(&self) -> Option<ProtocolCode> {
        ProtocolCode::try_from(self.code).ok()
    }

    /// 帧是否对应指定命令
    pub fn is(&self, code: ProtocolCode) -> bool {
        self.code == u8::from(code)
    }

    /// 编码为线上字节
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 5);
        out.push(HEADER);
        out.push(HEADER);
        out.push((self.payload.len() + 2) as u8);
        out.push(self.code);
        out.extend_from_slice(&self.payload);
        out.push(FOOTER);
        out
    }
}

/// 流式解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// 解出一帧；`consumed` 包含帧之前被跳过的垃圾字节
    Frame { frame: CobotFrame, consumed: usize },
    /// 数据不足；缓冲区前 `discard` 个字节可以丢弃
    Incomplete { discard: usize },
}

/// 从字节流缓冲区中解码第一帧
///
/// 帧头之前的字节、长度非法或帧尾不匹配的候选帧都会被跳过（重新同步）。
pub fn decode_frame(buf: &[u8]) -> Decoded {
    let mut start = 0;
    loop {
        let Some(offset) = find_header(&buf[start..]) else {
            // 末尾的单个 0xFE 可能是下一帧的帧头，保留
            let discard = if buf.last() == Some(&HEADER) {
                buf.len() - 1
            } else {
                buf.len()
            };
            return Decoded::Incomplete { discard };
        };
        start += offset;

        let rest = &buf[start..];
        if rest.len() < 3 {
            return Decoded::Incomplete { discard: start };
        }

        let len = rest[2] as usize;
        if len < 2 {
            start += 1;
            continue;
        }

        let total = len + 3;
        if rest.len() < total {
            return Decoded::Incomplete { discard: start };
        }
        if rest[total - 1] != FOOTER {
            start += 1;
            continue;
        }

        let frame = CobotFrame {
            code: rest[3],
            payload: rest[4..total - 1].to_vec(),
        };
        return Decoded::Frame {
            frame,
            consumed: start + total,
        };
    }
}

fn find_header(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w[0] == HEADER && w[1] == HEADER)
}

/// 协议编解码错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid payload length for {code:?}: expected {expected}, got {actual}")]
    InvalidLength {
        code: ProtocolCode,
        expected: usize,
        actual: usize,
    },

    #[error("Unexpected reply code: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedCode { expected: u8, actual: u8 },

    #[error("Value out of range for field {field}: {value}")]
    ValueOutOfRange { field: &'static str, value: f64 },
}

/// 大端字节序转 i16
pub fn bytes_to_i16_be(bytes: [u8; 2]) -> i16 {
    i16::from_be_bytes(bytes)
}

/// i16 转大端字节序
pub fn i16_to_bytes_be(value: i16) -> [u8; 2] {
    value.to_be_bytes()
}
