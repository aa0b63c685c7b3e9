//! TCP socket 传输
//!
//! 控制器以字节流方式收发帧，这里负责帧的重组（半包、粘包、垃圾字节）。

use crate::{Transport, TransportError};
use bytes::{Buf, BytesMut};
use cobot_protocol::{CobotFrame, Decoded, decode_frame};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// 默认接收超时
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(500);

/// TCP 传输
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    receive_timeout: Duration,
}

impl TcpTransport {
    /// 连接控制器
    ///
    /// `addr` 可以是 `"192.168.0.10:9000"` 或 `("192.168.0.10", 9000)` 等任何
    /// `ToSocketAddrs`；依次尝试解析得到的地址。
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let addrs: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve(e.to_string()))?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolve("no address resolved".to_string()));
        }

        let mut last_err = None;
        for peer in addrs {
            match TcpStream::connect_timeout(&peer, connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    info!(%peer, "TCP transport connected");
                    return Ok(Self::from_stream(stream, peer));
                },
                Err(e) => {
                    debug!(%peer, error = %e, "TCP connect attempt failed");
                    last_err = Some(e);
                },
            }
        }
        Err(last_err.map(TransportError::Io).unwrap_or(TransportError::NotConnected))
    }

    /// 包装已建立的连接
    pub fn from_stream(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(256),
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// 丢弃所有已缓冲但尚未解析的字节
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    fn try_decode(&mut self) -> Option<CobotFrame> {
        match decode_frame(&self.buffer) {
            Decoded::Frame { frame, consumed } => {
                self.buffer.advance(consumed);
                Some(frame)
            },
            Decoded::Incomplete { discard } => {
                if discard > 0 {
                    trace!(discard, "Dropping unframed bytes");
                    self.buffer.advance(discard);
                }
                None
            },
        }
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, frame: &CobotFrame) -> Result<(), TransportError> {
        let bytes = frame.to_bytes();
        trace!(code = frame.code, len = bytes.len(), "TX frame");
        self.stream.write_all(&bytes)?;
        Ok(())
    }

    fn receive(&mut self) -> Result<CobotFrame, TransportError> {
        let deadline = Instant::now() + self.receive_timeout;
        let mut chunk = [0u8; 256];
        loop {
            if let Some(frame) = self.try_decode() {
                trace!(code = frame.code, len = frame.payload.len(), "RX frame");
                return Ok(frame);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout);
            }
            self.stream.set_read_timeout(Some(remaining))?;

            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(TransportError::Timeout);
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        // 零超时会被 std 拒绝，这里统一用 1ms 下限
        self.receive_timeout = timeout.max(Duration::from_millis(1));
    }
}
