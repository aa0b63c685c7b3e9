//! Builder 模式实现
//!
//! 提供链式构造 TCP `SocketEndpoint` 的便捷方式。

use crate::socket::{EndpointConfig, SocketEndpoint};
use cobot_transport::TcpTransport;
use std::time::Duration;

/// 端点 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use cobot_driver::{EndpointBuilder, RobotEndpoint};
/// use std::time::Duration;
///
/// let mut endpoint = EndpointBuilder::new("192.168.0.10", 9000)
///     .reply_timeout(Duration::from_millis(300))
///     .build();
/// endpoint.open().unwrap();
/// ```
pub struct EndpointBuilder {
    host: String,
    port: u16,
    config: EndpointConfig,
}

impl EndpointBuilder {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            config: EndpointConfig::default(),
        }
    }

    /// 设置读取应答超时（默认 500ms）
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.config.reply_timeout = timeout;
        self
    }

    /// 设置连接超时（默认 3s）
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// 构建端点（不会立即连接）
    pub fn build(self) -> SocketEndpoint<TcpTransport> {
        let Self { host, port, config } = self;
        let connect_timeout = config.connect_timeout;
        SocketEndpoint::new(
            move || TcpTransport::connect((host.as_str(), port), connect_timeout),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RobotEndpoint;

    #[test]
    fn test_builder_defaults() {
        let endpoint = EndpointBuilder::new("127.0.0.1", 9000).build();
        assert!(!endpoint.is_open());
        assert_eq!(endpoint.config().reply_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_builder_overrides() {
        let endpoint = EndpointBuilder::new("127.0.0.1", 9000)
            .reply_timeout(Duration::from_millis(50))
            .connect_timeout(Duration::from_millis(100))
            .build();
        assert_eq!(endpoint.config().reply_timeout, Duration::from_millis(50));
        assert_eq!(endpoint.config().connect_timeout, Duration::from_millis(100));
    }
}
