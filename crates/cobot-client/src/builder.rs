//! Client 层 Builder
//!
//! 从地址文件和配置组装连接到真实机械臂的控制器。

use crate::controller::{CobotController, MotionParams};
use crate::gripper::GripperConfig;
use cobot_driver::{EndpointBuilder, SocketEndpoint};
use cobot_tools::{EndpointAddress, PickPlaceSettings};
use cobot_transport::TcpTransport;
use std::time::Duration;

/// TCP 控制器类型
pub type TcpController = CobotController<SocketEndpoint<TcpTransport>>;

/// 控制器 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use cobot_client::ControllerBuilder;
/// use cobot_tools::EndpointAddress;
///
/// let address: EndpointAddress = "192.168.0.10, 9000".parse().unwrap();
/// let controller = ControllerBuilder::new(address).build();
/// let status = controller.connect().unwrap();
/// if status.is_degraded() {
///     controller.power_on().unwrap();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ControllerBuilder {
    address: EndpointAddress,
    reply_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    gripper: GripperConfig,
    motion: MotionParams,
}

impl ControllerBuilder {
    pub fn new(address: EndpointAddress) -> Self {
        Self {
            address,
            reply_timeout: None,
            connect_timeout: None,
            gripper: GripperConfig::default(),
            motion: MotionParams::default(),
        }
    }

    /// 按配置文件设置超时、速度和夹爪参数
    pub fn from_settings(address: EndpointAddress, settings: &PickPlaceSettings) -> Self {
        let motion = MotionParams {
            default_speed: settings.robot.default_speed,
            ..MotionParams::default()
        };
        Self::new(address)
            .reply_timeout(Duration::from_millis(settings.robot.reply_timeout_ms))
            .connect_timeout(Duration::from_millis(settings.robot.connect_timeout_ms))
            .gripper(GripperConfig::from(&settings.gripper))
            .motion(motion)
    }

    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn gripper(mut self, config: GripperConfig) -> Self {
        self.gripper = config;
        self
    }

    pub fn motion(mut self, params: MotionParams) -> Self {
        self.motion = params;
        self
    }

    /// 构建控制器（不会立即连接）
    pub fn build(self) -> TcpController {
        let mut endpoint = EndpointBuilder::new(self.address.host, self.address.port);
        if let Some(timeout) = self.reply_timeout {
            endpoint = endpoint.reply_timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }
        CobotController::with_config(endpoint.build(), self.gripper, self.motion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let mut settings = PickPlaceSettings::default();
        settings.robot.default_speed = 25;
        settings.gripper.timeout_ms = 250;

        let address: EndpointAddress = "127.0.0.1, 9000".parse().unwrap();
        let controller = ControllerBuilder::from_settings(address, &settings).build();

        assert!(!controller.is_connected());
        assert_eq!(controller.default_speed(), 25);
        assert_eq!(
            controller.gripper_config().motion_timeout,
            Duration::from_millis(250)
        );
    }
}
