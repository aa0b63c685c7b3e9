//! 机械臂控制器
//!
//! [`CobotController`] 持有端点连接，所有操作都先检查连接标志。
//! 方法都是 `&self`：端点放在锁里，控制器可以放进 `Arc` 跨线程共享。

use crate::error::ClientError;
use crate::gripper::GripperConfig;
use cobot_driver::{MoveMode, RobotEndpoint};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 位姿向量长度
pub const POSE_LEN: usize = 6;

/// `connect()` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    /// 链路打开且控制器有应答
    Connected,
    /// 链路打开但存活探测失败（通常随后上电即可恢复）
    Degraded,
}

impl ConnectStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ConnectStatus::Degraded)
    }
}

/// 运动参数
#[derive(Debug, Clone, PartialEq)]
pub struct MotionParams {
    /// 物体上方接近高度（mm）
    pub approach_z: f64,
    /// 抓取/放置高度（mm）
    pub pick_z: f64,
    /// 移动中的安全高度（mm）
    pub safe_z: f64,
    /// 末端姿态 `(rx, ry, rz)`（度）
    pub tool_rpy: [f64; 3],
    /// `pick_at` / `place_at` 使用的插补模式
    pub move_mode: MoveMode,
    pub default_speed: u32,
    /// 每条基础命令之后的等待
    pub command_delay: Duration,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            approach_z: 80.0,
            pick_z: 20.0,
            safe_z: 120.0,
            tool_rpy: [180.0, 0.0, 0.0],
            move_mode: MoveMode::Angular,
            default_speed: 40,
            command_delay: Duration::ZERO,
        }
    }
}

/// 机械臂控制器
pub struct CobotController<E: RobotEndpoint> {
    pub(crate) endpoint: Mutex<E>,
    connected: AtomicBool,
    /// 夹爪命令 + 编码器轮询的互斥
    pub(crate) gripper_lock: Mutex<()>,
    pub(crate) gripper: GripperConfig,
    pub(crate) motion: MotionParams,
}

impl<E: RobotEndpoint> CobotController<E> {
    pub fn new(endpoint: E) -> Self {
        Self::with_config(endpoint, GripperConfig::default(), MotionParams::default())
    }

    pub fn with_config(endpoint: E, gripper: GripperConfig, motion: MotionParams) -> Self {
        Self {
            endpoint: Mutex::new(endpoint),
            connected: AtomicBool::new(false),
            gripper_lock: Mutex::new(()),
            gripper,
            motion,
        }
    }

    pub fn gripper_config(&self) -> &GripperConfig {
        &self.gripper
    }

    pub fn motion_params(&self) -> &MotionParams {
        &self.motion
    }

    pub fn default_speed(&self) -> u32 {
        self.motion.default_speed
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    // ==================== 连接 ====================

    /// 打开端点并做一次存活探测
    ///
    /// 已连接时直接返回 `Connected`。探测失败不算错误，返回 `Degraded`。
    pub fn connect(&self) -> Result<ConnectStatus, ClientError> {
        if self.is_connected() {
            return Ok(ConnectStatus::Connected);
        }

        let mut endpoint = self.endpoint.lock();
        if !endpoint.is_open() {
            endpoint.open()?;
        }
        self.connected.store(true, Ordering::Release);

        match endpoint.is_controller_connected() {
            Ok(true) => {
                info!("Robot controller connected");
                Ok(ConnectStatus::Connected)
            },
            Ok(false) => {
                warn!("Link is open but the robot controller did not respond");
                Ok(ConnectStatus::Degraded)
            },
            Err(e) => {
                warn!(error = %e, "Liveness probe failed");
                Ok(ConnectStatus::Degraded)
            },
        }
    }

    /// 尽力停止并关闭连接（错误只记录不返回）
    pub fn disconnect(&self) {
        let mut endpoint = self.endpoint.lock();
        if endpoint.is_open() {
            if let Err(e) = endpoint.stop() {
                debug!(error = %e, "stop before disconnect failed");
            }
            endpoint.close();
        }
        self.connected.store(false, Ordering::Release);
        info!("Robot disconnected");
    }

    pub(crate) fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    /// 检查连接后在端点锁内执行
    pub(crate) fn call<T>(
        &self,
        f: impl FnOnce(&mut E) -> Result<T, cobot_driver::DriverError>,
    ) -> Result<T, ClientError> {
        self.ensure_connected()?;
        let mut endpoint = self.endpoint.lock();
        Ok(f(&mut endpoint)?)
    }

    fn after_command(&self) {
        if !self.motion.command_delay.is_zero() {
            std::thread::sleep(self.motion.command_delay);
        }
    }

    // ==================== 基础控制 ====================

    pub fn power_on(&self) -> Result<(), ClientError> {
        self.call(|ep| ep.power_on())?;
        self.after_command();
        Ok(())
    }

    pub fn power_off(&self) -> Result<(), ClientError> {
        self.call(|ep| ep.power_off())?;
        self.after_command();
        Ok(())
    }

    /// 上力矩（锁定全部舵机）
    pub fn torque_on(&self) -> Result<(), ClientError> {
        self.call(|ep| ep.focus_all_servos())?;
        self.after_command();
        Ok(())
    }

    /// 卸力矩（可手动拖动）
    pub fn torque_off(&self) -> Result<(), ClientError> {
        self.call(|ep| ep.release_all_servos())?;
        self.after_command();
        Ok(())
    }

    pub fn stop(&self) -> Result<(), ClientError> {
        self.call(|ep| ep.stop())?;
        self.after_command();
        Ok(())
    }

    pub fn home(&self, speed: u32) -> Result<(), ClientError> {
        self.call(|ep| ep.go_home(speed))?;
        self.after_command();
        Ok(())
    }

    // ==================== 状态读取 ====================

    /// 当前关节角（度）；应答异常时为 `None`
    pub fn get_angles(&self) -> Result<Option<[f64; 6]>, ClientError> {
        self.call(|ep| ep.get_angles())
    }

    /// 当前世界坐标；应答异常时为 `None`
    pub fn get_coords(&self) -> Result<Option<[f64; 6]>, ClientError> {
        self.call(|ep| ep.get_coords())
    }

    // ==================== 运动 ====================

    /// 绝对关节运动
    pub fn move_joints(&self, angles_deg: &[f64], speed: u32) -> Result<(), ClientError> {
        let angles = validate_pose(angles_deg)?;
        self.call(|ep| ep.send_angles(&angles, speed))?;
        self.after_command();
        Ok(())
    }

    /// 绝对世界坐标运动，`mode` 原样透传给端点
    pub fn move_world(&self, pose: &[f64], mode: MoveMode, speed: u32) -> Result<(), ClientError> {
        let coords = validate_pose(pose)?;
        debug!(?coords, ?mode, speed, "move_world");
        self.call(|ep| ep.send_coords(&coords, speed, mode))?;
        self.after_command();
        Ok(())
    }
}

impl<E: RobotEndpoint> Drop for CobotController<E> {
    fn drop(&mut self) {
        let endpoint = self.endpoint.get_mut();
        if endpoint.is_open() {
            endpoint.close();
        }
    }
}

/// 校验长度为 6 且全部为有限数
pub fn validate_pose(values: &[f64]) -> Result<[f64; 6], ClientError> {
    let pose: [f64; POSE_LEN] = values.try_into().map_err(|_| ClientError::InvalidPose {
        expected: POSE_LEN,
        actual: values.len(),
    })?;
    if let Some(index) = pose.iter().position(|v| !v.is_finite()) {
        return Err(ClientError::NonFiniteValue { index });
    }
    Ok(pose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobot_driver::{EndpointCall, MockEndpoint, MockState};

    fn connected() -> (CobotController<MockEndpoint>, MockEndpoint) {
        let mock = MockEndpoint::new();
        let controller = CobotController::new(mock.clone());
        assert_eq!(controller.connect().unwrap(), ConnectStatus::Connected);
        (controller, mock)
    }

    #[test]
    fn test_validate_pose() {
        assert!(validate_pose(&[1.0; 6]).is_ok());
        assert!(matches!(
            validate_pose(&[1.0; 5]),
            Err(ClientError::InvalidPose {
                expected: 6,
                actual: 5
            })
        ));
        assert!(matches!(
            validate_pose(&[0.0, 0.0, f64::NAN, 0.0, 0.0, 0.0]),
            Err(ClientError::NonFiniteValue { index: 2 })
        ));
    }

    #[test]
    fn test_operations_require_connection() {
        let mock = MockEndpoint::new();
        let controller = CobotController::new(mock.clone());

        assert!(matches!(controller.power_on(), Err(ClientError::NotConnected)));
        assert!(matches!(
            controller.move_joints(&[0.0; 6], 50),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(controller.get_coords(), Err(ClientError::NotConnected)));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_connect_degraded_when_unresponsive() {
        let mock = MockEndpoint::with_state(MockState {
            controller_responsive: false,
            ..MockState::default()
        });
        let controller = CobotController::new(mock.clone());

        let status = controller.connect().unwrap();
        assert!(status.is_degraded());
        assert!(controller.is_connected());
        controller.power_on().unwrap();
    }

    #[test]
    fn test_connect_failure_leaves_disconnected() {
        let mock = MockEndpoint::with_state(MockState {
            refuse_open: true,
            ..MockState::default()
        });
        let controller = CobotController::new(mock);
        assert!(matches!(controller.connect(), Err(ClientError::Driver(_))));
        assert!(!controller.is_connected());
    }

    #[test]
    fn test_pass_through_commands() {
        let (controller, mock) = connected();
        controller.power_on().unwrap();
        controller.torque_on().unwrap();
        controller.torque_off().unwrap();
        controller.home(30).unwrap();
        controller.stop().unwrap();
        controller.power_off().unwrap();

        let calls = mock.calls();
        assert_eq!(
            &calls[2..],
            &[
                EndpointCall::PowerOn,
                EndpointCall::FocusAllServos,
                EndpointCall::ReleaseAllServos,
                EndpointCall::GoHome { speed: 30 },
                EndpointCall::Stop,
                EndpointCall::PowerOff,
            ]
        );
    }

    #[test]
    fn test_move_world_passes_mode() {
        let (controller, mock) = connected();
        let pose = [200.0, 10.0, 150.0, 180.0, 0.0, 0.0];
        controller.move_world(&pose, MoveMode::Linear, 25).unwrap();
        assert_eq!(
            mock.calls().last(),
            Some(&EndpointCall::SendCoords {
                coords: pose,
                speed: 25,
                mode: MoveMode::Linear
            })
        );

        assert!(matches!(
            controller.move_world(&pose[..4], MoveMode::Linear, 25),
            Err(ClientError::InvalidPose { actual: 4, .. })
        ));
    }

    #[test]
    fn test_disconnect() {
        let (controller, mock) = connected();
        controller.disconnect();
        assert!(!controller.is_connected());
        assert!(!mock.state().lock().open);
        assert!(mock.calls().contains(&EndpointCall::Stop));
        assert!(matches!(controller.stop(), Err(ClientError::NotConnected)));
    }
}
