//! 机械臂控制端点抽象

use crate::error::DriverError;
use cobot_protocol::MoveMode;
use std::fmt;

/// 上层使用到的端点操作
///
/// 静态枚举，用于日志字段和 CLI 的 `ops` 列表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointOp {
    Connect,
    IsControllerConnected,
    PowerOn,
    PowerOff,
    FocusAllServos,
    ReleaseAllServos,
    Stop,
    GoHome,
    SendAngles,
    SendCoords,
    GetAngles,
    GetCoords,
    GetEncoder,
    SetEncoder,
    SetGripperCalibration,
    GetGripperValue,
    SetGripperValue,
}

impl EndpointOp {
    pub const ALL: [EndpointOp; 17] = [
        EndpointOp::Connect,
        EndpointOp::IsControllerConnected,
        EndpointOp::PowerOn,
        EndpointOp::PowerOff,
        EndpointOp::FocusAllServos,
        EndpointOp::ReleaseAllServos,
        EndpointOp::Stop,
        EndpointOp::GoHome,
        EndpointOp::SendAngles,
        EndpointOp::SendCoords,
        EndpointOp::GetAngles,
        EndpointOp::GetCoords,
        EndpointOp::GetEncoder,
        EndpointOp::SetEncoder,
        EndpointOp::SetGripperCalibration,
        EndpointOp::GetGripperValue,
        EndpointOp::SetGripperValue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EndpointOp::Connect => "connect",
            EndpointOp::IsControllerConnected => "is_controller_connected",
            EndpointOp::PowerOn => "power_on",
            EndpointOp::PowerOff => "power_off",
            EndpointOp::FocusAllServos => "focus_all_servos",
            EndpointOp::ReleaseAllServos => "release_all_servos",
            EndpointOp::Stop => "stop",
            EndpointOp::GoHome => "go_home",
            EndpointOp::SendAngles => "send_angles",
            EndpointOp::SendCoords => "send_coords",
            EndpointOp::GetAngles => "get_angles",
            EndpointOp::GetCoords => "get_coords",
            EndpointOp::GetEncoder => "get_encoder",
            EndpointOp::SetEncoder => "set_encoder",
            EndpointOp::SetGripperCalibration => "set_gripper_calibration",
            EndpointOp::GetGripperValue => "get_gripper_value",
            EndpointOp::SetGripperValue => "set_gripper_value",
        }
    }

    /// 是否为读取操作（有应答）
    pub fn is_query(self) -> bool {
        matches!(
            self,
            EndpointOp::IsControllerConnected
                | EndpointOp::GetAngles
                | EndpointOp::GetCoords
                | EndpointOp::GetEncoder
                | EndpointOp::GetGripperValue
        )
    }
}

impl fmt::Display for EndpointOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 机械臂控制端点
///
/// 读取类操作的约定：
/// - `Err(..)`：链路级失败（连接断开、IO 错误）
/// - `Ok(None)`：控制器无应答、应答格式错误或返回哨兵值（如编码器 `-1`）
pub trait RobotEndpoint: Send {
    /// 打开链路（已打开时为空操作）
    fn open(&mut self) -> Result<(), DriverError>;

    /// 关闭链路
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// 链路存活探测：控制器是否在应答
    fn is_controller_connected(&mut self) -> Result<bool, DriverError>;

    fn power_on(&mut self) -> Result<(), DriverError>;

    fn power_off(&mut self) -> Result<(), DriverError>;

    /// 所有舵机上力矩
    fn focus_all_servos(&mut self) -> Result<(), DriverError>;

    /// 所有舵机卸力
    fn release_all_servos(&mut self) -> Result<(), DriverError>;

    fn stop(&mut self) -> Result<(), DriverError>;

    fn go_home(&mut self, speed: u32) -> Result<(), DriverError>;

    /// 绝对关节角（度）
    fn send_angles(&mut self, angles_deg: &[f64; 6], speed: u32) -> Result<(), DriverError>;

    /// 绝对世界坐标 `[x, y, z, rx, ry, rz]`（mm / 度）
    fn send_coords(
        &mut self,
        coords: &[f64; 6],
        speed: u32,
        mode: MoveMode,
    ) -> Result<(), DriverError>;

    fn get_angles(&mut self) -> Result<Option<[f64; 6]>, DriverError>;

    fn get_coords(&mut self) -> Result<Option<[f64; 6]>, DriverError>;

    fn get_encoder(&mut self, joint_id: u8) -> Result<Option<i32>, DriverError>;

    fn set_encoder(&mut self, joint_id: u8, value: i32, speed: u32) -> Result<(), DriverError>;

    /// 夹爪标定（重新设定夹爪参考零位）
    fn set_gripper_calibration(&mut self) -> Result<(), DriverError>;

    fn get_gripper_value(&mut self) -> Result<Option<u8>, DriverError>;

    fn set_gripper_value(&mut self, value: u8, speed: u32) -> Result<(), DriverError>;
}

impl<E: RobotEndpoint + ?Sized> RobotEndpoint for Box<E> {
    fn open(&mut self) -> Result<(), DriverError> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn is_controller_connected(&mut self) -> Result<bool, DriverError> {
        (**self).is_controller_connected()
    }

    fn power_on(&mut self) -> Result<(), DriverError> {
        (**self).power_on()
    }

    fn power_off(&mut self) -> Result<(), DriverError> {
        (**self).power_off()
    }

    fn focus_all_servos(&mut self) -> Result<(), DriverError> {
        (**self).focus_all_servos()
    }

    fn release_all_servos(&mut self) -> Result<(), DriverError> {
        (**self).release_all_servos()
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        (**self).stop()
    }

    fn go_home(&mut self, speed: u32) -> Result<(), DriverError> {
        (**self).go_home(speed)
    }

    fn send_angles(&mut self, angles_deg: &[f64; 6], speed: u32) -> Result<(), DriverError> {
        (**self).send_angles(angles_deg, speed)
    }

    fn send_coords(
        &mut self,
        coords: &[f64; 6],
        speed: u32,
        mode: MoveMode,
    ) -> Result<(), DriverError> {
        (**self).send_coords(coords, speed, mode)
    }

    fn get_angles(&mut self) -> Result<Option<[f64; 6]>, DriverError> {
        (**self).get_angles()
    }

    fn get_coords(&mut self) -> Result<Option<[f64; 6]>, DriverError> {
        (**self).get_coords()
    }

    fn get_encoder(&mut self, joint_id: u8) -> Result<Option<i32>, DriverError> {
        (**self).get_encoder(joint_id)
    }

    fn set_encoder(&mut self, joint_id: u8, value: i32, speed: u32) -> Result<(), DriverError> {
        (**self).set_encoder(joint_id, value, speed)
    }

    fn set_gripper_calibration(&mut self) -> Result<(), DriverError> {
        (**self).set_gripper_calibration()
    }

    fn get_gripper_value(&mut self) -> Result<Option<u8>, DriverError> {
        (**self).get_gripper_value()
    }

    fn set_gripper_value(&mut self, value: u8, speed: u32) -> Result<(), DriverError> {
        (**self).set_gripper_value(value, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_op_names_unique() {
        let names: HashSet<_> = EndpointOp::ALL.iter().map(|op| op.name()).collect();
        assert_eq!(names.len(), EndpointOp::ALL.len());
    }

    #[test]
    fn test_query_ops() {
        let queries: Vec<_> = EndpointOp::ALL.iter().filter(|op| op.is_query()).collect();
        assert_eq!(queries.len(), 5);
        assert_eq!(EndpointOp::GetEncoder.to_string(), "get_encoder");
    }
}
