//! Mock 端点
//!
//! 用于测试的模拟机械臂：记录所有调用，位姿命令直接生效，
//! 夹爪编码器行为可脚本化。`Clone` 出来的句柄共享同一份状态，
//! 端点被移动进控制器后测试代码仍可检查。

use crate::endpoint::RobotEndpoint;
use crate::error::DriverError;
use crate::GRIPPER_ENCODER_ID;
use cobot_protocol::MoveMode;
use cobot_transport::TransportError;
use parking_lot::Mutex;
use std::sync::Arc;

/// 记录下来的端点调用
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointCall {
    Open,
    Close,
    IsControllerConnected,
    PowerOn,
    PowerOff,
    FocusAllServos,
    ReleaseAllServos,
    Stop,
    GoHome { speed: u32 },
    SendAngles { angles: [f64; 6], speed: u32 },
    SendCoords { coords: [f64; 6], speed: u32, mode: MoveMode },
    GetAngles,
    GetCoords,
    GetEncoder { joint_id: u8 },
    SetEncoder { joint_id: u8, value: i32, speed: u32 },
    SetGripperCalibration,
    GetGripperValue,
    SetGripperValue { value: u8, speed: u32 },
}

/// 夹爪编码器的模拟行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperBehavior {
    /// 每次命令后编码器立即到达目标
    Follows,
    /// 只有第 n 次（从 1 计）夹爪命令生效，之前的命令被"吞掉"
    MovesOnAttempt(usize),
    /// 命令从不生效
    Stuck,
    /// 编码器读取始终失败
    Unavailable,
}

/// 模拟机械臂状态
#[derive(Debug, Clone)]
pub struct MockState {
    pub calls: Vec<EndpointCall>,
    pub open: bool,
    /// `open()` 是否失败
    pub refuse_open: bool,
    /// 存活探测是否返回 true
    pub controller_responsive: bool,
    pub angles: Option<[f64; 6]>,
    pub coords: Option<[f64; 6]>,
    pub encoder: i32,
    pub gripper: GripperBehavior,
    /// 已收到的夹爪编码器命令数
    pub gripper_commands: usize,
    pub gripper_value: u8,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            open: false,
            refuse_open: false,
            controller_responsive: true,
            angles: Some([0.0; 6]),
            coords: Some([170.0, 0.0, 290.0, -92.0, 44.0, -90.0]),
            encoder: 2048,
            gripper: GripperBehavior::Follows,
            gripper_commands: 0,
            gripper_value: 0,
        }
    }
}

/// Mock 端点
#[derive(Debug, Clone, Default)]
pub struct MockEndpoint {
    state: Arc<Mutex<MockState>>,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MockState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// 共享状态句柄
    pub fn state(&self) -> Arc<Mutex<MockState>> {
        self.state.clone()
    }

    /// 调用记录快照
    pub fn calls(&self) -> Vec<EndpointCall> {
        self.state.lock().calls.clone()
    }

    /// 满足条件的调用次数
    pub fn count(&self, pred: impl Fn(&EndpointCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn set_gripper(&self, behavior: GripperBehavior) {
        self.state.lock().gripper = behavior;
    }

    /// 夹爪编码器命令次数
    pub fn gripper_commands(&self) -> usize {
        self.count(|c| {
            matches!(c, EndpointCall::SetEncoder { joint_id, .. } if *joint_id == GRIPPER_ENCODER_ID)
        })
    }

    /// 夹爪标定次数
    pub fn calibrations(&self) -> usize {
        self.count(|c| matches!(c, EndpointCall::SetGripperCalibration))
    }

    fn record(&self, call: EndpointCall) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let is_open_call = matches!(call, EndpointCall::Open | EndpointCall::Close);
        state.calls.push(call);
        if !is_open_call && !state.open {
            return Err(DriverError::NotOpen);
        }
        Ok(())
    }
}

impl RobotEndpoint for MockEndpoint {
    fn open(&mut self) -> Result<(), DriverError> {
        self.record(EndpointCall::Open)?;
        let mut state = self.state.lock();
        if state.refuse_open {
            return Err(TransportError::NotConnected.into());
        }
        state.open = true;
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.record(EndpointCall::Close);
        self.state.lock().open = false;
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn is_controller_connected(&mut self) -> Result<bool, DriverError> {
        self.record(EndpointCall::IsControllerConnected)?;
        Ok(self.state.lock().controller_responsive)
    }

    fn power_on(&mut self) -> Result<(), DriverError> {
        self.record(EndpointCall::PowerOn)
    }

    fn power_off(&mut self) -> Result<(), DriverError> {
        self.record(EndpointCall::PowerOff)
    }

    fn focus_all_servos(&mut self) -> Result<(), DriverError> {
        self.record(EndpointCall::FocusAllServos)
    }

    fn release_all_servos(&mut self) -> Result<(), DriverError> {
        self.record(EndpointCall::ReleaseAllServos)
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        self.record(EndpointCall::Stop)
    }

    fn go_home(&mut self, speed: u32) -> Result<(), DriverError> {
        self.record(EndpointCall::GoHome { speed })?;
        self.state.lock().angles = Some([0.0; 6]);
        Ok(())
    }

    fn send_angles(&mut self, angles_deg: &[f64; 6], speed: u32) -> Result<(), DriverError> {
        self.record(EndpointCall::SendAngles {
            angles: *angles_deg,
            speed,
        })?;
        self.state.lock().angles = Some(*angles_deg);
        Ok(())
    }

    fn send_coords(
        &mut self,
        coords: &[f64; 6],
        speed: u32,
        mode: MoveMode,
    ) -> Result<(), DriverError> {
        self.record(EndpointCall::SendCoords {
            coords: *coords,
            speed,
            mode,
        })?;
        self.state.lock().coords = Some(*coords);
        Ok(())
    }

    fn get_angles(&mut self) -> Result<Option<[f64; 6]>, DriverError> {
        self.record(EndpointCall::GetAngles)?;
        Ok(self.state.lock().angles)
    }

    fn get_coords(&mut self) -> Result<Option<[f64; 6]>, DriverError> {
        self.record(EndpointCall::GetCoords)?;
        Ok(self.state.lock().coords)
    }

    fn get_encoder(&mut self, joint_id: u8) -> Result<Option<i32>, DriverError> {
        self.record(EndpointCall::GetEncoder { joint_id })?;
        let state = self.state.lock();
        if joint_id == GRIPPER_ENCODER_ID && state.gripper == GripperBehavior::Unavailable {
            return Ok(None);
        }
        Ok(Some(state.encoder))
    }

    fn set_encoder(&mut self, joint_id: u8, value: i32, speed: u32) -> Result<(), DriverError> {
        self.record(EndpointCall::SetEncoder {
            joint_id,
            value,
            speed,
        })?;
        if joint_id != GRIPPER_ENCODER_ID {
            return Ok(());
        }
        let mut state = self.state.lock();
        state.gripper_commands += 1;
        let takes_effect = match state.gripper {
            GripperBehavior::Follows => true,
            GripperBehavior::MovesOnAttempt(n) => state.gripper_commands == n,
            GripperBehavior::Stuck | GripperBehavior::Unavailable => false,
        };
        if takes_effect {
            state.encoder = value;
        }
        Ok(())
    }

    fn set_gripper_calibration(&mut self) -> Result<(), DriverError> {
        self.record(EndpointCall::SetGripperCalibration)
    }

    fn get_gripper_value(&mut self) -> Result<Option<u8>, DriverError> {
        self.record(EndpointCall::GetGripperValue)?;
        Ok(Some(self.state.lock().gripper_value))
    }

    fn set_gripper_value(&mut self, value: u8, speed: u32) -> Result<(), DriverError> {
        self.record(EndpointCall::SetGripperValue { value, speed })?;
        self.state.lock().gripper_value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_requires_open() {
        let mut mock = MockEndpoint::new();
        assert!(matches!(mock.power_on(), Err(DriverError::NotOpen)));
        mock.open().unwrap();
        mock.power_on().unwrap();
        assert_eq!(
            mock.calls(),
            vec![EndpointCall::PowerOn, EndpointCall::Open, EndpointCall::PowerOn]
        );
    }

    #[test]
    fn test_mock_gripper_moves_on_third_attempt() {
        let mut mock = MockEndpoint::new();
        mock.set_gripper(GripperBehavior::MovesOnAttempt(3));
        mock.open().unwrap();

        mock.set_encoder(GRIPPER_ENCODER_ID, 1248, 100).unwrap();
        mock.set_encoder(GRIPPER_ENCODER_ID, 1248, 100).unwrap();
        assert_eq!(mock.get_encoder(GRIPPER_ENCODER_ID).unwrap(), Some(2048));
        mock.set_encoder(GRIPPER_ENCODER_ID, 1248, 100).unwrap();
        assert_eq!(mock.get_encoder(GRIPPER_ENCODER_ID).unwrap(), Some(1248));
        assert_eq!(mock.gripper_commands(), 3);
    }

    #[test]
    fn test_mock_clone_shares_state() {
        let mock = MockEndpoint::new();
        let mut moved = mock.clone();
        moved.open().unwrap();
        moved
            .send_coords(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 10, MoveMode::Linear)
            .unwrap();
        assert_eq!(
            mock.state().lock().coords,
            Some([1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
    }
}
