//! 控制帧构建
//!
//! 数值编码：
//! - 关节角：度 × 100，i16
//! - 世界坐标：x/y/z 为 mm × 10，rx/ry/rz 为度 × 100，i16
//! - 速度：1..=100（百分比）

use crate::{CobotFrame, MoveMode, ProtocolCode, ProtocolError, i16_to_bytes_be};

/// 关节角缩放系数
pub const ANGLE_SCALE: f64 = 100.0;

/// 位置（mm）缩放系数
pub const POSITION_SCALE: f64 = 10.0;

/// 限制速度到协议允许的范围
pub fn clamp_speed(speed: u32) -> u8 {
    speed.clamp(1, 100) as u8
}

fn encode_scaled(field: &'static str, value: f64, scale: f64) -> Result<[u8; 2], ProtocolError> {
    let scaled = (value * scale).round();
    if !scaled.is_finite() || scaled < i16::MIN as f64 || scaled > i16::MAX as f64 {
        return Err(ProtocolError::ValueOutOfRange { field, value });
    }
    Ok(i16_to_bytes_be(scaled as i16))
}

fn simple(code: ProtocolCode) -> CobotFrame {
    CobotFrame::new(code, &[])
}

pub fn power_on() -> CobotFrame {
    simple(ProtocolCode::PowerOn)
}

pub fn power_off() -> CobotFrame {
    simple(ProtocolCode::PowerOff)
}

pub fn focus_all_servos() -> CobotFrame {
    simple(ProtocolCode::FocusAllServos)
}

pub fn release_all_servos() -> CobotFrame {
    simple(ProtocolCode::ReleaseAllServos)
}

pub fn is_controller_connected() -> CobotFrame {
    simple(ProtocolCode::IsControllerConnected)
}

pub fn stop() -> CobotFrame {
    simple(ProtocolCode::Stop)
}

pub fn get_angles() -> CobotFrame {
    simple(ProtocolCode::GetAngles)
}

pub fn get_coords() -> CobotFrame {
    simple(ProtocolCode::GetCoords)
}

pub fn set_gripper_calibration() -> CobotFrame {
    simple(ProtocolCode::SetGripperCalibration)
}

pub fn get_gripper_value() -> CobotFrame {
    simple(ProtocolCode::GetGripperValue)
}

/// 绝对关节角命令
pub fn send_angles(angles_deg: &[f64; 6], speed: u32) -> Result<CobotFrame, ProtocolError> {
    let mut payload = Vec::with_capacity(13);
    for &angle in angles_deg {
        payload.extend_from_slice(&encode_scaled("angle", angle, ANGLE_SCALE)?);
    }
    payload.push(clamp_speed(speed));
    Ok(CobotFrame::new(ProtocolCode::SendAngles, &payload))
}

/// 绝对世界坐标命令 `[x, y, z, rx, ry, rz]`
pub fn send_coords(
    coords: &[f64; 6],
    speed: u32,
    mode: MoveMode,
) -> Result<CobotFrame, ProtocolError> {
    let mut payload = Vec::with_capacity(14);
    for &position in &coords[..3] {
        payload.extend_from_slice(&encode_scaled("position", position, POSITION_SCALE)?);
    }
    for &rotation in &coords[3..] {
        payload.extend_from_slice(&encode_scaled("rotation", rotation, ANGLE_SCALE)?);
    }
    payload.push(clamp_speed(speed));
    payload.push(mode.into());
    Ok(CobotFrame::new(ProtocolCode::SendCoords, &payload))
}

/// 读取指定关节编码器
pub fn get_encoder(joint_id: u8) -> CobotFrame {
    CobotFrame::new(ProtocolCode::GetEncoder, &[joint_id])
}

/// 设置指定关节编码器目标位置
pub fn set_encoder(joint_id: u8, value: i16, speed: u32) -> CobotFrame {
    let bytes = i16_to_bytes_be(value);
    CobotFrame::new(
        ProtocolCode::SetEncoder,
        &[joint_id, bytes[0], bytes[1], clamp_speed(speed)],
    )
}

/// 通用夹爪开合值（0..=100）
pub fn set_gripper_value(value: u8, speed: u32) -> CobotFrame {
    CobotFrame::new(
        ProtocolCode::SetGripperValue,
        &[value.min(100), clamp_speed(speed)],
    )
}
