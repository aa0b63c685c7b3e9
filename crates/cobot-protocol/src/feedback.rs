//! 应答帧解析

use crate::control::{ANGLE_SCALE, POSITION_SCALE};
use crate::{CobotFrame, ProtocolCode, ProtocolError, bytes_to_i16_be};

fn expect_code(frame: &CobotFrame, code: ProtocolCode) -> Result<(), ProtocolError> {
    if frame.is(code) {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedCode {
            expected: code.into(),
            actual: frame.code,
        })
    }
}

fn expect_len(frame: &CobotFrame, code: ProtocolCode, expected: usize) -> Result<(), ProtocolError> {
    if frame.payload.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::InvalidLength {
            code,
            expected,
            actual: frame.payload.len(),
        })
    }
}

fn read_i16s(payload: &[u8]) -> [i16; 6] {
    let mut out = [0i16; 6];
    for (i, chunk) in payload.chunks_exact(2).take(6).enumerate() {
        out[i] = bytes_to_i16_be([chunk[0], chunk[1]]);
    }
    out
}

/// 解析关节角应答（度）
pub fn decode_angles(frame: &CobotFrame) -> Result<[f64; 6], ProtocolError> {
    expect_code(frame, ProtocolCode::GetAngles)?;
    expect_len(frame, ProtocolCode::GetAngles, 12)?;
    Ok(read_i16s(&frame.payload).map(|raw| raw as f64 / ANGLE_SCALE))
}

/// 解析世界坐标应答 `[x, y, z, rx, ry, rz]`（mm / 度）
pub fn decode_coords(frame: &CobotFrame) -> Result<[f64; 6], ProtocolError> {
    expect_code(frame, ProtocolCode::GetCoords)?;
    expect_len(frame, ProtocolCode::GetCoords, 12)?;
    let raw = read_i16s(&frame.payload);
    let mut coords = [0.0; 6];
    for i in 0..3 {
        coords[i] = raw[i] as f64 / POSITION_SCALE;
    }
    for i in 3..6 {
        coords[i] = raw[i] as f64 / ANGLE_SCALE;
    }
    Ok(coords)
}

/// 解析编码器应答
///
/// 控制器对读取失败返回 `-1`，调用方自行判断。
pub fn decode_encoder(frame: &CobotFrame) -> Result<i16, ProtocolError> {
    expect_code(frame, ProtocolCode::GetEncoder)?;
    expect_len(frame, ProtocolCode::GetEncoder, 2)?;
    Ok(bytes_to_i16_be([frame.payload[0], frame.payload[1]]))
}

/// 解析单字节状态应答（1 = 是，0 = 否，-1 = 无应答）
pub fn decode_flag(frame: &CobotFrame, code: ProtocolCode) -> Result<i8, ProtocolError> {
    expect_code(frame, code)?;
    expect_len(frame, code, 1)?;
    Ok(frame.payload[0] as i8)
}

/// 解析夹爪开合值应答
pub fn decode_gripper_value(frame: &CobotFrame) -> Result<i8, ProtocolError> {
    decode_flag(frame, ProtocolCode::GetGripperValue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i16_to_bytes_be;

    fn frame_of(code: ProtocolCode, values: &[i16]) -> CobotFrame {
        let mut payload = Vec::new();
        for v in values {
            payload.extend_from_slice(&i16_to_bytes_be(*v));
        }
        CobotFrame::new(code, &payload)
    }

    #[test]
    fn test_decode_angles() {
        let frame = frame_of(ProtocolCode::GetAngles, &[0, 9000, -9000, 150, 0, 18000]);
        let angles = decode_angles(&frame).unwrap();
        assert_eq!(angles, [0.0, 90.0, -90.0, 1.5, 0.0, 180.0]);
    }

    #[test]
    fn test_decode_coords_scaling() {
        let frame = frame_of(ProtocolCode::GetCoords, &[2547, 38, 1240, 18000, 500, -13200]);
        let coords = decode_coords(&frame).unwrap();
        assert!((coords[0] - 254.7).abs() < 1e-9);
        assert!((coords[1] - 3.8).abs() < 1e-9);
        assert!((coords[2] - 124.0).abs() < 1e-9);
        assert!((coords[3] - 180.0).abs() < 1e-9);
        assert!((coords[4] - 5.0).abs() < 1e-9);
        assert!((coords[5] + 132.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_wrong_code() {
        let frame = frame_of(ProtocolCode::GetCoords, &[0; 6]);
        let err = decode_angles(&frame).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedCode {
                expected: 0x20,
                actual: 0x23
            }
        ));
    }

    #[test]
    fn test_decode_short_payload() {
        let frame = frame_of(ProtocolCode::GetAngles, &[0; 3]);
        let err = decode_angles(&frame).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidLength {
                expected: 12,
                actual: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_encoder_and_flag() {
        let frame = frame_of(ProtocolCode::GetEncoder, &[-1]);
        assert_eq!(decode_encoder(&frame).unwrap(), -1);

        let flag = CobotFrame::new(ProtocolCode::IsControllerConnected, &[0xFF]);
        assert_eq!(decode_flag(&flag, ProtocolCode::IsControllerConnected).unwrap(), -1);
    }
}
