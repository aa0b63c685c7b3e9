//! 基于 socket 传输的端点实现

use crate::endpoint::{EndpointOp, RobotEndpoint};
use crate::error::DriverError;
use cobot_protocol::{
    CobotFrame, MoveMode, ProtocolCode, ProtocolError, control, decode_angles, decode_coords,
    decode_encoder, decode_flag, decode_gripper_value,
};
use cobot_transport::{Transport, TransportError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 端点配置
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// 读取类请求的应答超时
    pub reply_timeout: Duration,
    /// 建立连接的超时
    pub connect_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

type Connector<T> = Box<dyn FnMut() -> Result<T, TransportError> + Send>;

/// Socket 端点
///
/// 持有一个"连接器"而不是现成的传输：`open()` 时才真正建立链路，
/// `close()` 后可以再次 `open()`。
pub struct SocketEndpoint<T: Transport> {
    connector: Connector<T>,
    transport: Option<T>,
    config: EndpointConfig,
}

impl<T: Transport + Send> SocketEndpoint<T> {
    /// 使用连接器创建（尚未打开）
    pub fn new<F>(connector: F, config: EndpointConfig) -> Self
    where
        F: FnMut() -> Result<T, TransportError> + Send + 'static,
    {
        Self {
            connector: Box::new(connector),
            transport: None,
            config,
        }
    }

    /// 包装一个已经建立的传输（视为已打开，无法重连）
    pub fn with_transport(transport: T, config: EndpointConfig) -> Self {
        Self {
            connector: Box::new(|| Err(TransportError::NotConnected)),
            transport: Some(transport),
            config,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn transport(&mut self) -> Result<&mut T, DriverError> {
        self.transport.as_mut().ok_or(DriverError::NotOpen)
    }

    fn command(&mut self, op: EndpointOp, frame: CobotFrame) -> Result<(), DriverError> {
        debug!(%op, "Endpoint command");
        self.transport()?.send(&frame)?;
        Ok(())
    }

    /// 发送读取请求；超时视为"无应答"而不是错误
    fn query(&mut self, op: EndpointOp, frame: CobotFrame) -> Result<Option<CobotFrame>, DriverError> {
        let timeout = self.config.reply_timeout;
        match self.transport()?.request(&frame, timeout) {
            Ok(reply) => Ok(Some(reply)),
            Err(TransportError::Timeout) => {
                warn!(%op, ?timeout, "No reply from controller");
                Ok(None)
            },
            Err(e) => Err(e.into()),
        }
    }

    fn decoded<V>(
        op: EndpointOp,
        reply: Option<CobotFrame>,
        decode: impl FnOnce(&CobotFrame) -> Result<V, ProtocolError>,
    ) -> Option<V> {
        let reply = reply?;
        match decode(&reply) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%op, error = %e, "Malformed reply");
                None
            },
        }
    }
}

impl<T: Transport + Send> RobotEndpoint for SocketEndpoint<T> {
    fn open(&mut self) -> Result<(), DriverError> {
        if self.transport.is_some() {
            return Ok(());
        }
        let transport = (self.connector)()?;
        self.transport = Some(transport);
        info!(op = %EndpointOp::Connect, "Endpoint opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("Endpoint closed");
        }
    }

    fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    fn is_controller_connected(&mut self) -> Result<bool, DriverError> {
        let op = EndpointOp::IsControllerConnected;
        let reply = self.query(op, control::is_controller_connected())?;
        let flag = Self::decoded(op, reply, |f| {
            decode_flag(f, ProtocolCode::IsControllerConnected)
        });
        Ok(flag == Some(1))
    }

    fn power_on(&mut self) -> Result<(), DriverError> {
        self.command(EndpointOp::PowerOn, control::power_on())
    }

    fn power_off(&mut self) -> Result<(), DriverError> {
        self.command(EndpointOp::PowerOff, control::power_off())
    }

    fn focus_all_servos(&mut self) -> Result<(), DriverError> {
        self.command(EndpointOp::FocusAllServos, control::focus_all_servos())
    }

    fn release_all_servos(&mut self) -> Result<(), DriverError> {
        self.command(EndpointOp::ReleaseAllServos, control::release_all_servos())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        self.command(EndpointOp::Stop, control::stop())
    }

    fn go_home(&mut self, speed: u32) -> Result<(), DriverError> {
        self.command(EndpointOp::GoHome, control::send_angles(&[0.0; 6], speed)?)
    }

    fn send_angles(&mut self, angles_deg: &[f64; 6], speed: u32) -> Result<(), DriverError> {
        self.command(EndpointOp::SendAngles, control::send_angles(angles_deg, speed)?)
    }

    fn send_coords(
        &mut self,
        coords: &[f64; 6],
        speed: u32,
        mode: MoveMode,
    ) -> Result<(), DriverError> {
        self.command(
            EndpointOp::SendCoords,
            control::send_coords(coords, speed, mode)?,
        )
    }

    fn get_angles(&mut self) -> Result<Option<[f64; 6]>, DriverError> {
        let op = EndpointOp::GetAngles;
        let reply = self.query(op, control::get_angles())?;
        Ok(Self::decoded(op, reply, decode_angles))
    }

    fn get_coords(&mut self) -> Result<Option<[f64; 6]>, DriverError> {
        let op = EndpointOp::GetCoords;
        let reply = self.query(op, control::get_coords())?;
        Ok(Self::decoded(op, reply, decode_coords))
    }

    fn get_encoder(&mut self, joint_id: u8) -> Result<Option<i32>, DriverError> {
        let op = EndpointOp::GetEncoder;
        let reply = self.query(op, control::get_encoder(joint_id))?;
        let value = Self::decoded(op, reply, decode_encoder);
        Ok(value.filter(|v| *v != -1).map(i32::from))
    }

    fn set_encoder(&mut self, joint_id: u8, value: i32, speed: u32) -> Result<(), DriverError> {
        let raw = i16::try_from(value).map_err(|_| ProtocolError::ValueOutOfRange {
            field: "encoder",
            value: value as f64,
        })?;
        self.command(
            EndpointOp::SetEncoder,
            control::set_encoder(joint_id, raw, speed),
        )
    }

    fn set_gripper_calibration(&mut self) -> Result<(), DriverError> {
        self.command(
            EndpointOp::SetGripperCalibration,
            control::set_gripper_calibration(),
        )
    }

    fn get_gripper_value(&mut self) -> Result<Option<u8>, DriverError> {
        let op = EndpointOp::GetGripperValue;
        let reply = self.query(op, control::get_gripper_value())?;
        let value = Self::decoded(op, reply, decode_gripper_value);
        Ok(value.and_then(|v| u8::try_from(v).ok()))
    }

    fn set_gripper_value(&mut self, value: u8, speed: u32) -> Result<(), DriverError> {
        self.command(
            EndpointOp::SetGripperValue,
            control::set_gripper_value(value, speed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobot_protocol::i16_to_bytes_be;
    use cobot_transport::MockTransport;

    fn coords_reply() -> CobotFrame {
        let mut payload = Vec::new();
        for v in [2400i16, 0, 1240, 18000, 500, -13200] {
            payload.extend_from_slice(&i16_to_bytes_be(v));
        }
        CobotFrame::new(ProtocolCode::GetCoords, &payload)
    }

    fn endpoint_with<F>(responder: F) -> SocketEndpoint<MockTransport>
    where
        F: FnMut(&CobotFrame) -> Option<CobotFrame> + Send + 'static,
    {
        let config = EndpointConfig {
            reply_timeout: Duration::from_millis(5),
            ..Default::default()
        };
        SocketEndpoint::with_transport(MockTransport::new(responder), config)
    }

    #[test]
    fn test_not_open_before_connect() {
        let mut endpoint = SocketEndpoint::new(
            || Ok(MockTransport::silent()),
            EndpointConfig::default(),
        );
        assert!(!endpoint.is_open());
        assert!(matches!(endpoint.power_on(), Err(DriverError::NotOpen)));

        endpoint.open().unwrap();
        assert!(endpoint.is_open());
        endpoint.power_on().unwrap();

        endpoint.close();
        assert!(!endpoint.is_open());
    }

    #[test]
    fn test_get_coords_decodes_reply() {
        let mut endpoint = endpoint_with(|frame| {
            frame.is(ProtocolCode::GetCoords).then(coords_reply)
        });
        let coords = endpoint.get_coords().unwrap().unwrap();
        assert!((coords[0] - 240.0).abs() < 1e-9);
        assert!((coords[2] - 124.0).abs() < 1e-9);
        assert!((coords[5] + 132.0).abs() < 1e-9);
    }

    #[test]
    fn test_silent_controller_reads_none() {
        let mut endpoint = endpoint_with(|_| None);
        assert_eq!(endpoint.get_angles().unwrap(), None);
        assert_eq!(endpoint.get_encoder(7).unwrap(), None);
        assert!(!endpoint.is_controller_connected().unwrap());
    }

    #[test]
    fn test_encoder_sentinel_is_none() {
        let mut endpoint = endpoint_with(|frame| {
            frame
                .is(ProtocolCode::GetEncoder)
                .then(|| CobotFrame::new(ProtocolCode::GetEncoder, &i16_to_bytes_be(-1)))
        });
        assert_eq!(endpoint.get_encoder(7).unwrap(), None);
    }

    #[test]
    fn test_malformed_reply_is_none() {
        let mut endpoint = endpoint_with(|frame| {
            frame
                .is(ProtocolCode::GetAngles)
                .then(|| CobotFrame::new(ProtocolCode::GetAngles, &[0, 1, 2]))
        });
        assert_eq!(endpoint.get_angles().unwrap(), None);
    }

    #[test]
    fn test_set_encoder_range_checked() {
        let mut endpoint = endpoint_with(|_| None);
        let err = endpoint.set_encoder(7, 70_000, 50).unwrap_err();
        assert!(matches!(err, DriverError::Protocol(_)));
        endpoint.set_encoder(7, 2048, 50).unwrap();
    }

    #[test]
    fn test_controller_connected_flag() {
        let mut endpoint = endpoint_with(|frame| {
            frame
                .is(ProtocolCode::IsControllerConnected)
                .then(|| CobotFrame::new(ProtocolCode::IsControllerConnected, &[1]))
        });
        assert!(endpoint.is_controller_connected().unwrap());
    }
}
