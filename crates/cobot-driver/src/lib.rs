//! 驱动层模块
//!
//! 本模块提供机械臂控制端点的设备驱动功能，包括：
//! - [`RobotEndpoint`]：上层实际使用的端点操作（静态枚举见 [`EndpointOp`]）
//! - [`SocketEndpoint`]：基于 socket 传输和协议帧的实现
//! - [`EndpointBuilder`]：链式构造 TCP 端点
//! - [`MockEndpoint`]：无硬件的测试端点（`mock` feature）
//!
//! # 使用场景
//!
//! 大多数用户应该使用 `cobot-client` 提供的 `CobotController`，
//! 它在此之上增加了连接检查、位姿校验和夹爪容错协议。

mod builder;
mod endpoint;
mod error;
mod socket;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use builder::EndpointBuilder;
pub use endpoint::{EndpointOp, RobotEndpoint};
pub use error::DriverError;
pub use socket::{EndpointConfig, SocketEndpoint};

#[cfg(any(test, feature = "mock"))]
pub use mock::{EndpointCall, GripperBehavior, MockEndpoint, MockState};

pub use cobot_protocol::MoveMode;

/// 夹爪所在的编码器通道
pub const GRIPPER_ENCODER_ID: u8 = 7;
