//! 客户端接口模块
//!
//! 本模块提供桌面机械臂的用户友好接口，包括：
//! - 连接检查（所有操作前检查连接标志，存活探测失败返回降级状态）
//! - 关节 / 世界坐标运动（位姿长度与数值校验）
//! - 夹爪读-验-重发协议与可取消的无限重试
//! - 抓取 / 放置动作编排、位姿记录
//!
//! # 使用场景
//!
//! 这是大多数用户应该使用的模块。
//! 如果需要直接发送协议帧，可以使用 `cobot-driver` 的 [`RobotEndpoint`](cobot_driver::RobotEndpoint)。

pub mod builder;
pub mod controller;
pub mod error;
pub mod gripper;
mod motion;

// 重新导出常用类型
pub use builder::{ControllerBuilder, TcpController};
pub use controller::{CobotController, ConnectStatus, MotionParams, POSE_LEN, validate_pose};
pub use error::ClientError;
pub use gripper::{GripperAction, GripperConfig};

pub use cobot_driver::MoveMode;
