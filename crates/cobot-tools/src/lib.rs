//! # Cobot Tools - 共享数据结构
//!
//! **依赖原则**: 不依赖任何硬件相关 crate，只包含纯数据结构和文件格式
//!
//! ## 包含模块
//!
//! - `endpoint` - 控制器地址文本文件（`"<ip>, <port>"`）
//! - `pose_log` - 示教位姿日志（JSON Lines）
//! - `settings` - 抓取放置配置（TOML）
//! - `cancel` - 跨线程取消令牌

pub mod cancel;
pub mod endpoint;
pub mod pose_log;
pub mod settings;

// 重新导出常用类型
pub use cancel::CancelToken;
pub use endpoint::EndpointAddress;
pub use pose_log::{PoseRecord, append_pose, read_poses};
pub use settings::{
    FrameSourceSettings, GripperSettings, PickPlaceSettings, PoseSettings, ReferenceSettings,
    RobotSettings, VisionSettings,
};
