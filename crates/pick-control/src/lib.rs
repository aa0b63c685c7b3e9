//! 视觉引导抓取编排
//!
//! 把视觉模块发布的检测结果（机器人坐标）换算成相对参考物体的偏移，
//! 平移示教位姿，驱动机械臂完成抓取-投放循环。

pub mod cycle;
mod error;
pub mod offset;
pub mod poses;

pub use cycle::{CycleConfig, CycleOutcome, LoopStats, PickCycle};
pub use error::ControlError;
pub use offset::{PickOffset, ReferenceOrigin};
pub use poses::{PickPoses, TargetPoses};
