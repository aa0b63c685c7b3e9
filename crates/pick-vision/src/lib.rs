//! 视觉模块
//!
//! 本模块负责从图像到机器人坐标的整条链路：
//! - 镜头去畸变（相机内参 + Brown-Conrady 畸变系数）
//! - 像素 → 工作台世界坐标的单应映射，再平移到机器人基座坐标
//! - 检测适配（置信度过滤、框裁剪、类别名）
//! - 后台采集线程与"最新结果"槽位
//!
//! 检测模型通过 [`DetectionModel`] 接入；启用 `onnx` feature 后提供 YOLO 后端。

pub mod annotate;
pub mod capture;
pub mod detect;
mod error;
pub mod homography;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod source;
pub mod undistort;

pub use annotate::Annotator;
pub use capture::{
    CaptureConfig, CaptureStats, DetectionSlot, DetectionSnapshot, ProcessedFrame, VisionPipeline,
    spawn_capture,
};
pub use detect::{Detection, DetectionModel, DetectorAdapter, PixelBox, RawDetection, bbox_center};
pub use error::VisionError;
pub use homography::{
    CalibrationPoint, Homography, HomographyRecord, PixelToRobotMapper, RobotOffset,
};
#[cfg(feature = "onnx")]
pub use onnx::YoloOnnxModel;
pub use source::{FrameSource, ImageDirSource, SnapshotSource, open_source};
pub use undistort::{CameraCalibration, Undistorter};
