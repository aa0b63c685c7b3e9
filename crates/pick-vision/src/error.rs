//! 视觉管线错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 视觉模块错误类型
#[derive(Error, Debug)]
pub enum VisionError {
    /// 文件读写失败
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析 / 序列化失败
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 图像解码失败
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// 单应矩阵不是 3×3
    #[error("Invalid homography shape: {rows}x{cols}, expected 3x3")]
    InvalidMatrixShape { rows: usize, cols: usize },

    /// 像素点与世界点数量不一致
    #[error("Point count mismatch: {pixel} pixel points vs {world} world points")]
    PointCountMismatch { pixel: usize, world: usize },

    /// 对应点不足
    #[error("At least 4 point correspondences required, got {0}")]
    TooFewPoints(usize),

    /// 对应点退化（共线等），无法求解
    #[error("Degenerate point correspondences")]
    DegenerateCorrespondences,

    /// 投影后齐次坐标 w 接近 0
    #[error("Degenerate projection at pixel ({u:.2}, {v:.2})")]
    DegenerateProjection { u: f64, v: f64 },

    /// 相机标定数据无效
    #[error("Invalid camera calibration: {0}")]
    InvalidCalibration(String),

    /// 检测模型错误
    #[error("Model error: {0}")]
    Model(String),

    /// 图像源没有更多帧
    #[error("Frame source exhausted")]
    SourceExhausted,

    /// 字体文件无效
    #[error("Invalid font: {0}")]
    Font(String),
}

impl VisionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
