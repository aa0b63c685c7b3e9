//! # 抓取放置配置
//!
//! TOML 格式，所有字段都有默认值（与演示现场的常量一致），
//! 配置文件只需写出要覆盖的项：
//!
//! ```toml
//! [robot]
//! endpoint_file = "IP_info.txt"
//! default_speed = 40
//!
//! [vision]
//! source = { kind = "directory", path = "frames" }
//! confidence_threshold = 0.5
//!
//! [reference]
//! x = 254.7
//! y = 3.8
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickPlaceSettings {
    pub robot: RobotSettings,
    pub vision: VisionSettings,
    pub poses: PoseSettings,
    pub reference: ReferenceSettings,
    pub gripper: GripperSettings,
}

impl PickPlaceSettings {
    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 序列化为 TOML（`cobot-cli config init` 用）
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置失败")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))
    }
}

/// 机械臂连接与运动参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotSettings {
    /// `"<ip>, <port>"` 地址文件
    pub endpoint_file: PathBuf,
    /// 默认速度（1..=100）
    pub default_speed: u32,
    /// 每个运动段之后的等待（毫秒）
    pub move_delay_ms: u64,
    pub reply_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self {
            endpoint_file: PathBuf::from("IP_info.txt"),
            default_speed: 40,
            move_delay_ms: 300,
            reply_timeout_ms: 500,
            connect_timeout_ms: 3000,
        }
    }
}

impl RobotSettings {
    pub fn move_delay(&self) -> Duration {
        Duration::from_millis(self.move_delay_ms)
    }
}

/// 图像来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameSourceSettings {
    /// 依次读取目录中的图片
    Directory {
        path: PathBuf,
        #[serde(default = "default_true")]
        repeat: bool,
    },
    /// 反复读取同一个文件（由外部采集程序覆盖写入）
    Snapshot { path: PathBuf },
}

fn default_true() -> bool {
    true
}

impl Default for FrameSourceSettings {
    fn default() -> Self {
        FrameSourceSettings::Snapshot {
            path: PathBuf::from("frame.jpg"),
        }
    }
}

/// 视觉管线参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// 相机内参 + 畸变系数 JSON
    pub calibration: PathBuf,
    /// 单应矩阵记录 JSON
    pub homography: PathBuf,
    /// 检测模型（ONNX）
    pub model: PathBuf,
    /// 模型输入边长
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// 类别名；为空时使用类别 id 字符串
    pub class_names: Vec<String>,
    /// 标注预览输出路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PathBuf>,
    /// 标注文字字体（TTF/OTF）；缺省时只画框
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
    pub source: FrameSourceSettings,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            calibration: PathBuf::from("camera_calibration/camera_calib.json"),
            homography: PathBuf::from("camera_calibration/homography_robot_map.json"),
            model: PathBuf::from("models/best.onnx"),
            input_size: 640,
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            class_names: Vec::new(),
            preview: None,
            font: None,
            source: FrameSourceSettings::default(),
        }
    }
}

/// 固定位姿 `[x, y, z, rx, ry, rz]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSettings {
    /// 相机观察位
    pub vantage: [f64; 6],
    /// 参考物体处的抓取位
    pub pick: [f64; 6],
    /// 接近位相对抓取位的抬升（mm）
    pub approach_lift: f64,
    /// 投放位相对抓取位的抬升（mm）
    pub throw_lift: f64,
    /// 投放位相对抓取位的 x 平移（mm）
    pub throw_shift_x: f64,
    /// 投放位是否跟随物体偏移
    pub throw_follows_offset: bool,
}

impl Default for PoseSettings {
    fn default() -> Self {
        Self {
            vantage: [170.0, 0.0, 290.0, -92.0, 44.0, -90.0],
            pick: [240.0, 0.0, 124.0, 180.0, 5.0, -132.0],
            approach_lift: 120.0,
            throw_lift: 20.0,
            throw_shift_x: 0.0,
            throw_follows_offset: false,
        }
    }
}

/// 参考物体在机器人坐标系中的位置（mm）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSettings {
    pub x: f64,
    pub y: f64,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self { x: 254.7, y: 3.8 }
    }
}

/// 夹爪编码器协议参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperSettings {
    pub encoder_id: u8,
    pub midpoint: i32,
    pub open_target: i32,
    pub close_target: i32,
    /// 初始化时相对中点的推动量
    pub init_bump: i32,
    pub init_speed: u32,
    pub speed: u32,
    /// 判定"动了"的最小编码器变化
    pub min_delta: i32,
    pub attempts: u32,
    pub timeout_ms: u64,
    pub poll_ms: u64,
    pub resend_pause_ms: u64,
    pub settle_ms: u64,
}

impl Default for GripperSettings {
    fn default() -> Self {
        Self {
            encoder_id: 7,
            midpoint: 2048,
            open_target: 2048,
            close_target: 1248,
            init_bump: 800,
            init_speed: 80,
            speed: 100,
            min_delta: 200,
            attempts: 3,
            timeout_ms: 1000,
            poll_ms: 50,
            resend_pause_ms: 100,
            settle_ms: 600,
        }
    }
}
