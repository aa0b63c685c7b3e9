//! 按配置组装视觉管线

use anyhow::{Context, Result};
use cobot_tools::VisionSettings;
use pick_vision::{
    Annotator, CaptureConfig, DetectionModel, DetectorAdapter, FrameSource, PixelToRobotMapper,
    Undistorter, VisionPipeline, open_source,
};
use tracing::info;

pub type DynPipeline = VisionPipeline<Box<dyn DetectionModel>>;

/// 去畸变 + 检测 + 映射
pub fn build_pipeline(settings: &VisionSettings) -> Result<DynPipeline> {
    let undistorter = Undistorter::load(&settings.calibration)
        .with_context(|| format!("加载相机标定失败: {}", settings.calibration.display()))?;
    let mapper = PixelToRobotMapper::load(&settings.homography)
        .with_context(|| format!("加载单应矩阵失败: {}", settings.homography.display()))?;
    info!(
        offset_x = mapper.offset().x,
        offset_y = mapper.offset().y,
        "Loaded pixel-to-robot mapping"
    );

    let detector =
        DetectorAdapter::new(load_model(settings)?).with_class_names(settings.class_names.clone());

    Ok(VisionPipeline::new(detector, settings.confidence_threshold)
        .with_undistorter(undistorter)
        .with_mapper(mapper))
}

#[cfg(feature = "onnx")]
fn load_model(settings: &VisionSettings) -> Result<Box<dyn DetectionModel>> {
    let model = pick_vision::YoloOnnxModel::load(
        &settings.model,
        settings.input_size,
        settings.iou_threshold,
    )
    .with_context(|| format!("加载检测模型失败: {}", settings.model.display()))?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_model(settings: &VisionSettings) -> Result<Box<dyn DetectionModel>> {
    anyhow::bail!(
        "没有可用的检测后端（模型 {}），请使用 `--features onnx` 重新编译",
        settings.model.display()
    )
}

pub fn open_frame_source(settings: &VisionSettings) -> Result<Box<dyn FrameSource>> {
    open_source(&settings.source).context("打开图像源失败")
}

/// 采集线程配置：预览路径与字体
pub fn capture_config(settings: &VisionSettings) -> Result<CaptureConfig> {
    let annotator = match &settings.font {
        Some(font) => Annotator::with_font_file(font)
            .with_context(|| format!("加载字体失败: {}", font.display()))?,
        None => Annotator::new(),
    };
    Ok(CaptureConfig {
        preview: settings.preview.clone(),
        annotator,
        ..CaptureConfig::default()
    })
}
