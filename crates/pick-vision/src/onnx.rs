//! YOLO ONNX 检测后端（feature `onnx`）
//!
//! 输入 `images`：`[1, 3, S, S]`，RGB，0..1；
//! 输出 `output0`：`[1, 4 + nc, N]`，每列为 `cx, cy, w, h, score_0..score_nc`。
//! 输出坐标按 `帧尺寸 / S` 缩放回原图，再做按类别的 NMS。

use crate::detect::{DetectionModel, RawDetection};
use crate::error::VisionError;
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::path::Path;
use tracing::info;

/// 低于该分数的候选在 NMS 之前丢弃
const MIN_CANDIDATE_SCORE: f32 = 0.05;

fn model_err(e: impl std::fmt::Display) -> VisionError {
    VisionError::Model(e.to_string())
}

/// YOLO ONNX 模型
pub struct YoloOnnxModel {
    session: Session,
    input_size: u32,
    iou_threshold: f32,
    class_names: Vec<String>,
}

impl YoloOnnxModel {
    pub fn load<P: AsRef<Path>>(path: P, input_size: u32, iou_threshold: f32) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(|e| VisionError::Model(format!("{}: {e}", path.display())))?;
        info!("Loaded detection model {}", path.display());
        Ok(Self {
            session,
            input_size,
            iou_threshold,
            class_names: Vec::new(),
        })
    }

    pub fn with_class_names(mut self, names: Vec<String>) -> Self {
        self.class_names = names;
        self
    }

    fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let s = self.input_size;
        let resized = imageops::resize(image, s, s, FilterType::Triangle);
        let s = s as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel.0[c] as f32 / 255.0;
            }
        }
        tensor
    }
}

impl DetectionModel for YoloOnnxModel {
    fn predict(&mut self, image: &RgbImage) -> Result<Vec<RawDetection>, VisionError> {
        let (frame_w, frame_h) = image.dimensions();
        let input = Tensor::from_array(self.preprocess(image)).map_err(model_err)?;
        let outputs = self
            .session
            .run(ort::inputs!["images" => input])
            .map_err(model_err)?;
        let output: ndarray::ArrayViewD<f32> =
            outputs["output0"].try_extract_array().map_err(model_err)?;

        let shape = output.shape();
        if shape.len() != 3 || shape[1] <= 4 {
            return Err(VisionError::Model(format!("unexpected output shape {shape:?}")));
        }
        let (channels, count) = (shape[1], shape[2]);
        let sx = frame_w as f32 / self.input_size as f32;
        let sy = frame_h as f32 / self.input_size as f32;

        let mut candidates = Vec::new();
        for i in 0..count {
            let (class_id, score) = (4..channels)
                .map(|c| (c - 4, output[[0, c, i]]))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            if score < MIN_CANDIDATE_SCORE {
                continue;
            }
            let cx = output[[0, 0, i]];
            let cy = output[[0, 1, i]];
            let w = output[[0, 2, i]];
            let h = output[[0, 3, i]];
            candidates.push(RawDetection {
                class_id,
                confidence: score,
                bbox: [
                    (cx - w / 2.0) * sx,
                    (cy - h / 2.0) * sy,
                    (cx + w / 2.0) * sx,
                    (cy + h / 2.0) * sy,
                ],
            });
        }

        Ok(non_max_suppression(candidates, self.iou_threshold))
    }

    fn class_names(&self) -> Vec<String> {
        self.class_names.clone()
    }
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = ix * iy;
    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// 按类别的贪心 NMS，输出按置信度降序
pub(crate) fn non_max_suppression(mut candidates: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
