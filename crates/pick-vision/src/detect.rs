//! # 检测适配层
//!
//! 把检测模型的原始输出整理成 [`Detection`]：
//! 按置信度过滤、框坐标夹到图像范围内、计算归一化框、补类别名。
//!
//! 返回顺序保持模型原生顺序；需要最高置信度的调用方自行排序
//! （见 [`sort_by_confidence`]）。

use crate::error::VisionError;
use image::RgbImage;
use serde::Serialize;

/// 模型输出的一个候选框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]`（像素，可能越界）
    pub bbox: [f32; 4],
}

/// 整数像素框 `(x1, y1)`-`(x2, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// 一个检测结果（每帧重新生成）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
    pub bbox_pixel: PixelBox,
    /// `[x1, y1, x2, y2]` 除以图像宽高
    pub bbox_normalized: [f32; 4],
    /// 框中心（像素），映射阶段填入
    pub center: Option<(f64, f64)>,
    /// 机器人坐标（mm），映射阶段填入
    pub robot_location: Option<(f64, f64)>,
}

/// 检测模型
pub trait DetectionModel: Send {
    fn predict(&mut self, image: &RgbImage) -> Result<Vec<RawDetection>, VisionError>;

    /// 模型自带的类别名（没有则为空）
    fn class_names(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<M: DetectionModel + ?Sized> DetectionModel for Box<M> {
    fn predict(&mut self, image: &RgbImage) -> Result<Vec<RawDetection>, VisionError> {
        (**self).predict(image)
    }

    fn class_names(&self) -> Vec<String> {
        (**self).class_names()
    }
}

/// 检测适配器
pub struct DetectorAdapter<M: DetectionModel> {
    model: M,
    names: Vec<String>,
}

impl<M: DetectionModel> DetectorAdapter<M> {
    pub fn new(model: M) -> Self {
        let names = model.class_names();
        Self { model, names }
    }

    /// 覆盖模型自带的类别名
    pub fn with_class_names(mut self, names: Vec<String>) -> Self {
        if !names.is_empty() {
            self.names = names;
        }
        self
    }

    /// 类别名；没有名字时用 id 的字符串
    pub fn class_name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }

    pub fn infer(
        &mut self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, VisionError> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Ok(Vec::new());
        }
        let raw = self.model.predict(image)?;
        Ok(raw
            .into_iter()
            .filter(|r| r.confidence >= confidence_threshold)
            .map(|r| self.to_detection(r, w, h))
            .collect())
    }

    fn to_detection(&self, raw: RawDetection, width: u32, height: u32) -> Detection {
        let (w, h) = (width as f32, height as f32);
        let [x1, y1, x2, y2] = raw.bbox;
        let x1 = x1.clamp(0.0, w - 1.0);
        let x2 = x2.clamp(0.0, w - 1.0);
        let y1 = y1.clamp(0.0, h - 1.0);
        let y2 = y2.clamp(0.0, h - 1.0);

        Detection {
            class_id: raw.class_id,
            class_name: self.class_name(raw.class_id),
            confidence: raw.confidence,
            bbox_pixel: PixelBox {
                x1: x1.round() as i32,
                y1: y1.round() as i32,
                x2: x2.round() as i32,
                y2: y2.round() as i32,
            },
            bbox_normalized: [x1 / w, y1 / h, x2 / w, y2 / h],
            center: None,
            robot_location: None,
        }
    }
}

/// 框中心：对角两点的中点
pub fn bbox_center(bbox: &PixelBox) -> (f64, f64) {
    (
        (bbox.x1 + bbox.x2) as f64 * 0.5,
        (bbox.y1 + bbox.y2) as f64 * 0.5,
    )
}

/// 按置信度降序排序（稳定）
pub fn sort_by_confidence(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Vec<RawDetection>);

    impl DetectionModel for FixedModel {
        fn predict(&mut self, _image: &RgbImage) -> Result<Vec<RawDetection>, VisionError> {
            Ok(self.0.clone())
        }
    }

    fn raw(class_id: usize, confidence: f32, bbox: [f32; 4]) -> RawDetection {
        RawDetection {
            class_id,
            confidence,
            bbox,
        }
    }

    #[test]
    fn test_confidence_filter_keeps_native_order() {
        let model = FixedModel(vec![
            raw(0, 0.3, [10.0, 10.0, 20.0, 20.0]),
            raw(1, 0.9, [30.0, 30.0, 40.0, 40.0]),
            raw(2, 0.6, [50.0, 50.0, 60.0, 60.0]),
        ]);
        let mut adapter = DetectorAdapter::new(model);
        let out = adapter.infer(&RgbImage::new(100, 100), 0.5).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].confidence, 0.9);
        assert_eq!(out[1].confidence, 0.6);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let model = FixedModel(vec![raw(0, 0.5, [0.0, 0.0, 1.0, 1.0])]);
        let mut adapter = DetectorAdapter::new(model);
        assert_eq!(adapter.infer(&RgbImage::new(10, 10), 0.5).unwrap().len(), 1);
    }

    #[test]
    fn test_clamping() {
        let model = FixedModel(vec![raw(0, 0.8, [-15.0, 400.0, 700.0, 900.0])]);
        let mut adapter = DetectorAdapter::new(model);
        let out = adapter.infer(&RgbImage::new(640, 480), 0.5).unwrap();
        let d = &out[0];

        assert_eq!(
            d.bbox_pixel,
            PixelBox {
                x1: 0,
                y1: 400,
                x2: 639,
                y2: 479
            }
        );
        for v in d.bbox_normalized {
            assert!((0.0..=1.0).contains(&v));
        }
        assert!((d.bbox_normalized[2] - 639.0 / 640.0).abs() < 1e-6);
    }

    #[test]
    fn test_class_name_fallback() {
        let model = FixedModel(vec![
            raw(0, 0.8, [0.0, 0.0, 5.0, 5.0]),
            raw(4, 0.8, [0.0, 0.0, 5.0, 5.0]),
        ]);
        let mut adapter =
            DetectorAdapter::new(model).with_class_names(vec!["dice".into(), "cube".into()]);
        let out = adapter.infer(&RgbImage::new(10, 10), 0.1).unwrap();
        assert_eq!(out[0].class_name, "dice");
        assert_eq!(out[1].class_name, "4");
    }

    #[test]
    fn test_bbox_center_and_sort() {
        let bbox = PixelBox {
            x1: 10,
            y1: 20,
            x2: 31,
            y2: 40,
        };
        assert_eq!(bbox_center(&bbox), (20.5, 30.0));

        let model = FixedModel(vec![
            raw(0, 0.6, [0.0, 0.0, 1.0, 1.0]),
            raw(1, 0.95, [0.0, 0.0, 1.0, 1.0]),
            raw(2, 0.7, [0.0, 0.0, 1.0, 1.0]),
        ]);
        let mut adapter = DetectorAdapter::new(model);
        let mut out = adapter.infer(&RgbImage::new(10, 10), 0.5).unwrap();
        sort_by_confidence(&mut out);
        let ids: Vec<_> = out.iter().map(|d| d.class_id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }
}
