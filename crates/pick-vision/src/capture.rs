//! # 后台采集 / 检测循环
//!
//! 一个后台线程不断：读帧 → 去畸变 → 检测 → 按置信度排序 → 映射框中心 →
//! 发布到 [`DetectionSlot`]。
//!
//! 槽位只保存最新一帧的结果（latest wins），没有积压；
//! 读方通过 `ArcSwap::load_full` 拿到一份完整快照，不会读到半更新的状态。

use crate::annotate::Annotator;
use crate::detect::{Detection, DetectionModel, DetectorAdapter, bbox_center, sort_by_confidence};
use crate::error::VisionError;
use crate::homography::PixelToRobotMapper;
use crate::source::FrameSource;
use crate::undistort::Undistorter;
use arc_swap::ArcSwap;
use cobot_tools::CancelToken;
use image::RgbImage;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 一次发布的检测结果
#[derive(Debug, Clone, Default)]
pub struct DetectionSnapshot {
    /// 发布序号，从 1 开始；0 表示尚未发布
    pub sequence: u64,
    /// 按置信度降序
    pub detections: Vec<Detection>,
    pub captured_at: Option<Instant>,
}

impl DetectionSnapshot {
    /// 置信度最高的检测
    pub fn best(&self) -> Option<&Detection> {
        self.detections.first()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// 最新检测结果槽位（单写多读）
#[derive(Debug)]
pub struct DetectionSlot {
    current: ArcSwap<DetectionSnapshot>,
    sequence: AtomicU64,
}

impl Default for DetectionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSlot {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(DetectionSnapshot::default()),
            sequence: AtomicU64::new(0),
        }
    }

    /// 整体替换当前结果，返回新序号
    pub fn publish(&self, detections: Vec<Detection>) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        self.current.store(Arc::new(DetectionSnapshot {
            sequence,
            detections,
            captured_at: Some(Instant::now()),
        }));
        sequence
    }

    /// 当前快照（无锁读取）
    pub fn latest(&self) -> Arc<DetectionSnapshot> {
        self.current.load_full()
    }

    pub fn sequence(&self) -> u64 {
        self.current.load().sequence
    }

    /// 等待序号大于 `after` 的快照
    ///
    /// 超时或取消时返回 `None`。
    pub fn wait_newer(
        &self,
        after: u64,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Option<Arc<DetectionSnapshot>> {
        let deadline = Instant::now() + timeout;
        loop {
            let snapshot = self.latest();
            if snapshot.sequence > after {
                return Some(snapshot);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !cancel.sleep(remaining.min(Duration::from_millis(10))) {
                return None;
            }
        }
    }
}

/// 单帧处理管线
pub struct VisionPipeline<M: DetectionModel> {
    undistorter: Option<Undistorter>,
    detector: DetectorAdapter<M>,
    mapper: Option<PixelToRobotMapper>,
    confidence_threshold: f32,
}

/// 单帧处理结果
pub struct ProcessedFrame {
    /// 去畸变后的图像（未配置去畸变时为原图）
    pub image: RgbImage,
    pub detections: Vec<Detection>,
}

impl<M: DetectionModel> VisionPipeline<M> {
    pub fn new(detector: DetectorAdapter<M>, confidence_threshold: f32) -> Self {
        Self {
            undistorter: None,
            detector,
            mapper: None,
            confidence_threshold,
        }
    }

    pub fn with_undistorter(mut self, undistorter: Undistorter) -> Self {
        self.undistorter = Some(undistorter);
        self
    }

    pub fn with_mapper(mut self, mapper: PixelToRobotMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn mapper(&self) -> Option<&PixelToRobotMapper> {
        self.mapper.as_ref()
    }

    pub fn process(&mut self, frame: RgbImage) -> Result<ProcessedFrame, VisionError> {
        let image = match self.undistorter.as_mut() {
            Some(undistorter) => undistorter.undistort(&frame),
            None => frame,
        };

        let mut detections = self.detector.infer(&image, self.confidence_threshold)?;
        sort_by_confidence(&mut detections);

        for detection in &mut detections {
            let (cx, cy) = bbox_center(&detection.bbox_pixel);
            detection.center = Some((cx, cy));
            if let Some(mapper) = &self.mapper {
                match mapper.pixel_to_robot(cx, cy) {
                    Ok(location) => detection.robot_location = Some(location),
                    Err(e) => warn!(class = %detection.class_name, "Cannot map detection center: {}", e),
                }
            }
        }

        Ok(ProcessedFrame { image, detections })
    }
}

/// 采集循环配置
pub struct CaptureConfig {
    /// 读帧失败后的等待时间
    pub read_retry_delay: Duration,
    /// 两帧之间的最小间隔
    pub frame_interval: Duration,
    /// 标注预览输出路径
    pub preview: Option<PathBuf>,
    pub annotator: Annotator,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            read_retry_delay: Duration::from_millis(500),
            frame_interval: Duration::from_millis(50),
            preview: None,
            annotator: Annotator::new(),
        }
    }
}

/// 采集线程退出时的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames: u64,
    pub read_failures: u64,
    pub process_failures: u64,
}

/// 启动后台采集线程
///
/// 线程在令牌取消或图像源耗尽时退出；读帧失败视为暂时性错误。
pub fn spawn_capture<S, M>(
    mut source: S,
    mut pipeline: VisionPipeline<M>,
    slot: Arc<DetectionSlot>,
    config: CaptureConfig,
    cancel: CancelToken,
) -> io::Result<JoinHandle<CaptureStats>>
where
    S: FrameSource + 'static,
    M: DetectionModel + 'static,
{
    thread::Builder::new().name("capture".into()).spawn(move || {
        let mut stats = CaptureStats::default();
        info!("Capture thread started");

        while !cancel.is_cancelled() {
            let frame = match source.read() {
                Ok(frame) => frame,
                Err(VisionError::SourceExhausted) => {
                    info!("Frame source exhausted");
                    break;
                },
                Err(e) => {
                    stats.read_failures += 1;
                    warn!("Frame read failed: {}", e);
                    cancel.sleep(config.read_retry_delay);
                    continue;
                },
            };

            match pipeline.process(frame) {
                Ok(processed) => {
                    stats.frames += 1;
                    if let Some(path) = &config.preview
                        && let Err(e) =
                            config.annotator.save_preview(&processed.image, &processed.detections, path)
                    {
                        warn!("Failed to write preview {}: {}", path.display(), e);
                    }
                    let count = processed.detections.len();
                    let sequence = slot.publish(processed.detections);
                    debug!(sequence, count, "Published detections");
                },
                Err(e) => {
                    stats.process_failures += 1;
                    warn!("Frame processing failed: {}", e);
                },
            }

            cancel.sleep(config.frame_interval);
        }

        info!(
            frames = stats.frames,
            read_failures = stats.read_failures,
            "Capture thread stopped"
        );
        stats
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{PixelBox, RawDetection};
    use crate::homography::{Homography, RobotOffset};

    struct ScriptedSource {
        frames: Vec<Result<RgbImage, VisionError>>,
    }

    impl FrameSource for ScriptedSource {
        fn read(&mut self) -> Result<RgbImage, VisionError> {
            if self.frames.is_empty() {
                Err(VisionError::SourceExhausted)
            } else {
                self.frames.remove(0)
            }
        }
    }

    struct FixedModel(Vec<RawDetection>);

    impl DetectionModel for FixedModel {
        fn predict(&mut self, _image: &RgbImage) -> Result<Vec<RawDetection>, VisionError> {
            Ok(self.0.clone())
        }
    }

    fn detection(confidence: f32) -> Detection {
        Detection {
            class_id: 0,
            class_name: "dice".into(),
            confidence,
            bbox_pixel: PixelBox {
                x1: 0,
                y1: 0,
                x2: 2,
                y2: 2,
            },
            bbox_normalized: [0.0; 4],
            center: None,
            robot_location: None,
        }
    }

    fn pipeline() -> VisionPipeline<FixedModel> {
        let model = FixedModel(vec![
            RawDetection {
                class_id: 0,
                confidence: 0.6,
                bbox: [10.0, 10.0, 30.0, 30.0],
            },
            RawDetection {
                class_id: 0,
                confidence: 0.9,
                bbox: [40.0, 20.0, 60.0, 40.0],
            },
        ]);
        // 像素 → 世界：缩放 0.5，再平移 (100, -50)
        let homography = Homography::from_rows([[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 1.0]]);
        VisionPipeline::new(DetectorAdapter::new(model), 0.5)
            .with_mapper(PixelToRobotMapper::new(homography, RobotOffset { x: 100.0, y: -50.0 }))
    }

    #[test]
    fn test_slot_latest_wins() {
        let slot = DetectionSlot::new();
        assert_eq!(slot.sequence(), 0);
        assert!(slot.latest().is_empty());

        slot.publish(vec![detection(0.5)]);
        slot.publish(vec![detection(0.7), detection(0.6)]);

        let latest = slot.latest();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.detections.len(), 2);
        assert_eq!(latest.best().unwrap().confidence, 0.7);
    }

    #[test]
    fn test_snapshot_survives_later_publish() {
        let slot = DetectionSlot::new();
        slot.publish(vec![detection(0.5)]);
        let held = slot.latest();
        slot.publish(Vec::new());
        assert_eq!(held.detections.len(), 1);
        assert!(slot.latest().is_empty());
    }

    #[test]
    fn test_wait_newer_times_out() {
        let slot = DetectionSlot::new();
        slot.publish(Vec::new());
        assert!(
            slot.wait_newer(1, Duration::from_millis(20), &CancelToken::new())
                .is_none()
        );
        assert!(
            slot.wait_newer(0, Duration::from_millis(20), &CancelToken::new())
                .is_some()
        );
    }

    #[test]
    fn test_process_sorts_and_maps() {
        let mut pipeline = pipeline();
        let processed = pipeline.process(RgbImage::new(100, 100)).unwrap();
        let d = &processed.detections;

        assert_eq!(d.len(), 2);
        assert_eq!(d[0].confidence, 0.9);
        assert_eq!(d[0].center, Some((50.0, 30.0)));
        let (x, y) = d[0].robot_location.unwrap();
        assert!((x - 125.0).abs() < 1e-9);
        assert!((y - -35.0).abs() < 1e-9);
    }

    #[test]
    fn test_capture_thread_survives_read_failures() {
        let source = ScriptedSource {
            frames: vec![
                Err(VisionError::Model("camera timeout".into())),
                Ok(RgbImage::new(100, 100)),
                Err(VisionError::Model("camera timeout".into())),
                Ok(RgbImage::new(100, 100)),
            ],
        };
        let slot = Arc::new(DetectionSlot::new());
        let config = CaptureConfig {
            read_retry_delay: Duration::from_millis(1),
            frame_interval: Duration::ZERO,
            ..CaptureConfig::default()
        };

        let handle =
            spawn_capture(source, pipeline(), slot.clone(), config, CancelToken::new()).unwrap();
        let stats = handle.join().unwrap();

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.read_failures, 2);
        assert_eq!(slot.sequence(), 2);
        assert_eq!(slot.latest().detections.len(), 2);
    }

    #[test]
    fn test_capture_thread_stops_on_cancel() {
        struct Endless;
        impl FrameSource for Endless {
            fn read(&mut self) -> Result<RgbImage, VisionError> {
                Ok(RgbImage::new(8, 8))
            }
        }

        let slot = Arc::new(DetectionSlot::new());
        let cancel = CancelToken::new();
        let config = CaptureConfig {
            frame_interval: Duration::from_millis(1),
            ..CaptureConfig::default()
        };
        let handle = spawn_capture(Endless, pipeline(), slot.clone(), config, cancel.clone()).unwrap();

        assert!(
            slot.wait_newer(0, Duration::from_secs(5), &CancelToken::new())
                .is_some()
        );
        cancel.cancel();
        let stats = handle.join().unwrap();
        assert!(stats.frames >= 1);
    }
}
