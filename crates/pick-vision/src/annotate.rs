//! 检测结果标注（预览图）

use crate::detect::{Detection, bbox_center};
use crate::error::VisionError;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::fs;
use std::path::Path;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTER_RADIUS: i32 = 4;
const LABEL_SCALE: f32 = 18.0;

/// 标签文字：`"{name} {conf:.2}"`，有机器人坐标时追加 `" | robot=(x,y)mm"`
pub fn label_text(detection: &Detection) -> String {
    let mut text = format!("{} {:.2}", detection.class_name, detection.confidence);
    if let Some((x, y)) = detection.robot_location {
        text.push_str(&format!(" | robot=({x:.1},{y:.1})mm"));
    }
    text
}

/// 标签位置：默认在框下方；贴近底边时挪到框上方，再贴近顶边则放进框内
pub fn label_position(detection: &Detection, image_height: u32) -> (i32, i32) {
    let bbox = &detection.bbox_pixel;
    let tx = bbox.x1;
    let mut ty = bbox.y2 + 20;
    if ty > image_height as i32 - 10 {
        ty = bbox.y1 - 10;
        if ty < 15 {
            ty = bbox.y1 + 15;
        }
    }
    (tx, ty)
}

/// 标注器
///
/// 没有字体时只画框和中心点。
#[derive(Default)]
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 TTF/OTF 文件加载标签字体
    pub fn with_font_file<P: AsRef<Path>>(path: P) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| VisionError::io(path, e))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| VisionError::Font(format!("{}: {e}", path.display())))?;
        Ok(Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// 在图像上原地绘制所有检测
    pub fn draw(&self, image: &mut RgbImage, detections: &[Detection]) {
        let height = image.height();
        for detection in detections {
            let bbox = &detection.bbox_pixel;

            // 线宽 2：外框加内缩一像素
            for inset in 0..2 {
                let w = bbox.width() - 2 * inset;
                let h = bbox.height() - 2 * inset;
                if w > 0 && h > 0 {
                    let rect = Rect::at(bbox.x1 + inset, bbox.y1 + inset).of_size(w as u32, h as u32);
                    draw_hollow_rect_mut(image, rect, BOX_COLOR);
                }
            }

            let (cx, cy) = detection.center.unwrap_or_else(|| bbox_center(bbox));
            draw_filled_circle_mut(
                image,
                (cx.round() as i32, cy.round() as i32),
                CENTER_RADIUS,
                CENTER_COLOR,
            );

            if let Some(font) = &self.font {
                let (tx, ty) = label_position(detection, height);
                // draw_text_mut 以左上角定位，ty 为基线
                let top = ty - LABEL_SCALE as i32;
                draw_text_mut(
                    image,
                    BOX_COLOR,
                    tx,
                    top,
                    PxScale::from(LABEL_SCALE),
                    font,
                    &label_text(detection),
                );
            }
        }
    }

    /// 绘制后另存
    pub fn save_preview<P: AsRef<Path>>(
        &self,
        frame: &RgbImage,
        detections: &[Detection],
        path: P,
    ) -> Result<(), VisionError> {
        let mut canvas = frame.clone();
        self.draw(&mut canvas, detections);
        canvas.save(path.as_ref())?;
        Ok(())
    }
}
