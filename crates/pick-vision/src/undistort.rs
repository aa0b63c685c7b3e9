//! # 镜头去畸变
//!
//! Brown-Conrady 模型（OpenCV 系数顺序 `k1, k2, p1, p2[, k3[, k4, k5, k6]]`）。
//! 输出图像沿用原相机内参，对每个输出像素求其在原图中的畸变位置再双线性采样，
//! 落在原图外的像素填黑。
//!
//! 映射表按图像尺寸缓存，尺寸不变时只计算一次。

use crate::error::VisionError;
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 相机标定数据（JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraCalibration {
    /// 3×3 内参矩阵
    pub camera_matrix: [[f64; 3]; 3],
    /// 畸变系数
    pub dist_coeffs: Vec<f64>,
}

impl CameraCalibration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| VisionError::io(path, e))?;
        let calibration: Self = serde_json::from_str(&content)?;
        calibration.validate()?;
        Ok(calibration)
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        if !matches!(self.dist_coeffs.len(), 4 | 5 | 8) {
            return Err(VisionError::InvalidCalibration(format!(
                "expected 4, 5 or 8 distortion coefficients, got {}",
                self.dist_coeffs.len()
            )));
        }
        let k = &self.camera_matrix;
        if k[0][0] <= 0.0 || k[1][1] <= 0.0 {
            return Err(VisionError::InvalidCalibration(
                "focal lengths must be positive".into(),
            ));
        }
        Ok(())
    }

    fn coeffs(&self) -> DistortionCoeffs {
        let d = |i: usize| self.dist_coeffs.get(i).copied().unwrap_or(0.0);
        DistortionCoeffs {
            k1: d(0),
            k2: d(1),
            p1: d(2),
            p2: d(3),
            k3: d(4),
            k4: d(5),
            k5: d(6),
            k6: d(7),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DistortionCoeffs {
    k1: f64,
    k2: f64,
    p1: f64,
    p2: f64,
    k3: f64,
    k4: f64,
    k5: f64,
    k6: f64,
}

impl DistortionCoeffs {
    /// 归一化坐标 → 畸变后的归一化坐标
    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let radial = (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6)
            / (1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6);
        let xd = x * radial + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * radial + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (xd, yd)
    }
}

struct RemapTable {
    width: u32,
    height: u32,
    /// 每个输出像素对应的原图位置
    map: Vec<(f32, f32)>,
}

/// 去畸变器
pub struct Undistorter {
    calibration: CameraCalibration,
    table: Option<RemapTable>,
}

impl Undistorter {
    pub fn new(calibration: CameraCalibration) -> Result<Self, VisionError> {
        calibration.validate()?;
        Ok(Self {
            calibration,
            table: None,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VisionError> {
        Self::new(CameraCalibration::load(path)?)
    }

    pub fn calibration(&self) -> &CameraCalibration {
        &self.calibration
    }

    /// 去畸变，输出尺寸与输入相同
    pub fn undistort(&mut self, frame: &RgbImage) -> RgbImage {
        let (width, height) = frame.dimensions();
        let table = match self.table.take() {
            Some(t) if t.width == width && t.height == height => t,
            _ => self.build_table(width, height),
        };

        let mut out = RgbImage::new(width, height);
        for (i, pixel) in out.pixels_mut().enumerate() {
            let (sx, sy) = table.map[i];
            *pixel = sample_bilinear(frame, sx, sy);
        }

        self.table = Some(table);
        out
    }

    /// 原图中的像素位置 → 去畸变图像中的位置（迭代求逆）
    pub fn undistort_pixel(&self, u: f64, v: f64) -> (f64, f64) {
        let (fx, fy, cx, cy, skew) = self.intrinsics();
        let coeffs = self.calibration.coeffs();

        let yd = (v - cy) / fy;
        let xd = (u - cx - skew * yd) / fx;

        let (mut x, mut y) = (xd, yd);
        for _ in 0..20 {
            let (dx, dy) = coeffs.distort(x, y);
            x -= dx - xd;
            y -= dy - yd;
        }
        (fx * x + skew * y + cx, fy * y + cy)
    }

    fn intrinsics(&self) -> (f64, f64, f64, f64, f64) {
        let k = &self.calibration.camera_matrix;
        (k[0][0], k[1][1], k[0][2], k[1][2], k[0][1])
    }

    fn build_table(&self, width: u32, height: u32) -> RemapTable {
        let (fx, fy, cx, cy, skew) = self.intrinsics();
        let coeffs = self.calibration.coeffs();

        let mut map = Vec::with_capacity(width as usize * height as usize);
        for v in 0..height {
            let y = (v as f64 - cy) / fy;
            for u in 0..width {
                let x = (u as f64 - cx - skew * y) / fx;
                let (xd, yd) = coeffs.distort(x, y);
                let su = fx * xd + skew * yd + cx;
                let sv = fy * yd + cy;
                map.push((su as f32, sv as f32));
            }
        }

        RemapTable { width, height, map }
    }
}

/// 双线性采样；超出图像范围返回黑色
fn sample_bilinear(src: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    const EDGE: f32 = 1e-3;
    let (w, h) = src.dimensions();
    let (max_x, max_y) = ((w - 1) as f32, (h - 1) as f32);
    if !(x >= -EDGE && y >= -EDGE && x <= max_x + EDGE && y <= max_y + EDGE) {
        return Rgb([0, 0, 0]);
    }
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let a = p00[c] as f32 + fx * (p10[c] as f32 - p00[c] as f32);
        let b = p01[c] as f32 + fx * (p11[c] as f32 - p01[c] as f32);
        out[c] = (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration(dist: Vec<f64>) -> CameraCalibration {
        CameraCalibration {
            camera_matrix: [[500.0, 0.0, 32.0], [0.0, 500.0, 24.0], [0.0, 0.0, 1.0]],
            dist_coeffs: dist,
        }
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 3) as u8, (y * 5) as u8, 128]))
    }

    #[test]
    fn test_zero_distortion_is_identity() {
        let mut und = Undistorter::new(calibration(vec![0.0; 5])).unwrap();
        let frame = gradient(64, 48);
        let out = und.undistort(&frame);
        assert_eq!(out.dimensions(), frame.dimensions());
        assert_eq!(out, frame);
    }

    #[test]
    fn test_barrel_distortion_blackens_nothing_at_center() {
        let mut und = Undistorter::new(calibration(vec![-0.3, 0.1, 0.0, 0.0, 0.0])).unwrap();
        let frame = RgbImage::from_pixel(64, 48, Rgb([200, 200, 200]));
        let out = und.undistort(&frame);
        assert_eq!(out.get_pixel(32, 24), &Rgb([200, 200, 200]));
    }

    #[test]
    fn test_table_rebuilt_on_size_change() {
        let mut und = Undistorter::new(calibration(vec![0.1, 0.0, 0.0, 0.0])).unwrap();
        assert_eq!(und.undistort(&gradient(64, 48)).dimensions(), (64, 48));
        assert_eq!(und.undistort(&gradient(32, 16)).dimensions(), (32, 16));
    }

    #[test]
    fn test_undistort_pixel_inverts_distortion() {
        let cal = calibration(vec![-0.25, 0.08, 0.001, -0.002, 0.0]);
        let und = Undistorter::new(cal.clone()).unwrap();
        let coeffs = cal.coeffs();

        // 理想像素 → 畸变像素 → 迭代求逆回理想像素
        let (u, v) = (60.0, 40.0);
        let (x, y) = ((u - 32.0) / 500.0, (v - 24.0) / 500.0);
        let (xd, yd) = coeffs.distort(x, y);
        let (ud, vd) = (500.0 * xd + 32.0, 500.0 * yd + 24.0);

        let (ru, rv) = und.undistort_pixel(ud, vd);
        assert!((ru - u).abs() < 1e-6);
        assert!((rv - v).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_coefficient_count() {
        assert!(Undistorter::new(calibration(vec![0.0; 3])).is_err());
        assert!(Undistorter::new(calibration(vec![0.0; 8])).is_ok());
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camera_calib.json");
        std::fs::write(
            &path,
            r#"{"camera_matrix": [[600, 0, 320], [0, 600, 240], [0, 0, 1]],
                "dist_coeffs": [-0.1, 0.01, 0.0, 0.0, 0.0]}"#,
        )
        .unwrap();
        let und = Undistorter::load(&path).unwrap();
        assert_eq!(und.calibration().camera_matrix[0][2], 320.0);
    }
}
