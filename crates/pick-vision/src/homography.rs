//! # 像素 → 机器人坐标映射
//!
//! 去畸变图像上的像素 `(u, v)` 先经 3×3 单应矩阵投影到标定板平面（mm），
//! 再加上固定平移得到机器人基座坐标：
//!
//! ```text
//! [x', y', w']ᵀ = H · [u, v, 1]ᵀ
//! world = (x'/w', y'/w')
//! robot = world + (offset_x, offset_y)
//! ```
//!
//! 标定区域之外的像素照样外推，不做边界检查。

use crate::error::VisionError;
use nalgebra::{DMatrix, Matrix3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// `|w|` 小于此值视为退化投影
const W_EPSILON: f64 = 1e-12;

/// 一对标定点：去畸变图像像素 + 标定板平面坐标（mm）
///
/// 像素和世界坐标绑定在一起，点序错位无法表达。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub pixel: [f64; 2],
    pub world: [f64; 2],
}

impl CalibrationPoint {
    pub fn new(pixel: [f64; 2], world: [f64; 2]) -> Self {
        Self { pixel, world }
    }
}

/// 平面单应
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    /// 从嵌套数组构造（JSON 读入的形状），形状必须严格为 3×3
    pub fn from_nested(rows: &[Vec<f64>]) -> Result<Self, VisionError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.len() != 3 || rows.iter().any(|r| r.len() != 3) {
            return Err(VisionError::InvalidMatrixShape {
                rows: rows.len(),
                cols,
            });
        }
        Ok(Self::new(Matrix3::from_fn(|r, c| rows[r][c])))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }

    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// 投影一个点（完整透视除法）
    pub fn apply(&self, u: f64, v: f64) -> Result<(f64, f64), VisionError> {
        let p = self.h * Vector3::new(u, v, 1.0);
        let w = p[2];
        if w.abs() < W_EPSILON {
            return Err(VisionError::DegenerateProjection { u, v });
        }
        Ok((p[0] / w, p[1] / w))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// 由像素 → 世界对应点求单应
    ///
    /// 4 个点时精确求解 8×8 线性方程；多于 4 个点时用 SVD 求最小二乘 DLT。
    /// 两种情况都先做 Hartley 归一化。
    pub fn from_correspondences(points: &[CalibrationPoint]) -> Result<Self, VisionError> {
        if points.len() < 4 {
            return Err(VisionError::TooFewPoints(points.len()));
        }

        let src: Vec<[f64; 2]> = points.iter().map(|p| p.pixel).collect();
        let dst: Vec<[f64; 2]> = points.iter().map(|p| p.world).collect();
        let (src_n, t_src) = normalize_points(&src);
        let (dst_n, t_dst) = normalize_points(&dst);
        if is_collinear(&src_n) || is_collinear(&dst_n) {
            return Err(VisionError::DegenerateCorrespondences);
        }

        let hn = if points.len() == 4 {
            solve_four_point(&src_n, &dst_n)?
        } else {
            solve_dlt(&src_n, &dst_n)?
        };

        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or(VisionError::DegenerateCorrespondences)?;
        let h = t_dst_inv * hn * t_src;

        let s = h[(2, 2)];
        if s.abs() < W_EPSILON || !h.iter().all(|v| v.is_finite()) {
            return Err(VisionError::DegenerateCorrespondences);
        }
        Ok(Self::new(h / s))
    }
}

/// Hartley 归一化：平移到质心，缩放到平均距离 √2
fn normalize_points(pts: &[[f64; 2]]) -> (Vec<[f64; 2]>, Matrix3<f64>) {
    let n = pts.len() as f64;
    let (cx, cy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (cx / n, cy / n);

    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > W_EPSILON {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let out = pts
        .iter()
        .map(|p| {
            let v = t * Vector3::new(p[0], p[1], 1.0);
            [v[0], v[1]]
        })
        .collect();
    (out, t)
}

/// 归一化后点集的二阶矩行列式接近 0 即共线
fn is_collinear(pts: &[[f64; 2]]) -> bool {
    let n = pts.len() as f64;
    let (sxx, syy, sxy) = pts.iter().fold((0.0, 0.0, 0.0), |(xx, yy, xy), p| {
        (xx + p[0] * p[0], yy + p[1] * p[1], xy + p[0] * p[1])
    });
    let det = (sxx / n) * (syy / n) - (sxy / n).powi(2);
    det.abs() < 1e-9
}

/// h33 = 1，8 个未知数
fn solve_four_point(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Matrix3<f64>, VisionError> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let [x, y] = src[k];
        let [u, v] = dst[k];

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a
        .lu()
        .solve(&b)
        .ok_or(VisionError::DegenerateCorrespondences)?;
    Ok(Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0))
}

/// Ah = 0，取最小奇异值对应的右奇异向量
fn solve_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Matrix3<f64>, VisionError> {
    let n = src.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 9);

    for k in 0..n {
        let [x, y] = src[k];
        let [u, v] = dst[k];

        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t.ok_or(VisionError::DegenerateCorrespondences)?;
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, &s)| {
            if s < best.1 { (i, s) } else { best }
        });
    let h = v_t.row(min_idx);
    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]))
}

/// 标定板平面 → 机器人基座的平移（mm）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotOffset {
    pub x: f64,
    pub y: f64,
}

/// 记录附带的说明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomographyNotes {
    #[serde(default = "default_true")]
    pub pixel_points_are_on_undistorted_image: bool,
    #[serde(default)]
    pub click_order: String,
}

fn default_true() -> bool {
    true
}

impl Default for HomographyNotes {
    fn default() -> Self {
        Self {
            pixel_points_are_on_undistorted_image: true,
            click_order: "P0,P1,P2,P3 must match between image_points and world_points".into(),
        }
    }
}

/// 单应矩阵记录（JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomographyRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_points_uv: Vec<[f64; 2]>,
    #[serde(default)]
    pub world_points_mm: Vec<[f64; 2]>,
    #[serde(rename = "H_pixel_to_world")]
    pub h_pixel_to_world: Vec<Vec<f64>>,
    pub robot_offset_mm: RobotOffset,
    #[serde(default)]
    pub notes: HomographyNotes,
}

impl HomographyRecord {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| VisionError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), VisionError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| VisionError::io(path, e))
    }

    /// 由对应点求单应并组成记录
    pub fn derive(points: &[CalibrationPoint], offset: RobotOffset) -> Result<Self, VisionError> {
        let h = Homography::from_correspondences(points)?;
        Ok(Self {
            description: "pixel(u,v) -> world(mm) via H, then world -> robot(mm) via offset".into(),
            image_points_uv: points.iter().map(|p| p.pixel).collect(),
            world_points_mm: points.iter().map(|p| p.world).collect(),
            h_pixel_to_world: h.to_rows().iter().map(|r| r.to_vec()).collect(),
            robot_offset_mm: offset,
            notes: HomographyNotes::default(),
        })
    }

    /// 按点序配对的标定点
    pub fn points(&self) -> Result<Vec<CalibrationPoint>, VisionError> {
        if self.image_points_uv.len() != self.world_points_mm.len() {
            return Err(VisionError::PointCountMismatch {
                pixel: self.image_points_uv.len(),
                world: self.world_points_mm.len(),
            });
        }
        Ok(self
            .image_points_uv
            .iter()
            .zip(&self.world_points_mm)
            .map(|(&pixel, &world)| CalibrationPoint { pixel, world })
            .collect())
    }

    pub fn homography(&self) -> Result<Homography, VisionError> {
        Homography::from_nested(&self.h_pixel_to_world)
    }
}

/// 像素 → 机器人坐标映射器（加载后不可变）
#[derive(Debug, Clone)]
pub struct PixelToRobotMapper {
    homography: Homography,
    offset: RobotOffset,
    points: Vec<CalibrationPoint>,
}

impl PixelToRobotMapper {
    pub fn new(homography: Homography, offset: RobotOffset) -> Self {
        Self {
            homography,
            offset,
            points: Vec::new(),
        }
    }

    /// 从记录构造：矩阵形状必须为 3×3，两组点数量必须一致
    pub fn from_record(record: &HomographyRecord) -> Result<Self, VisionError> {
        Ok(Self {
            homography: record.homography()?,
            offset: record.robot_offset_mm,
            points: record.points()?,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VisionError> {
        Self::from_record(&HomographyRecord::load(path)?)
    }

    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    pub fn offset(&self) -> RobotOffset {
        self.offset
    }

    /// 记录中的标定点（仅供核对）
    pub fn calibration_points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn pixel_to_world(&self, u: f64, v: f64) -> Result<(f64, f64), VisionError> {
        self.homography.apply(u, v)
    }

    pub fn pixel_to_robot(&self, u: f64, v: f64) -> Result<(f64, f64), VisionError> {
        let (xw, yw) = self.pixel_to_world(u, v)?;
        Ok((xw + self.offset.x, yw + self.offset.y))
    }

    /// 标定点的最大重投影误差（mm）
    pub fn max_calibration_error(&self) -> Result<f64, VisionError> {
        self.points.iter().try_fold(0.0_f64, |worst, p| {
            let (x, y) = self.pixel_to_world(p.pixel[0], p.pixel[1])?;
            let err = ((x - p.world[0]).powi(2) + (y - p.world[1]).powi(2)).sqrt();
            Ok(worst.max(err))
        })
    }
}
