//! 输入验证模块
//!
//! 命令行上的位姿、像素点都是逗号分隔的数字列表。

use anyhow::{Context, Result};

/// 解析逗号分隔的数字列表，数量必须为 `expected`
pub fn parse_values(input: &str, expected: usize, what: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = input
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("解析{what}失败: {input:?}"))?;

    if values.len() != expected {
        anyhow::bail!("{what}需要 {expected} 个数值，得到 {} 个", values.len());
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        anyhow::bail!("{what}第 {} 个数值无效", i + 1);
    }
    Ok(values)
}

/// 解析 `"a,b"` 点对
pub fn parse_point(input: &str, what: &str) -> Result<[f64; 2]> {
    let v = parse_values(input, 2, what)?;
    Ok([v[0], v[1]])
}

/// 关节角验证器（度）
pub struct JointValidator {
    min_angle: f64,
    max_angle: f64,
}

impl JointValidator {
    pub fn new(min_angle: f64, max_angle: f64) -> Self {
        Self {
            min_angle,
            max_angle,
        }
    }

    /// 桌面机械臂关节的默认范围（-180° 到 180°）
    pub fn default_range() -> Self {
        Self::new(-180.0, 180.0)
    }

    pub fn validate_joints(&self, angles: &[f64]) -> Result<()> {
        for (i, &angle) in angles.iter().enumerate() {
            if angle < self.min_angle || angle > self.max_angle {
                anyhow::bail!(
                    "关节 J{} 角度 {:.1}° 超出范围 [{:.1}, {:.1}]",
                    i + 1,
                    angle,
                    self.min_angle,
                    self.max_angle
                );
            }
        }
        Ok(())
    }
}

/// 速度必须在 1..=100
pub fn validate_speed(speed: u32) -> Result<u32> {
    if !(1..=100).contains(&speed) {
        anyhow::bail!("速度 {speed} 超出范围 [1, 100]");
    }
    Ok(speed)
}
