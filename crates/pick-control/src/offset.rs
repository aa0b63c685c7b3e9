//! 参考原点与抓取偏移
//!
//! 示教时把物体放在参考位置，记下它在机器人坐标系中的 (x, y)，
//! 并示教一组抓取位姿。运行时物体偏离参考位置多少，这组位姿就平移多少。

use cobot_tools::ReferenceSettings;
use std::fmt;

/// 参考物体在机器人坐标系中的位置（mm）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceOrigin {
    pub x: f64,
    pub y: f64,
}

impl ReferenceOrigin {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 观测位置相对参考原点的偏移
    pub fn offset_to(&self, observed: (f64, f64)) -> PickOffset {
        PickOffset {
            dx: observed.0 - self.x,
            dy: observed.1 - self.y,
        }
    }
}

impl From<&ReferenceSettings> for ReferenceOrigin {
    fn from(settings: &ReferenceSettings) -> Self {
        Self::new(settings.x, settings.y)
    }
}

/// 平面偏移（mm）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PickOffset {
    pub dx: f64,
    pub dy: f64,
}

impl PickOffset {
    /// 只平移 x、y，高度和姿态不变
    pub fn apply(&self, pose: &[f64; 6]) -> [f64; 6] {
        let mut out = *pose;
        out[0] += self.dx;
        out[1] += self.dy;
        out
    }
}

impl fmt::Display for PickOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+.1}, {:+.1}) mm", self.dx, self.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pose(actual: [f64; 6], expected: [f64; 6]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_offset_applied_to_pick_pose() {
        let origin = ReferenceOrigin::new(254.7, 3.8);
        let offset = origin.offset_to((260.0, 10.0));
        assert!((offset.dx - 5.3).abs() < 1e-9);
        assert!((offset.dy - 6.2).abs() < 1e-9);

        let pick = [240.0, 0.0, 124.0, 180.0, 5.0, -132.0];
        assert_pose(offset.apply(&pick), [245.3, 6.2, 124.0, 180.0, 5.0, -132.0]);
    }

    #[test]
    fn test_observation_at_origin_is_zero_offset() {
        let origin = ReferenceOrigin::from(&ReferenceSettings::default());
        let offset = origin.offset_to((254.7, 3.8));
        assert_eq!(offset, PickOffset::default());
    }

    #[test]
    fn test_display() {
        let offset = PickOffset { dx: 5.3, dy: -6.24 };
        assert_eq!(offset.to_string(), "(+5.3, -6.2) mm");
    }
}
