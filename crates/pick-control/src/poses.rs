//! 示教位姿

use crate::offset::PickOffset;
use cobot_tools::PoseSettings;

/// 一次抓取要用到的固定位姿（参考物体处）
#[derive(Debug, Clone, PartialEq)]
pub struct PickPoses {
    /// 相机观察位
    pub vantage: [f64; 6],
    pub pick: [f64; 6],
    /// 抓取位正上方
    pub approach: [f64; 6],
    /// 投放位
    pub throw: [f64; 6],
    pub throw_follows_offset: bool,
}

/// 平移到物体实际位置后的位姿
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPoses {
    pub approach: [f64; 6],
    pub pick: [f64; 6],
    pub throw: [f64; 6],
}

impl PickPoses {
    pub fn from_settings(settings: &PoseSettings) -> Self {
        let pick = settings.pick;

        let mut approach = pick;
        approach[2] += settings.approach_lift;

        let mut throw = pick;
        throw[0] += settings.throw_shift_x;
        throw[2] += settings.throw_lift;

        Self {
            vantage: settings.vantage,
            pick,
            approach,
            throw,
            throw_follows_offset: settings.throw_follows_offset,
        }
    }

    pub fn targets(&self, offset: &PickOffset) -> TargetPoses {
        TargetPoses {
            approach: offset.apply(&self.approach),
            pick: offset.apply(&self.pick),
            throw: if self.throw_follows_offset {
                offset.apply(&self.throw)
            } else {
                self.throw
            },
        }
    }
}

impl From<&PoseSettings> for PickPoses {
    fn from(settings: &PoseSettings) -> Self {
        Self::from_settings(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poses() {
        let poses = PickPoses::from_settings(&PoseSettings::default());
        assert_eq!(poses.vantage, [170.0, 0.0, 290.0, -92.0, 44.0, -90.0]);
        assert_eq!(poses.approach, [240.0, 0.0, 244.0, 180.0, 5.0, -132.0]);
        assert_eq!(poses.throw, [240.0, 0.0, 144.0, 180.0, 5.0, -132.0]);
    }

    #[test]
    fn test_throw_fixed_unless_configured() {
        let offset = PickOffset { dx: 10.0, dy: -5.0 };

        let fixed = PickPoses::from_settings(&PoseSettings::default());
        let targets = fixed.targets(&offset);
        assert_eq!(targets.pick[..3], [250.0, -5.0, 124.0]);
        assert_eq!(targets.approach[..3], [250.0, -5.0, 244.0]);
        assert_eq!(targets.throw, fixed.throw);

        let following = PickPoses::from_settings(&PoseSettings {
            throw_follows_offset: true,
            throw_shift_x: -30.0,
            ..PoseSettings::default()
        });
        assert_eq!(following.targets(&offset).throw[..3], [220.0, -5.0, 144.0]);
    }
}
