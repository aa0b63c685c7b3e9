//! 移动命令
//!
//! 单点移动：世界坐标位姿或关节角（度）。

use crate::context::CliContext;
use crate::validation::{JointValidator, parse_values, validate_speed};
use anyhow::Result;
use clap::{Args, ValueEnum};
use cobot_client::{MoveMode, POSE_LEN};

/// 插补方式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeArg {
    #[default]
    Angular,
    Linear,
}

impl From<ModeArg> for MoveMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Angular => MoveMode::Angular,
            ModeArg::Linear => MoveMode::Linear,
        }
    }
}

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 目标位姿 x,y,z,rx,ry,rz（mm / 度），逗号分隔
    /// 例如：170,0,290,-92,44,-90
    #[arg(short, long, conflicts_with = "joints", allow_hyphen_values = true)]
    pub world: Option<String>,

    /// 目标关节角（度），逗号分隔
    #[arg(short, long, allow_hyphen_values = true)]
    pub joints: Option<String>,

    /// 世界坐标插补方式
    #[arg(short, long, value_enum, default_value_t = ModeArg::Linear)]
    pub mode: ModeArg,

    /// 速度（1-100，默认取配置）
    #[arg(short, long)]
    pub speed: Option<u32>,
}

/// 目标
#[derive(Debug, Clone, PartialEq)]
pub enum MoveTarget {
    World(Vec<f64>),
    Joints(Vec<f64>),
}

impl MoveCommand {
    pub fn target(&self) -> Result<MoveTarget> {
        match (&self.world, &self.joints) {
            (Some(world), None) => Ok(MoveTarget::World(parse_values(world, POSE_LEN, "位姿")?)),
            (None, Some(joints)) => {
                let angles = parse_values(joints, POSE_LEN, "关节角")?;
                JointValidator::default_range().validate_joints(&angles)?;
                Ok(MoveTarget::Joints(angles))
            },
            _ => anyhow::bail!("请使用 --world 或 --joints 指定目标"),
        }
    }

    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let target = self.target()?;
        let settings = ctx.settings()?;
        let speed = validate_speed(self.speed.unwrap_or(settings.robot.default_speed))?;

        let controller = ctx.connect(&settings)?;
        match &target {
            MoveTarget::World(pose) => {
                println!("⏳ 移动到位姿 {:?}（{:?}，速度 {}）", pose, self.mode, speed);
                controller.move_world(pose, self.mode.into(), speed)?;
            },
            MoveTarget::Joints(angles) => {
                println!("⏳ 移动到关节角 {:?}（速度 {}）", angles, speed);
                controller.move_joints(angles, speed)?;
            },
        }
        println!("✅ 命令已发送");
        Ok(())
    }
}

/// 回零参数
#[derive(Args, Debug)]
pub struct HomeCommand {
    /// 速度（1-100，默认取配置）
    #[arg(short, long)]
    pub speed: Option<u32>,
}

impl HomeCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let speed = validate_speed(self.speed.unwrap_or(settings.robot.default_speed))?;
        let controller = ctx.connect(&settings)?;
        println!("🏠 回到零位（速度 {}）...", speed);
        controller.home(speed)?;
        println!("✅ 命令已发送");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(world: Option<&str>, joints: Option<&str>) -> MoveCommand {
        MoveCommand {
            world: world.map(String::from),
            joints: joints.map(String::from),
            mode: ModeArg::Linear,
            speed: None,
        }
    }

    #[test]
    fn test_world_target() {
        let cmd = command(Some("170,0,290,-92,44,-90"), None);
        assert_eq!(
            cmd.target().unwrap(),
            MoveTarget::World(vec![170.0, 0.0, 290.0, -92.0, 44.0, -90.0])
        );
    }

    #[test]
    fn test_joint_target_validated() {
        assert!(command(None, Some("0,0,0,0,0,0")).target().is_ok());
        assert!(command(None, Some("0,0,200,0,0,0")).target().is_err());
    }

    #[test]
    fn test_target_required() {
        assert!(command(None, None).target().is_err());
        assert!(command(Some("1,2,3"), None).target().is_err());
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(MoveMode::from(ModeArg::Linear), MoveMode::Linear);
        assert_eq!(MoveMode::from(ModeArg::default()), MoveMode::Angular);
    }
}
