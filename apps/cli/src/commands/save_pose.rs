//! 记录当前位姿（JSON Lines）

use crate::context::CliContext;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// 位姿记录参数
#[derive(Args, Debug)]
pub struct SavePoseCommand {
    /// 追加写入的文件
    #[arg(default_value = "poses.jsonl")]
    pub path: PathBuf,

    /// 记录前释放舵机，便于手动拖到目标位置；回车后锁定并记录
    #[arg(long)]
    pub teach: bool,
}

impl SavePoseCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let controller = ctx.connect(&settings)?;

        if self.teach {
            controller.torque_off()?;
            println!("🔓 舵机已释放，把机械臂拖到目标位置后按回车...");
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).context("读取输入失败")?;
            controller.torque_on()?;
        }

        let record = controller
            .save_pose(&self.path)
            .with_context(|| format!("记录位姿失败: {}", self.path.display()))?;
        println!("✅ 已追加到 {}", self.path.display());
        println!("  angles: {:?}", record.angles_deg);
        println!("  coords: {:?}", record.coords);
        Ok(())
    }
}
