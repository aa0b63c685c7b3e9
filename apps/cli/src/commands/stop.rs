//! 停止命令

use crate::context::CliContext;
use anyhow::Result;
use clap::Args;

/// 停止命令参数
#[derive(Args, Debug)]
pub struct StopCommand {
    /// 停止后同时释放所有舵机
    #[arg(long)]
    pub release: bool,
}

impl StopCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let controller = ctx.connect(&settings)?;

        println!("🛑 发送停止命令...");
        controller.stop()?;
        if self.release {
            println!("🔓 释放所有舵机...");
            controller.torque_off()?;
        }
        println!("✅ 已停止");
        Ok(())
    }
}
