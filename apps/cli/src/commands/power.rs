//! 上电 / 舵机锁定命令

use crate::context::CliContext;
use anyhow::Result;
use clap::{Args, ValueEnum};

/// 开 / 关
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

/// 上电参数
#[derive(Args, Debug)]
pub struct PowerCommand {
    #[arg(value_enum)]
    pub state: Switch,
}

impl PowerCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let controller = ctx.connect(&settings)?;
        match self.state {
            Switch::On => {
                println!("⚡ 上电...");
                controller.power_on()?;
            },
            Switch::Off => {
                println!("🔌 断电...");
                controller.power_off()?;
            },
        }
        println!("✅ 完成");
        Ok(())
    }
}

/// 舵机锁定参数
#[derive(Args, Debug)]
pub struct TorqueCommand {
    /// on：锁定全部舵机；off：释放（可手动拖动）
    #[arg(value_enum)]
    pub state: Switch,
}

impl TorqueCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let controller = ctx.connect(&settings)?;
        match self.state {
            Switch::On => {
                println!("🔒 锁定全部舵机...");
                controller.torque_on()?;
            },
            Switch::Off => {
                println!("🔓 释放全部舵机...");
                controller.torque_off()?;
            },
        }
        println!("✅ 完成");
        Ok(())
    }
}
