//! 夹爪命令

use crate::context::{CliContext, install_ctrlc};
use anyhow::Result;
use clap::Subcommand;
use cobot_tools::CancelToken;

/// 夹爪子命令
#[derive(Subcommand, Debug)]
pub enum GripperCommand {
    /// 张开（有界重发）
    Open {
        #[arg(short, long)]
        speed: Option<u32>,
    },
    /// 闭合（有界重发）
    Close {
        #[arg(short, long)]
        speed: Option<u32>,
    },
    /// 张开，失败则标定后无限重试（Ctrl-C 取消）
    OpenRetry {
        #[arg(short, long)]
        speed: Option<u32>,
    },
    /// 闭合，失败则标定后无限重试（Ctrl-C 取消）
    CloseRetry {
        #[arg(short, long)]
        speed: Option<u32>,
    },
    /// 标定序列
    Init,
    /// 设置夹爪开合值（0-100）
    Set {
        value: u8,
        #[arg(short, long)]
        speed: Option<u32>,
    },
    /// 读取编码器和开合值
    Status,
}

impl GripperCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let default_speed = settings.gripper.speed;
        let controller = ctx.connect(&settings)?;

        match self {
            GripperCommand::Open { speed } => {
                report(controller.gripper_open(speed.unwrap_or(default_speed))?, "张开")
            },
            GripperCommand::Close { speed } => {
                report(controller.gripper_close(speed.unwrap_or(default_speed))?, "闭合")
            },
            GripperCommand::OpenRetry { speed } => {
                let cancel = CancelToken::new();
                install_ctrlc(&cancel)?;
                controller.gripper_open_retry(speed.unwrap_or(default_speed), &cancel)?;
                println!("✅ 夹爪已张开");
            },
            GripperCommand::CloseRetry { speed } => {
                let cancel = CancelToken::new();
                install_ctrlc(&cancel)?;
                controller.gripper_close_retry(speed.unwrap_or(default_speed), &cancel)?;
                println!("✅ 夹爪已闭合");
            },
            GripperCommand::Init => {
                println!("🔧 夹爪标定...");
                controller.gripper_init()?;
                println!("✅ 完成");
            },
            GripperCommand::Set { value, speed } => {
                controller.gripper_set_value(*value, speed.unwrap_or(default_speed))?;
                println!("✅ 开合值已设为 {}", (*value).min(100));
            },
            GripperCommand::Status => {
                let encoder = controller.gripper_encoder()?;
                let value = controller.gripper_get_value()?;
                println!("📊 夹爪:");
                println!("  编码器: {}", encoder.map_or("-".into(), |v| v.to_string()));
                println!("  开合值: {}", value.map_or("-".into(), |v| v.to_string()));
            },
        }
        Ok(())
    }
}

fn report(moved: bool, action: &str) {
    if moved {
        println!("✅ 夹爪{action}完成");
    } else {
        println!("⚠️  夹爪{action}未检测到编码器变化");
    }
}
