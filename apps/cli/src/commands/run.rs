//! run 命令
//!
//! 启动采集线程，准备机械臂，进入抓取-投放循环，直到 Ctrl-C。

use crate::context::{CliContext, install_ctrlc};
use crate::validation::validate_speed;
use crate::vision::{build_pipeline, capture_config, open_frame_source};
use anyhow::{Context, Result};
use clap::Args;
use cobot_tools::CancelToken;
use pick_control::PickCycle;
use pick_vision::{DetectionSlot, spawn_capture};
use std::sync::Arc;
use tracing::{error, info};

/// 抓取循环参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 运动速度（覆盖配置，1-100）
    #[arg(long)]
    pub speed: Option<u32>,

    /// 标注预览输出路径（覆盖配置）
    #[arg(long)]
    pub preview: Option<std::path::PathBuf>,
}

impl RunCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let mut settings = ctx.settings()?;
        if let Some(speed) = self.speed {
            settings.robot.default_speed = validate_speed(speed)?;
        }
        if let Some(preview) = &self.preview {
            settings.vision.preview = Some(preview.clone());
        }

        let cancel = CancelToken::new();
        install_ctrlc(&cancel)?;

        // 视觉先启动：机械臂到达观察位时槽位里已有结果
        let pipeline = build_pipeline(&settings.vision)?;
        let source = open_frame_source(&settings.vision)?;
        let slot = Arc::new(DetectionSlot::new());
        let capture = spawn_capture(
            source,
            pipeline,
            slot.clone(),
            capture_config(&settings.vision)?,
            cancel.clone(),
        )
        .context("启动采集线程失败")?;

        let controller = ctx.connect(&settings)?;
        let cycle = PickCycle::from_settings(&controller, &slot, &settings, cancel.clone());

        println!("🤖 准备机械臂（上电、锁定、夹爪标定）...");
        let result = cycle.prepare().and_then(|()| {
            println!("▶️  开始抓取循环，按 Ctrl-C 停止");
            cycle.run_loop()
        });

        cancel.cancel();
        match capture.join() {
            Ok(stats) => info!(frames = stats.frames, "Capture thread joined"),
            Err(_) => error!("Capture thread panicked"),
        }
        controller.disconnect();

        match result {
            Ok(stats) => {
                println!();
                println!("📊 循环结束:");
                println!("  轮数: {}", stats.cycles);
                println!("  抓取: {}", stats.picks);
                println!("  空轮: {}", stats.empty);
                Ok(())
            },
            Err(e) if e.is_cancelled() => {
                println!("🛑 已取消");
                Ok(())
            },
            Err(e) => Err(e).context("抓取循环失败"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_rejects_bad_speed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CliContext {
            config_path: dir.path().join("pickplace.toml"),
            endpoint_file: None,
        };
        let cmd = RunCommand {
            speed: Some(0),
            preview: None,
        };
        assert!(cmd.execute(&ctx).is_err());
    }
}
