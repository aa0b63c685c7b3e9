//! check 命令
//!
//! 只跑视觉管线、不动机械臂：打印每个检测的像素中心和机器人坐标。
//! 用来确认参考原点（把物体放在抓取位置，记下它的 x, y）。

use crate::context::{CliContext, install_ctrlc};
use crate::vision::{build_pipeline, capture_config, open_frame_source};
use anyhow::{Context, Result};
use clap::Args;
use cobot_tools::CancelToken;
use pick_vision::{DetectionSlot, DetectionSnapshot, spawn_capture};
use std::sync::Arc;
use std::time::Duration;

/// 位置检查参数
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// 打印多少次结果后退出（默认一直运行）
    #[arg(short = 'n', long)]
    pub count: Option<u64>,

    /// 以 JSON 输出检测结果
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let cancel = CancelToken::new();
        install_ctrlc(&cancel)?;

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

        let mut printed = 0;
        let mut seen = 0;
        while !cancel.is_cancelled() && !capture.is_finished() {
            let Some(snapshot) = slot.wait_newer(seen, Duration::from_millis(500), &cancel) else {
                continue;
            };
            seen = snapshot.sequence;
            self.print(&snapshot)?;

            printed += 1;
            if self.count.is_some_and(|n| printed >= n) {
                break;
            }
        }

        cancel.cancel();
        if let Ok(stats) = capture.join() {
            println!(
                "📊 帧数: {}，读帧失败: {}，处理失败: {}",
                stats.frames, stats.read_failures, stats.process_failures
            );
        }
        Ok(())
    }

    fn print(&self, snapshot: &DetectionSnapshot) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(&snapshot.detections)?);
            return Ok(());
        }

        println!("#{}: {} 个目标", snapshot.sequence, snapshot.detections.len());
        for d in &snapshot.detections {
            let center = d
                .center
                .map(|(u, v)| format!("({u:.1}, {v:.1})px"))
                .unwrap_or_else(|| "-".into());
            let robot = d
                .robot_location
                .map(|(x, y)| format!("({x:.1}, {y:.1})mm"))
                .unwrap_or_else(|| "-".into());
            println!(
                "  {:<12} {:.2}  center={}  robot={}",
                d.class_name, d.confidence, center, robot
            );
        }
        Ok(())
    }
}
