//! 位置查询命令

use crate::context::CliContext;
use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;

/// 输出格式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// 位置查询命令参数
#[derive(Args, Debug)]
pub struct PositionCommand {
    /// 输出格式
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct PositionReport {
    angles_deg: Option<[f64; 6]>,
    coords: Option<[f64; 6]>,
}

impl PositionCommand {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let settings = ctx.settings()?;
        let controller = ctx.connect(&settings)?;

        let report = PositionReport {
            angles_deg: controller.get_angles()?,
            coords: controller.get_coords()?,
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
            OutputFormat::Table => print_table(&report),
        }
        Ok(())
    }
}

fn print_table(report: &PositionReport) {
    println!("📊 关节角:");
    match report.angles_deg {
        Some(angles) => {
            for (i, a) in angles.iter().enumerate() {
                println!("  J{}: {:.2}°", i + 1, a);
            }
        },
        None => println!("  (读取失败)"),
    }

    println!("📍 末端位姿:");
    match report.coords {
        Some(c) => {
            println!("  x={:.1} y={:.1} z={:.1} mm", c[0], c[1], c[2]);
            println!("  rx={:.1} ry={:.1} rz={:.1} °", c[3], c[4], c[5]);
        },
        None => println!("  (读取失败)"),
    }
}
