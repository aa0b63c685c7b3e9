//! 单应矩阵命令
//!
//! 由去畸变图像上点选的像素点和标定板上对应的世界坐标求 H，
//! 连同机器人偏移一起写入 JSON 记录。

use crate::validation::parse_point;
use anyhow::{Context, Result};
use clap::Subcommand;
use pick_vision::{CalibrationPoint, HomographyRecord, PixelToRobotMapper, RobotOffset};
use std::path::PathBuf;

/// 单应矩阵子命令
#[derive(Subcommand, Debug)]
pub enum HomographyCommand {
    /// 求解并保存
    Compute {
        /// 像素点 "u,v"，按点序重复给出（至少 4 个）
        #[arg(long = "pixel", required = true)]
        pixels: Vec<String>,

        /// 世界坐标 "x,y"（mm），点序与 --pixel 一致
        #[arg(long = "world", required = true, allow_hyphen_values = true)]
        worlds: Vec<String>,

        /// 标定板原点在机器人坐标系中的 x（mm）
        #[arg(long, allow_hyphen_values = true)]
        offset_x: f64,

        /// 标定板原点在机器人坐标系中的 y（mm）
        #[arg(long, allow_hyphen_values = true)]
        offset_y: f64,

        /// 输出路径（默认取配置）
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 映射一个像素点（核对已保存的记录）
    Map {
        /// 像素点 "u,v"
        pixel: String,

        /// 记录路径（默认取配置）
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl HomographyCommand {
    pub fn execute(&self, default_path: PathBuf) -> Result<()> {
        match self {
            HomographyCommand::Compute {
                pixels,
                worlds,
                offset_x,
                offset_y,
                out,
            } => {
                let points = pair_points(pixels, worlds)?;
                let record = HomographyRecord::derive(
                    &points,
                    RobotOffset {
                        x: *offset_x,
                        y: *offset_y,
                    },
                )
                .context("求解单应矩阵失败")?;

                let mapper = PixelToRobotMapper::from_record(&record)?;
                let path = out.clone().unwrap_or(default_path);
                record
                    .save(&path)
                    .with_context(|| format!("保存失败: {}", path.display()))?;

                println!("✅ 已保存 {}", path.display());
                println!("H =");
                for row in &record.h_pixel_to_world {
                    println!("  [{:>12.6} {:>12.6} {:>12.6}]", row[0], row[1], row[2]);
                }
                println!("标定点最大误差: {:.4} mm", mapper.max_calibration_error()?);
                Ok(())
            },
            HomographyCommand::Map { pixel, file } => {
                let path = file.clone().unwrap_or(default_path);
                let mapper = PixelToRobotMapper::load(&path)
                    .with_context(|| format!("加载失败: {}", path.display()))?;
                let [u, v] = parse_point(pixel, "像素点")?;
                let (xw, yw) = mapper.pixel_to_world(u, v)?;
                let (xr, yr) = mapper.pixel_to_robot(u, v)?;
                println!("pixel ({u:.1}, {v:.1})");
                println!("  world ({xw:.2}, {yw:.2}) mm");
                println!("  robot ({xr:.2}, {yr:.2}) mm");
                Ok(())
            },
        }
    }
}

/// 按点序配对；数量不一致直接报错
fn pair_points(pixels: &[String], worlds: &[String]) -> Result<Vec<CalibrationPoint>> {
    if pixels.len() != worlds.len() {
        anyhow::bail!(
            "像素点 {} 个，世界坐标 {} 个，数量必须一致",
            pixels.len(),
            worlds.len()
        );
    }
    pixels
        .iter()
        .zip(worlds)
        .map(|(p, w)| {
            Ok(CalibrationPoint::new(
                parse_point(p, "像素点")?,
                parse_point(w, "世界坐标")?,
            ))
        })
        .collect()
}
