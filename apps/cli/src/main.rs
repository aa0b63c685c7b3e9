//! # Cobot CLI
//!
//! 视觉引导抓取-投放的命令行工具。
//!
//! ```bash
//! # 写出默认配置，按现场修改
//! cobot-cli config init
//!
//! # 由四个点选像素点求单应矩阵
//! cobot-cli homography compute \
//!     --pixel 463,439 --pixel 54,450 --pixel 56,169 --pixel 449,156 \
//!     --world 120.75,170 --world 120.75,0 --world 0,0 --world 0,170 \
//!     --offset-x 125 --offset-y -86.25
//!
//! # 只看检测位置（确定参考原点）
//! cobot-cli check
//!
//! # 抓取循环（Ctrl-C 停止）
//! cobot-cli run
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod validation;
mod vision;

use commands::{
    CheckCommand, ConfigCommand, GripperCommand, HomeCommand, HomographyCommand, MoveCommand,
    PositionCommand, PowerCommand, RunCommand, SavePoseCommand, StopCommand, TorqueCommand,
};
use context::CliContext;

/// Cobot CLI - 视觉引导抓取工具
#[derive(Parser, Debug)]
#[command(name = "cobot-cli")]
#[command(about = "Vision-guided pick-and-place for desktop cobot arms", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（TOML）
    #[arg(short, long, global = true, default_value = "pickplace.toml")]
    config: PathBuf,

    /// 控制器地址文件（覆盖配置）
    #[arg(short, long, global = true)]
    endpoint: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 抓取-投放循环
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 只运行视觉管线，打印检测位置
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },

    /// 单点移动
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 回到零位
    Home {
        #[command(flatten)]
        args: HomeCommand,
    },

    /// 停止运动
    Stop {
        #[command(flatten)]
        args: StopCommand,
    },

    /// 上电 / 断电
    Power {
        #[command(flatten)]
        args: PowerCommand,
    },

    /// 锁定 / 释放舵机
    Torque {
        #[command(flatten)]
        args: TorqueCommand,
    },

    /// 夹爪操作
    #[command(subcommand)]
    Gripper(GripperCommand),

    /// 查询关节角和末端位姿
    Position {
        #[command(flatten)]
        args: PositionCommand,
    },

    /// 把当前位姿追加到位姿日志
    SavePose {
        #[command(flatten)]
        args: SavePoseCommand,
    },

    /// 单应矩阵求解与核对
    #[command(subcommand)]
    Homography(HomographyCommand),

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cobot_cli=info".parse()?)
                .add_directive("cobot_client=info".parse()?)
                .add_directive("pick_control=info".parse()?)
                .add_directive("pick_vision=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        config_path: cli.config,
        endpoint_file: cli.endpoint,
    };

    match cli.command {
        Commands::Run { args } => args.execute(&ctx),
        Commands::Check { args } => args.execute(&ctx),
        Commands::Move { args } => args.execute(&ctx),
        Commands::Home { args } => args.execute(&ctx),
        Commands::Stop { args } => args.execute(&ctx),
        Commands::Power { args } => args.execute(&ctx),
        Commands::Torque { args } => args.execute(&ctx),
        Commands::Gripper(cmd) => cmd.execute(&ctx),
        Commands::Position { args } => args.execute(&ctx),
        Commands::SavePose { args } => args.execute(&ctx),
        Commands::Homography(cmd) => cmd.execute(ctx.settings()?.vision.homography),
        Commands::Config(cmd) => cmd.execute(&ctx.config_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move() {
        let cli = Cli::try_parse_from([
            "cobot-cli",
            "move",
            "--world",
            "170,0,290,-92,44,-90",
            "--mode",
            "linear",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Move { .. }));
        assert_eq!(cli.config, PathBuf::from("pickplace.toml"));
    }

    #[test]
    fn test_parse_homography_compute() {
        let cli = Cli::try_parse_from([
            "cobot-cli",
            "homography",
            "compute",
            "--pixel",
            "1,2",
            "--world",
            "-3,4",
            "--offset-x",
            "125",
            "--offset-y",
            "-86.25",
        ])
        .unwrap();
        match cli.command {
            Commands::Homography(HomographyCommand::Compute { pixels, worlds, offset_y, .. }) => {
                assert_eq!(pixels, vec!["1,2"]);
                assert_eq!(worlds, vec!["-3,4"]);
                assert_eq!(offset_y, -86.25);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_gripper_set() {
        let cli = Cli::try_parse_from(["cobot-cli", "gripper", "set", "60"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Gripper(GripperCommand::Set { value: 60, speed: None })
        ));
    }
}
