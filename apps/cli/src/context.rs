//! 命令共用的上下文：配置、机械臂连接、Ctrl-C

use anyhow::{Context, Result};
use cobot_client::{ControllerBuilder, TcpController};
use cobot_tools::{CancelToken, EndpointAddress, PickPlaceSettings};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 全局选项
#[derive(Debug, Clone)]
pub struct CliContext {
    /// 配置文件路径
    pub config_path: PathBuf,
    /// 覆盖配置中的地址文件
    pub endpoint_file: Option<PathBuf>,
}

impl CliContext {
    /// 加载配置；文件不存在时使用默认值
    pub fn settings(&self) -> Result<PickPlaceSettings> {
        load_settings(&self.config_path)
    }

    /// 按配置构造控制器并连接
    ///
    /// 存活探测失败只告警：随后上电通常可以恢复。
    pub fn connect(&self, settings: &PickPlaceSettings) -> Result<TcpController> {
        let endpoint_file = self
            .endpoint_file
            .as_deref()
            .unwrap_or(&settings.robot.endpoint_file);
        let address = EndpointAddress::load(endpoint_file)?;

        println!("🔌 连接到机械臂 {}...", address);
        let controller = ControllerBuilder::from_settings(address.clone(), settings).build();
        let status = controller
            .connect()
            .with_context(|| format!("连接 {} 失败", address))?;
        if status.is_degraded() {
            warn!("Robot controller did not answer the liveness probe");
            println!("⚠️  控制器无应答（可能需要上电）");
        }
        Ok(controller)
    }
}

pub fn load_settings(path: &Path) -> Result<PickPlaceSettings> {
    if path.exists() {
        let settings = PickPlaceSettings::load(path)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    } else {
        info!("{} not found, using defaults", path.display());
        Ok(PickPlaceSettings::default())
    }
}

/// 安装 Ctrl-C 处理：置位取消令牌
pub fn install_ctrlc(cancel: &CancelToken) -> Result<()> {
    let cancel = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        cancel.cancel();
    })
    .context("安装 Ctrl-C 处理失败")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(settings, PickPlaceSettings::default());
    }

    #[test]
    fn test_missing_endpoint_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CliContext {
            config_path: dir.path().join("pickplace.toml"),
            endpoint_file: Some(dir.path().join("IP_info.txt")),
        };
        let err = ctx.connect(&PickPlaceSettings::default()).err().unwrap();
        assert!(err.to_string().contains("IP_info.txt"));
    }
}
