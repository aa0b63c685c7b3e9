//! 配置管理命令

use crate::context::load_settings;
use anyhow::Result;
use clap::Subcommand;
use cobot_tools::PickPlaceSettings;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写出一份默认配置
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 打印当前生效的配置（文件缺失的字段取默认值）
    Show,
}

impl ConfigCommand {
    pub fn execute(&self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Init { force } => {
                if path.exists() && !force {
                    anyhow::bail!("{} 已存在，使用 --force 覆盖", path.display());
                }
                PickPlaceSettings::default().save(path)?;
                println!("✅ 已写入默认配置: {}", path.display());
                Ok(())
            },
            ConfigCommand::Show => {
                print!("{}", load_settings(path)?.to_toml()?);
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pickplace.toml");

        ConfigCommand::Init { force: false }.execute(&path).unwrap();
        assert_eq!(PickPlaceSettings::load(&path).unwrap(), PickPlaceSettings::default());

        assert!(ConfigCommand::Init { force: false }.execute(&path).is_err());
        assert!(ConfigCommand::Init { force: true }.execute(&path).is_ok());
    }
}
