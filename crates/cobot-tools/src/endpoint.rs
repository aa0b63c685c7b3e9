//! 控制器地址文件
//!
//! 运维人员维护的纯文本文件，内容形如 `192.168.0.10, 9000`。

use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// 控制器 socket 地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAddress {
    pub host: String,
    pub port: u16,
}

impl EndpointAddress {
    /// 从文本文件读取
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取地址文件失败: {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("地址文件格式错误: {}", path.display()))
    }
}

impl FromStr for EndpointAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((host, port)) = s.trim().split_once(',') else {
            bail!("expected \"<ip>, <port>\", got {:?}", s.trim());
        };
        let host = host.trim();
        if host.is_empty() {
            bail!("empty host");
        }
        let port = port
            .trim()
            .parse::<u16>()
            .with_context(|| format!("invalid port {:?}", port.trim()))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
