//! # 示教位姿日志
//!
//! 追加写入的 JSON Lines 文件，每行一条记录：
//!
//! ```text
//! {"ts": 1760000000.123, "angles_deg": [..6..], "coords": [..6..]}
//! ```
//!
//! 读取失败的字段写为 `null`。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// 单条位姿记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// Unix 时间戳（秒）
    pub ts: f64,
    /// 关节角（度）
    pub angles_deg: Option<[f64; 6]>,
    /// 世界坐标 `[x, y, z, rx, ry, rz]`
    pub coords: Option<[f64; 6]>,
}

impl PoseRecord {
    /// 以当前时间创建记录
    pub fn now(angles_deg: Option<[f64; 6]>, coords: Option<[f64; 6]>) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            ts,
            angles_deg,
            coords,
        }
    }
}

/// 追加一条记录
pub fn append_pose<P: AsRef<Path>>(path: P, record: &PoseRecord) -> Result<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开位姿日志失败: {}", path.display()))?;

    let line = serde_json::to_string(record).context("序列化位姿记录失败")?;
    writeln!(file, "{}", line).context("写入位姿日志失败")?;
    Ok(())
}

/// 读取全部记录（跳过空行）
pub fn read_poses<P: AsRef<Path>>(path: P) -> Result<Vec<PoseRecord>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("打开位姿日志失败: {}", path.display()))?;

    let mut records = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("读取位姿日志失败")?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("第 {} 行格式错误", lineno + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teach_poses.jsonl");

        let first = PoseRecord {
            ts: 1.5,
            angles_deg: Some([0.0, 10.0, 20.0, 30.0, 40.0, 50.0]),
            coords: Some([170.0, 0.0, 290.0, -92.0, 44.0, -90.0]),
        };
        let second = PoseRecord {
            ts: 2.5,
            angles_deg: None,
            coords: Some([240.0, 0.0, 124.0, 180.0, 5.0, -132.0]),
        };
        append_pose(&path, &first).unwrap();
        append_pose(&path, &second).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().contains("\"angles_deg\":null"));

        let records = read_poses(&path).unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn test_record_now_has_timestamp() {
        let record = PoseRecord::now(None, None);
        assert!(record.ts > 1_600_000_000.0);
    }

    #[test]
    fn test_read_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"ts\": 1.0, \"angles_deg\": null, \"coords\": null}\nnot json\n")
            .unwrap();
        let err = read_poses(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("第 2 行"));
    }
}
