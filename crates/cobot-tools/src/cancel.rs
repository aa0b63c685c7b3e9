//! 取消令牌
//!
//! 主循环、采集线程和夹爪无限重试共用同一个令牌；Ctrl-C 时置位。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 睡眠时检查取消标志的粒度
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// 可克隆的取消令牌（克隆体共享同一标志）
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// 可被取消打断的睡眠
    ///
    /// 返回 `false` 表示睡眠期间令牌被取消。
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            std::thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}
