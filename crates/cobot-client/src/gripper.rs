//! # 夹爪控制与故障恢复
//!
//! 夹爪没有专用的开合指令，通过通用编码器通道（7 号）发送目标位置驱动。
//! 命令是否生效只能靠编码器读数的变化判断：
//!
//! 1. 发送前读一次编码器作为快照（读不到视为未知）
//! 2. 发送目标位置
//! 3. 在超时内轮询编码器，变化量达到 `min_delta` 即成功；快照未知时读到任意值即成功
//! 4. 未检测到运动则重发，最多 `attempts` 次
//!
//! `*_retry` 在此之上做无限重试：失败后重新标定夹爪再试，
//! 每轮检查一次取消令牌。
//!
//! 所有夹爪操作都在 `gripper_lock` 内执行，两个调用方同时轮询编码器会互相干扰。

use crate::controller::CobotController;
use crate::error::ClientError;
use cobot_driver::RobotEndpoint;
use cobot_tools::{CancelToken, GripperSettings};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 夹爪协议参数
#[derive(Debug, Clone, PartialEq)]
pub struct GripperConfig {
    pub encoder_id: u8,
    /// 标定中点
    pub midpoint: i32,
    pub open_target: i32,
    pub close_target: i32,
    /// 初始化时推到 `midpoint + init_bump`
    pub init_bump: i32,
    pub init_speed: u32,
    /// 判定"动了"的最小编码器变化
    pub min_delta: i32,
    /// 单次开合的发送次数上限
    pub attempts: u32,
    /// 每次发送后等待运动的超时
    pub motion_timeout: Duration,
    pub poll_interval: Duration,
    /// 两次重发之间的停顿
    pub resend_pause: Duration,
    /// 标定各步骤之后的等待
    pub settle: Duration,
    /// `gripper_set_value` 之后的等待
    pub value_settle: Duration,
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self::from(&GripperSettings::default())
    }
}

impl From<&GripperSettings> for GripperConfig {
    fn from(s: &GripperSettings) -> Self {
        Self {
            encoder_id: s.encoder_id,
            midpoint: s.midpoint,
            open_target: s.open_target,
            close_target: s.close_target,
            init_bump: s.init_bump,
            init_speed: s.init_speed,
            min_delta: s.min_delta,
            attempts: s.attempts.max(1),
            motion_timeout: Duration::from_millis(s.timeout_ms),
            poll_interval: Duration::from_millis(s.poll_ms),
            resend_pause: Duration::from_millis(s.resend_pause_ms),
            settle: Duration::from_millis(s.settle_ms),
            value_settle: Duration::from_millis(700),
        }
    }
}

/// 开 / 合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperAction {
    Open,
    Close,
}

impl GripperAction {
    pub fn target(&self, config: &GripperConfig) -> i32 {
        match self {
            GripperAction::Open => config.open_target,
            GripperAction::Close => config.close_target,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GripperAction::Open => "open",
            GripperAction::Close => "close",
        }
    }
}

impl<E: RobotEndpoint> CobotController<E> {
    /// 张开夹爪（有界重发），返回是否检测到运动
    pub fn gripper_open(&self, speed: u32) -> Result<bool, ClientError> {
        let _guard = self.gripper_lock.lock();
        self.actuate_locked(GripperAction::Open, speed)
    }

    /// 闭合夹爪（有界重发），返回是否检测到运动
    pub fn gripper_close(&self, speed: u32) -> Result<bool, ClientError> {
        let _guard = self.gripper_lock.lock();
        self.actuate_locked(GripperAction::Close, speed)
    }

    /// 重新标定夹爪：标定 → 推到 `midpoint + init_bump` → 再标定
    pub fn gripper_init(&self) -> Result<(), ClientError> {
        let _guard = self.gripper_lock.lock();
        self.ensure_connected()?;
        info!("Gripper calibration started");

        let cfg = &self.gripper;
        let bump = cfg.midpoint + cfg.init_bump;

        self.call(|ep| ep.set_gripper_calibration())?;
        std::thread::sleep(cfg.settle);
        self.call(|ep| ep.set_encoder(cfg.encoder_id, bump, cfg.init_speed))?;
        std::thread::sleep(cfg.settle);
        self.call(|ep| ep.set_gripper_calibration())?;
        std::thread::sleep(cfg.settle);

        info!("Gripper calibration done");
        Ok(())
    }

    /// 张开直到成功
    ///
    /// 每轮失败后重新标定，并先闭合一次：标定后夹爪停在张开目标附近，
    /// 直接再张开看不到编码器变化。
    pub fn gripper_open_retry(&self, speed: u32, cancel: &CancelToken) -> Result<(), ClientError> {
        let mut round = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            round += 1;
            if self.gripper_open(speed)? {
                return Ok(());
            }
            warn!(round, "Gripper open failed, recalibrating");
            self.gripper_init()?;
            if !self.gripper_close(speed)? {
                debug!("Priming close did not move the gripper");
            }
        }
    }

    /// 闭合直到成功，每轮失败后重新标定
    pub fn gripper_close_retry(&self, speed: u32, cancel: &CancelToken) -> Result<(), ClientError> {
        let mut round = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            round += 1;
            if self.gripper_close(speed)? {
                return Ok(());
            }
            warn!(round, "Gripper close failed, recalibrating");
            self.gripper_init()?;
        }
    }

    /// 等待夹爪编码器恢复应答（夹爪重新上电后使用）
    pub fn wait_gripper_ready(&self, timeout: Duration) -> Result<bool, ClientError> {
        self.ensure_connected()?;
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.read_gripper_encoder().is_some() {
                return Ok(true);
            }
            std::thread::sleep(self.gripper.poll_interval.max(Duration::from_millis(1)));
        }
        Ok(false)
    }

    /// 通用夹爪值通道（0-100）
    pub fn gripper_set_value(&self, value: u8, speed: u32) -> Result<(), ClientError> {
        let _guard = self.gripper_lock.lock();
        self.call(|ep| ep.set_gripper_value(value.min(100), speed))?;
        std::thread::sleep(self.gripper.value_settle);
        Ok(())
    }

    pub fn gripper_get_value(&self) -> Result<Option<u8>, ClientError> {
        self.call(|ep| ep.get_gripper_value())
    }

    /// 当前夹爪编码器读数；读失败视为未知
    pub fn gripper_encoder(&self) -> Result<Option<i32>, ClientError> {
        self.ensure_connected()?;
        Ok(self.read_gripper_encoder())
    }

    fn actuate_locked(&self, action: GripperAction, speed: u32) -> Result<bool, ClientError> {
        self.ensure_connected()?;
        let cfg = &self.gripper;
        let target = action.target(cfg);
        let snapshot = self.read_gripper_encoder();

        for attempt in 1..=cfg.attempts {
            self.call(|ep| ep.set_encoder(cfg.encoder_id, target, speed))?;
            if self.wait_gripper_motion(snapshot) {
                info!(action = action.name(), attempt, "Gripper moved");
                return Ok(true);
            }
            debug!(action = action.name(), attempt, "No gripper motion detected");
            if attempt < cfg.attempts {
                std::thread::sleep(cfg.resend_pause);
            }
        }

        warn!(
            action = action.name(),
            attempts = cfg.attempts,
            "Gripper command dropped"
        );
        Ok(false)
    }

    fn wait_gripper_motion(&self, snapshot: Option<i32>) -> bool {
        let cfg = &self.gripper;
        let start = Instant::now();

        loop {
            if let Some(current) = self.read_gripper_encoder() {
                match snapshot {
                    None => return true,
                    Some(prev) if (current - prev).abs() >= cfg.min_delta => return true,
                    Some(_) => {},
                }
            }

            let remaining = cfg.motion_timeout.saturating_sub(start.elapsed());
            let sleep_duration = cfg.poll_interval.min(remaining);
            if sleep_duration.is_zero() {
                return false;
            }
            std::thread::sleep(sleep_duration);
        }
    }

    fn read_gripper_encoder(&self) -> Option<i32> {
        let mut endpoint = self.endpoint.lock();
        match endpoint.get_encoder(self.gripper.encoder_id) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Gripper encoder read failed");
                None
            },
        }
    }
}
