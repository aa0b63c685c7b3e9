//! # 抓取-投放循环
//!
//! 每一轮：
//! 1. 回到观察位，等待画面稳定
//! 2. 读取最新检测快照；为空则直接进入下一轮
//! 3. 取置信度最高的检测，计算它相对参考原点的偏移
//! 4. 接近 → 下降 → 夹紧（无限重试）→ 抬起 → 投放位 → 张开（无限重试）
//!
//! 循环本身没有终止条件，只响应取消令牌；
//! 夹爪之外的任何失败都向上返回并结束循环。

use crate::error::ControlError;
use crate::offset::{PickOffset, ReferenceOrigin};
use crate::poses::PickPoses;
use cobot_client::{CobotController, MoveMode};
use cobot_driver::RobotEndpoint;
use cobot_tools::{CancelToken, PickPlaceSettings};
use pick_vision::DetectionSlot;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 循环参数
#[derive(Debug, Clone, PartialEq)]
pub struct CycleConfig {
    /// 机械臂运动速度（1..=100）
    pub speed: u32,
    /// 夹爪速度
    pub grip_speed: u32,
    pub mode: MoveMode,
    /// 每次运动后的等待
    pub move_delay: Duration,
    /// 启动时夹爪标定后的等待
    pub startup_settle: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self::from_settings(&PickPlaceSettings::default())
    }
}

impl CycleConfig {
    pub fn from_settings(settings: &PickPlaceSettings) -> Self {
        Self {
            speed: settings.robot.default_speed,
            grip_speed: settings.gripper.speed,
            mode: MoveMode::Linear,
            move_delay: settings.robot.move_delay(),
            startup_settle: Duration::from_secs(1),
        }
    }
}

/// 单轮结果
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// 快照为空
    NoDetection,
    /// 最佳检测没有机器人坐标（映射失败）
    Unmapped { class_name: String },
    /// 完成一次抓取投放
    Picked {
        class_name: String,
        location: (f64, f64),
        offset: PickOffset,
    },
}

/// 循环统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles: u64,
    pub picks: u64,
    pub empty: u64,
}

/// 抓取-投放循环
pub struct PickCycle<'a, E: RobotEndpoint> {
    controller: &'a CobotController<E>,
    slot: &'a DetectionSlot,
    poses: PickPoses,
    origin: ReferenceOrigin,
    config: CycleConfig,
    cancel: CancelToken,
}

impl<'a, E: RobotEndpoint> PickCycle<'a, E> {
    pub fn new(
        controller: &'a CobotController<E>,
        slot: &'a DetectionSlot,
        poses: PickPoses,
        origin: ReferenceOrigin,
        config: CycleConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            controller,
            slot,
            poses,
            origin,
            config,
            cancel,
        }
    }

    pub fn from_settings(
        controller: &'a CobotController<E>,
        slot: &'a DetectionSlot,
        settings: &PickPlaceSettings,
        cancel: CancelToken,
    ) -> Self {
        Self::new(
            controller,
            slot,
            PickPoses::from_settings(&settings.poses),
            ReferenceOrigin::from(&settings.reference),
            CycleConfig::from_settings(settings),
            cancel,
        )
    }

    pub fn poses(&self) -> &PickPoses {
        &self.poses
    }

    /// 连接、上电、锁定舵机、标定夹爪
    ///
    /// 控制器无应答（`Degraded`）时照常上电，上电通常就能唤醒它。
    pub fn prepare(&self) -> Result<(), ControlError> {
        if self.controller.connect()?.is_degraded() {
            warn!("Robot controller not responding, powering on anyway");
        }
        self.controller.power_on()?;
        self.controller.torque_on()?;
        self.controller.gripper_init()?;
        self.pause(self.config.startup_settle)?;
        info!("Robot ready");
        Ok(())
    }

    /// 执行一轮
    pub fn run_once(&self) -> Result<CycleOutcome, ControlError> {
        self.move_to(&self.poses.vantage, "vantage")?;
        self.pause(self.config.move_delay * 2)?;

        let snapshot = self.slot.latest();
        let Some(best) = snapshot.best() else {
            debug!(sequence = snapshot.sequence, "No detections");
            return Ok(CycleOutcome::NoDetection);
        };
        let Some(location) = best.robot_location else {
            warn!(class = %best.class_name, "Best detection has no robot location, skipping");
            return Ok(CycleOutcome::Unmapped {
                class_name: best.class_name.clone(),
            });
        };

        let offset = self.origin.offset_to(location);
        let targets = self.poses.targets(&offset);
        info!(
            class = %best.class_name,
            confidence = best.confidence,
            x = location.0,
            y = location.1,
            "Picking object, offset {}",
            offset
        );

        self.move_to(&targets.approach, "approach")?;
        self.pause(self.config.move_delay)?;
        self.move_to(&targets.pick, "pick")?;
        self.pause(self.config.move_delay)?;
        self.controller
            .gripper_close_retry(self.config.grip_speed, &self.cancel)?;

        self.move_to(&targets.approach, "depart")?;
        self.pause(self.config.move_delay)?;
        self.move_to(&targets.throw, "throw")?;
        self.pause(self.config.move_delay)?;
        self.controller
            .gripper_open_retry(self.config.grip_speed, &self.cancel)?;

        Ok(CycleOutcome::Picked {
            class_name: best.class_name.clone(),
            location,
            offset,
        })
    }

    /// 一直运行到令牌取消
    ///
    /// 取消时返回统计；其它错误直接返回。
    pub fn run_loop(&self) -> Result<LoopStats, ControlError> {
        let mut stats = LoopStats::default();
        while !self.cancel.is_cancelled() {
            match self.run_once() {
                Ok(outcome) => {
                    stats.cycles += 1;
                    match outcome {
                        CycleOutcome::Picked { .. } => stats.picks += 1,
                        CycleOutcome::NoDetection | CycleOutcome::Unmapped { .. } => {
                            stats.empty += 1
                        },
                    }
                },
                Err(e) if e.is_cancelled() => break,
                Err(e) => return Err(e),
            }
        }
        info!(cycles = stats.cycles, picks = stats.picks, "Pick loop stopped");
        Ok(stats)
    }

    fn move_to(&self, pose: &[f64; 6], label: &str) -> Result<(), ControlError> {
        if self.cancel.is_cancelled() {
            return Err(ControlError::Cancelled);
        }
        debug!(target_pose = label, ?pose, "move");
        self.controller
            .move_world(pose, self.config.mode, self.config.speed)?;
        Ok(())
    }

    fn pause(&self, duration: Duration) -> Result<(), ControlError> {
        if self.cancel.sleep(duration) {
            Ok(())
        } else {
            Err(ControlError::Cancelled)
        }
    }
}
