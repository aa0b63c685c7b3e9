//! 抓取 / 放置动作编排与位姿记录
//!
//! `pick_at` / `place_at` 的固定六段：
//! 安全高度 → 接近高度 → 抓取高度 → 夹爪 → 接近高度 → 安全高度。
//! z 高度和末端姿态来自 [`MotionParams`](crate::MotionParams)。

use crate::controller::CobotController;
use crate::error::ClientError;
use cobot_driver::RobotEndpoint;
use cobot_tools::{PoseRecord, append_pose};
use std::path::Path;
use tracing::{info, warn};

impl<E: RobotEndpoint> CobotController<E> {
    /// 设置末端姿态（度）
    pub fn set_tool_rpy(&mut self, rx: f64, ry: f64, rz: f64) {
        self.motion.tool_rpy = [rx, ry, rz];
    }

    /// 设置抓取高度参数，`None` 保持原值
    pub fn set_pick_params(
        &mut self,
        approach_z: Option<f64>,
        pick_z: Option<f64>,
        safe_z: Option<f64>,
    ) {
        if let Some(z) = approach_z {
            self.motion.approach_z = z;
        }
        if let Some(z) = pick_z {
            self.motion.pick_z = z;
        }
        if let Some(z) = safe_z {
            self.motion.safe_z = z;
        }
    }

    /// 保持当前 x、y 和姿态，只把 z 升到 `safe_z`
    ///
    /// 读不到当前坐标时返回 [`ClientError::ReadFailed`]。
    pub fn go_safe_z(&self, speed: u32) -> Result<(), ClientError> {
        let current = self.get_coords()?.ok_or(ClientError::ReadFailed("coords"))?;
        let pose = [
            current[0],
            current[1],
            self.motion.safe_z,
            current[3],
            current[4],
            current[5],
        ];
        self.move_world(&pose, self.motion.move_mode, speed)
    }

    /// 同 [`go_safe_z`](Self::go_safe_z)，但读坐标失败时回零位避让
    pub fn go_safe(&self, speed: u32) -> Result<(), ClientError> {
        match self.go_safe_z(speed) {
            Err(ClientError::ReadFailed(_)) => {
                warn!("Current coords unavailable, going home instead");
                self.home(speed)
            },
            other => other,
        }
    }

    /// 在 (x, y) 处抓取，返回夹爪是否检测到闭合
    pub fn pick_at(&self, x: f64, y: f64, speed: u32, grip_speed: u32) -> Result<bool, ClientError> {
        info!(x, y, "pick_at");
        self.descend_and_actuate(x, y, speed, |c| c.gripper_close(grip_speed))
    }

    /// 在 (x, y) 处放置，返回夹爪是否检测到张开
    pub fn place_at(&self, x: f64, y: f64, speed: u32, grip_speed: u32) -> Result<bool, ClientError> {
        info!(x, y, "place_at");
        self.descend_and_actuate(x, y, speed, |c| c.gripper_open(grip_speed))
    }

    fn descend_and_actuate(
        &self,
        x: f64,
        y: f64,
        speed: u32,
        actuate: impl FnOnce(&Self) -> Result<bool, ClientError>,
    ) -> Result<bool, ClientError> {
        self.ensure_connected()?;
        let mode = self.motion.move_mode;

        self.go_safe(speed)?;
        self.move_world(&self.tool_pose(x, y, self.motion.approach_z), mode, speed)?;
        self.move_world(&self.tool_pose(x, y, self.motion.pick_z), mode, speed)?;

        let moved = actuate(self)?;

        self.move_world(&self.tool_pose(x, y, self.motion.approach_z), mode, speed)?;
        self.go_safe(speed)?;
        Ok(moved)
    }

    /// 以当前末端姿态组成位姿
    pub fn tool_pose(&self, x: f64, y: f64, z: f64) -> [f64; 6] {
        let [rx, ry, rz] = self.motion.tool_rpy;
        [x, y, z, rx, ry, rz]
    }

    /// 读取关节角和坐标，追加一行到位姿日志
    ///
    /// 读失败的字段记为 `null`。
    pub fn save_pose<P: AsRef<Path>>(&self, path: P) -> Result<PoseRecord, ClientError> {
        let angles = self.get_angles()?;
        let coords = self.get_coords()?;
        let record = PoseRecord::now(angles, coords);
        append_pose(path.as_ref(), &record).map_err(|e| ClientError::PoseLog(format!("{:#}", e)))?;
        info!(path = %path.as_ref().display(), "Pose saved");
        Ok(record)
    }
}
