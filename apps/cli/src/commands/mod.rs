//! 命令定义和实现

pub mod check;
pub mod config;
pub mod gripper;
pub mod homography;
pub mod r#move;
pub mod position;
pub mod power;
pub mod run;
pub mod save_pose;
pub mod stop;

pub use check::CheckCommand;
pub use config::ConfigCommand;
pub use gripper::GripperCommand;
pub use homography::HomographyCommand;
pub use r#move::{HomeCommand, MoveCommand};
pub use position::PositionCommand;
pub use power::{PowerCommand, TorqueCommand};
pub use run::RunCommand;
pub use save_pose::SavePoseCommand;
pub use stop::StopCommand;
