//! 夹爪故障恢复集成测试
//!
//! 使用 MockEndpoint 脚本化编码器行为，覆盖有界重发、
//! 无限重试的标定循环和取消。

use cobot_client::{ClientError, CobotController, GripperConfig, MotionParams};
use cobot_driver::{GripperBehavior, MockEndpoint};
use cobot_tools::CancelToken;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn fast_gripper() -> GripperConfig {
    GripperConfig {
        motion_timeout: Duration::from_millis(15),
        poll_interval: Duration::from_millis(2),
        resend_pause: Duration::from_millis(1),
        settle: Duration::from_millis(1),
        ..GripperConfig::default()
    }
}

fn controller_with(behavior: GripperBehavior) -> (Arc<CobotController<MockEndpoint>>, MockEndpoint) {
    let mock = MockEndpoint::new();
    mock.set_gripper(behavior);
    let controller = CobotController::with_config(mock.clone(), fast_gripper(), MotionParams::default());
    controller.connect().unwrap();
    (Arc::new(controller), mock)
}

#[test]
fn test_close_succeeds_on_third_send() {
    let (controller, mock) = controller_with(GripperBehavior::MovesOnAttempt(3));

    assert!(controller.gripper_close(100).unwrap());
    assert_eq!(mock.gripper_commands(), 3);
    assert_eq!(mock.calibrations(), 0);
}

#[test]
fn test_open_succeeds_on_third_send() {
    let (controller, mock) = controller_with(GripperBehavior::MovesOnAttempt(3));
    mock.state().lock().encoder = 1248;

    assert!(controller.gripper_open(100).unwrap());
    assert_eq!(mock.gripper_commands(), 3);
}

#[test]
fn test_close_retry_recalibrates_until_motion() {
    // 第 1-3 次闭合被吞；标定推动为第 4 次；第 5 次闭合生效
    let (controller, mock) = controller_with(GripperBehavior::MovesOnAttempt(5));

    controller
        .gripper_close_retry(100, &CancelToken::new())
        .unwrap();
    assert_eq!(mock.calibrations(), 2);
    assert_eq!(mock.gripper_commands(), 5);
}

#[test]
fn test_open_retry_loops_while_stuck_until_cancelled() {
    let (controller, mock) = controller_with(GripperBehavior::Stuck);
    let cancel = CancelToken::new();

    let handle = {
        let controller = controller.clone();
        let cancel = cancel.clone();
        thread::spawn(move || controller.gripper_open_retry(100, &cancel))
    };

    // 每个失败轮次标定两次，等到至少三轮
    let deadline = Instant::now() + Duration::from_secs(10);
    while mock.calibrations() < 6 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(mock.calibrations() >= 6);
    assert!(!handle.is_finished());

    cancel.cancel();
    let result = handle.join().unwrap();
    assert!(matches!(result, Err(ClientError::Cancelled)));

    // 每轮：3 次张开 + 1 次标定推动 + 3 次预闭合
    let rounds = mock.calibrations() / 2;
    assert!(mock.gripper_commands() >= rounds * 7);
}

#[test]
fn test_close_retry_stuck_until_cancelled() {
    let (controller, mock) = controller_with(GripperBehavior::Stuck);
    let cancel = CancelToken::new();

    let handle = {
        let controller = controller.clone();
        let cancel = cancel.clone();
        thread::spawn(move || controller.gripper_close_retry(100, &cancel))
    };

    let deadline = Instant::now() + Duration::from_secs(10);
    while mock.calibrations() < 4 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(mock.calibrations() >= 4);
    assert!(!handle.is_finished());
    cancel.cancel();
    assert!(matches!(handle.join().unwrap(), Err(ClientError::Cancelled)));

    // 每轮：3 次闭合 + 1 次标定推动，标定两次
    let rounds = mock.calibrations() / 2;
    assert!(rounds >= 2);
    assert!(mock.gripper_commands() >= rounds * 4);
}

#[test]
fn test_concurrent_gripper_calls_are_serialized() {
    let (controller, mock) = controller_with(GripperBehavior::Follows);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let controller = controller.clone();
            thread::spawn(move || {
                if i % 2 == 0 {
                    controller.gripper_close(100)
                } else {
                    controller.gripper_init().map(|_| true)
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    // 标定序列不会被其它夹爪命令打断：两次标定之间只有一次推动
    let calls = mock.calls();
    let mut inside_init = false;
    let mut between = 0;
    for call in &calls {
        match call {
            cobot_driver::EndpointCall::SetGripperCalibration => {
                if inside_init {
                    assert_eq!(between, 1);
                }
                inside_init = !inside_init;
                between = 0;
            },
            cobot_driver::EndpointCall::SetEncoder { .. } if inside_init => between += 1,
            _ => {},
        }
    }
    assert!(!inside_init);
}
