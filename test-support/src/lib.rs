//! 测试支持 crate
//!
//! 提供 Mock 实现和测试工具

pub mod mock;

use std::time::{Duration, Instant};

/// 自旋等待直到条件成立
///
/// # Panics
/// 超过 `timeout` 仍未成立时 panic，避免测试挂死。
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < timeout, "wait_until: condition not met in {timeout:?}");
        std::thread::yield_now();
    }
}
