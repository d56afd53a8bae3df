//! 调度相关操作的 Mock 实现
//!
//! 注意：这里不直接依赖 `sync` crate（避免循环依赖）。
//! 各 crate 在测试中用一个本地类型包装 [`MOCK_SCHED_OPS`] 并实现 `SchedOps`。

use std::sync::Mutex;
use std::thread::{self, ThreadId};

use hashbrown::HashSet;

/// Mock 调度操作
///
/// `relax` 让出当前线程；取消信号按线程记录，可由任意线程投递。
pub struct MockSchedOps {
    pending: Mutex<HashSet<ThreadId>>,
}

impl MockSchedOps {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn relax(&self) {
        thread::yield_now();
    }

    /// 当前线程是否有挂起信号
    pub fn signal_pending(&self) -> bool {
        self.pending.lock().unwrap().contains(&thread::current().id())
    }

    /// 向指定线程投递取消信号
    pub fn send_signal(&self, tid: ThreadId) {
        self.pending.lock().unwrap().insert(tid);
    }

    /// 清除当前线程的挂起信号
    pub fn clear_signal(&self) {
        self.pending.lock().unwrap().remove(&thread::current().id());
    }
}

impl Default for MockSchedOps {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    /// 全局 Mock 实例
    pub static ref MOCK_SCHED_OPS: MockSchedOps = MockSchedOps::new();
}
