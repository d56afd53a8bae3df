//! 调度相关操作的注册
//!
//! ww-mutex 的慢路径需要让出 CPU 并检查挂起信号，这两项能力由使用方
//! 通过 [`SchedOps`] 提供。

use alloc::boxed::Box;
use once_cell::race::OnceBox;

/// 调度相关操作的 trait
///
/// 由使用方实现并注册，提供等待期间的让出与信号查询。
pub trait SchedOps: Send + Sync {
    /// 在等待锁的循环中让出 CPU
    fn relax(&self);

    /// 当前执行流是否有挂起的取消信号
    fn signal_pending(&self) -> bool;
}

static SCHED_OPS: OnceBox<&'static dyn SchedOps> = OnceBox::new();

/// 注册调度操作实现
///
/// 只有第一次注册生效；重复注册返回 `false`。
pub fn register_sched_ops(ops: &'static dyn SchedOps) -> bool {
    SCHED_OPS.set(Box::new(ops)).is_ok()
}

#[inline]
pub(crate) fn relax() {
    match SCHED_OPS.get() {
        Some(ops) => ops.relax(),
        None => core::hint::spin_loop(),
    }
}

#[inline]
pub(crate) fn signal_pending() -> bool {
    SCHED_OPS.get().is_some_and(|ops| ops.signal_pending())
}
