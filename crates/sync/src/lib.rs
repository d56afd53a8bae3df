//! 同步原语
//!
//! 向预留（reservation）子系统提供基本的锁和同步原语，
//! 包括自旋锁与带票号的 wound-wait 互斥锁（ww-mutex）。
//!
//! # 组件
//!
//! - [`RawSpinLock`] / [`SpinLock`] - 基于 `lock_api` 的自旋锁，用于短临界区
//! - [`WwClass`] / [`WwAcquireCtx`] - 票号分配与获取上下文
//! - [`WwMutex`] - 按票号裁决争用的互斥锁
//!
//! # 调度解耦
//!
//! 阻塞等待通过 [`SchedOps`] trait 抽象（让出 CPU、查询挂起信号）。
//! 使用方应在启动时调用 [`register_sched_ops`] 注册实现；
//! 未注册时退化为忙等且不会被打断。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod raw_spin_lock;
mod sched;
mod spin_lock;
mod ww_acquire;
mod ww_mutex;

pub use raw_spin_lock::RawSpinLock;
pub use sched::{SchedOps, register_sched_ops};
pub use spin_lock::{SpinLock, SpinLockGuard};
pub use ww_acquire::{WwAcquireCtx, WwClass};
pub use ww_mutex::{WwError, WwMutex};

pub(crate) use sched::{relax, signal_pending};
