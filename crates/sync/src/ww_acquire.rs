//! 票号分配与获取上下文
//!
//! 每一轮多对象加锁都持有一个 [`WwAcquireCtx`]，其票号（stamp）由所属
//! [`WwClass`] 单调递增地分配。两个上下文争用同一把 [`WwMutex`](crate::WwMutex)
//! 时，票号较小（较老）的一方胜出，较新的一方退让。
//!
//! 上下文在 `Drop` 时自动结束，因此任何退出路径都不会遗漏收尾。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// 票号类别，同一类别下的上下文之间可以比较先后。
#[derive(Debug)]
pub struct WwClass {
    name: &'static str,
    next_stamp: AtomicU64,
}

impl WwClass {
    /// 创建一个新的票号类别。票号从 1 开始。
    pub const fn new(name: &'static str) -> Self {
        WwClass {
            name,
            next_stamp: AtomicU64::new(1),
        }
    }

    /// 类别名称（仅用于日志）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 开始一轮获取，分配一个比此前所有票号都大的新票号。
    ///
    /// # Panics
    /// 64 位票号耗尽时 panic（实际运行中不可达）。
    pub fn begin(&self) -> WwAcquireCtx<'_> {
        let stamp = self.next_stamp.fetch_add(1, Ordering::Relaxed);
        assert!(stamp != u64::MAX, "sync: ww stamp space exhausted");
        log::trace!("{}: begin acquire ctx stamp={}", self.name, stamp);
        WwAcquireCtx {
            class: self,
            inner: Arc::new(CtxInner {
                stamp,
                acquired: AtomicUsize::new(0),
                done: AtomicBool::new(false),
            }),
        }
    }
}

/// 上下文的共享部分，锁的持有者记录中保存它的引用。
#[derive(Debug)]
pub(crate) struct CtxInner {
    pub(crate) stamp: u64,
    /// 当前通过该上下文持有的锁数量
    pub(crate) acquired: AtomicUsize,
    done: AtomicBool,
}

impl CtxInner {
    pub(crate) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::Acquire)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }
}

/// 一轮多对象加锁的获取上下文（票号）。
///
/// 离开作用域即结束该上下文。
#[derive(Debug)]
pub struct WwAcquireCtx<'a> {
    class: &'a WwClass,
    inner: Arc<CtxInner>,
}

impl WwAcquireCtx<'_> {
    /// 该上下文的票号
    pub fn stamp(&self) -> u64 {
        self.inner.stamp
    }

    /// 当前持有的锁数量
    pub fn acquired(&self) -> usize {
        self.inner.acquired()
    }

    /// 标记获取阶段结束，之后不应再通过该上下文加锁。
    pub fn done(&self) {
        self.inner.done.store(true, Ordering::Relaxed);
    }

    /// 是否已标记获取阶段结束
    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    /// 显式结束该上下文，等价于 drop。
    pub fn finish(self) {}

    pub(crate) fn inner(&self) -> &Arc<CtxInner> {
        &self.inner
    }
}

impl Drop for WwAcquireCtx<'_> {
    fn drop(&mut self) {
        let held = self.inner.acquired();
        if held != 0 {
            log::warn!(
                "{}: acquire ctx stamp={} finished while holding {} lock(s)",
                self.class.name,
                self.inner.stamp,
                held
            );
        }
        log::trace!("{}: fini acquire ctx stamp={}", self.class.name, self.inner.stamp);
    }
}
