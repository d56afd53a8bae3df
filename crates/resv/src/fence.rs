//! 完成栅栏
//!
//! 栅栏是附着在预留对象上的不透明完成标记。同一个执行上下文（context）
//! 发出的栅栏按 seqno 递增，新栅栏可以替换同上下文的旧栅栏。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_FENCE_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// 分配 `num` 个连续的栅栏上下文编号，返回第一个。
pub fn fence_context_alloc(num: u64) -> u64 {
    NEXT_FENCE_CONTEXT.fetch_add(num, Ordering::Relaxed)
}

/// 栅栏附着到预留对象时使用的槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceUsage {
    /// 独占槽（写）
    Exclusive,
    /// 共享槽（读）
    Shared,
}

/// 完成栅栏
#[derive(Debug)]
pub struct Fence {
    context: u64,
    seqno: u64,
    signaled: AtomicBool,
}

impl Fence {
    /// 创建一个未触发的栅栏
    pub fn new(context: u64, seqno: u64) -> Arc<Self> {
        Arc::new(Fence {
            context,
            seqno,
            signaled: AtomicBool::new(false),
        })
    }

    /// 所属执行上下文
    pub fn context(&self) -> u64 {
        self.context
    }

    /// 上下文内的序号
    pub fn seqno(&self) -> u64 {
        self.seqno
    }

    /// 触发栅栏，返回此前是否已触发
    pub fn signal(&self) -> bool {
        self.signaled.swap(true, Ordering::AcqRel)
    }

    /// 是否已触发
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}
