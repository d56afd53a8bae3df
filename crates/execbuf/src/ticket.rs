//! 调用者持有的票号槽
//!
//! [`Ticket`] 在第一次预留时惰性开始一个 [`WwAcquireCtx`]，并在退让、提交
//! 或预留失败时结束它。槽本身被 drop 时上下文也随之结束。

use sync::{WwAcquireCtx, WwClass};

/// 票号槽
#[derive(Debug)]
pub struct Ticket<'c> {
    class: &'c WwClass,
    ctx: Option<WwAcquireCtx<'c>>,
}

impl<'c> Ticket<'c> {
    /// 创建一个尚未开始的票号槽
    pub fn new(class: &'c WwClass) -> Self {
        Ticket { class, ctx: None }
    }

    /// 开始获取上下文；已开始时直接返回现有上下文。
    pub fn begin(&mut self) -> &WwAcquireCtx<'c> {
        let class = self.class;
        self.ctx.get_or_insert_with(|| class.begin())
    }

    /// 当前上下文
    pub fn ctx(&self) -> Option<&WwAcquireCtx<'c>> {
        self.ctx.as_ref()
    }

    /// 当前票号
    pub fn stamp(&self) -> Option<u64> {
        self.ctx.as_ref().map(WwAcquireCtx::stamp)
    }

    /// 是否已开始且尚未结束
    pub fn is_active(&self) -> bool {
        self.ctx.is_some()
    }

    /// 结束上下文；未开始或已结束时什么也不做。
    pub fn finish(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.finish();
        }
    }

    /// 标记获取阶段结束后再结束上下文，用于预留失败的路径
    pub(crate) fn abort(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.done();
            ctx.finish();
        }
    }
}
