//! 预留列表项与被预留对象的抽象

use alloc::sync::Arc;

use resv::{BufferObject, Fence, FenceUsage, ResvError};
use sync::{WwAcquireCtx, WwError};

/// 可被预留的对象
///
/// 每个操作只涉及对象自身，相对其它对象的操作是原子的。
pub trait Resource {
    /// 完成标记类型
    type Fence: ?Sized;

    /// 加锁。`no_wait` 时只尝试一次；否则按 ww-mutex 规则处理争用。
    fn reserve(
        &self,
        intr: bool,
        no_wait: bool,
        ticket: Option<&WwAcquireCtx<'_>>,
    ) -> Result<(), WwError>;

    /// 退让后的慢路径加锁，只等待，不会返回 [`WwError::Deadlock`]
    fn reserve_slowpath(&self, intr: bool, ticket: &WwAcquireCtx<'_>) -> Result<(), WwError>;

    /// 解锁，不改变公平队列位置
    fn unlock(&self);

    /// 预留 `num` 个共享标记槽
    fn reserve_shared(&self, num: usize) -> Result<(), ResvError>;

    /// 附加完成标记
    fn add_fence(&self, fence: &Self::Fence, usage: FenceUsage);

    /// 移到公平队列队尾
    fn move_to_lru_tail(&self);
}

impl Resource for BufferObject {
    type Fence = Arc<Fence>;

    fn reserve(
        &self,
        intr: bool,
        no_wait: bool,
        ticket: Option<&WwAcquireCtx<'_>>,
    ) -> Result<(), WwError> {
        BufferObject::reserve(self, intr, no_wait, ticket)
    }

    fn reserve_slowpath(&self, intr: bool, ticket: &WwAcquireCtx<'_>) -> Result<(), WwError> {
        BufferObject::reserve_slowpath(self, intr, ticket)
    }

    fn unlock(&self) {
        self.resv().unlock();
    }

    fn reserve_shared(&self, num: usize) -> Result<(), ResvError> {
        self.resv().reserve_shared(num)
    }

    fn add_fence(&self, fence: &Arc<Fence>, usage: FenceUsage) {
        match usage {
            FenceUsage::Shared => self.resv().add_shared_fence(fence),
            FenceUsage::Exclusive => self.resv().add_excl_fence(fence),
        }
    }

    fn move_to_lru_tail(&self) {
        BufferObject::move_to_lru_tail(self);
    }
}

/// 预留列表中的一项
#[derive(Debug)]
pub struct ValidateEntry<R: ?Sized> {
    /// 要预留的对象
    pub bo: Arc<R>,
    /// 需要额外预留的共享槽数量；为 0 时提交独占栅栏
    pub num_shared: usize,
}

impl<R: ?Sized> ValidateEntry<R> {
    /// 创建列表项
    pub fn new(bo: Arc<R>, num_shared: usize) -> Self {
        ValidateEntry { bo, num_shared }
    }

    /// 提交时栅栏应附加到的槽位
    pub fn fence_usage(&self) -> FenceUsage {
        if self.num_shared > 0 {
            FenceUsage::Shared
        } else {
            FenceUsage::Exclusive
        }
    }
}

impl<R: ?Sized> Clone for ValidateEntry<R> {
    fn clone(&self) -> Self {
        ValidateEntry {
            bo: self.bo.clone(),
            num_shared: self.num_shared,
        }
    }
}
