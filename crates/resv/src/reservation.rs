//! 预留对象
//!
//! 预留对象 = 一把 [`WwMutex`] + 一组完成栅栏：
//!
//! - 独占槽：最多一个栅栏，表示最后一次独占（写）访问。
//! - 共享槽：若干栅栏，表示并发的共享（读）访问。添加共享栅栏前必须先用
//!   [`ReservationObject::reserve_shared`] 预留空位，这样真正提交时不会再失败。
//!
//! 修改栅栏前必须持有对象的 ww-mutex。

use alloc::{sync::Arc, vec::Vec};
use core::cmp;

use sync::{SpinLock, WwAcquireCtx, WwError, WwMutex};

use crate::config::{DEFAULT_SHARED_FENCE_LIMIT, SHARED_FENCE_MIN_CAPACITY};
use crate::{Fence, ResvError};

#[derive(Debug, Default)]
struct FenceSlots {
    excl: Option<Arc<Fence>>,
    shared: Vec<Arc<Fence>>,
    /// 已预留的共享槽总数（含已占用的）
    shared_max: usize,
}

/// 预留对象
#[derive(Debug)]
pub struct ReservationObject {
    lock: WwMutex,
    fences: SpinLock<FenceSlots>,
    shared_limit: usize,
}

impl Default for ReservationObject {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationObject {
    /// 使用默认共享槽上限创建
    pub fn new() -> Self {
        Self::with_shared_limit(DEFAULT_SHARED_FENCE_LIMIT)
    }

    /// 指定共享槽上限创建
    pub fn with_shared_limit(shared_limit: usize) -> Self {
        ReservationObject {
            lock: WwMutex::new(),
            fences: SpinLock::new(FenceSlots::default()),
            shared_limit,
        }
    }

    /// 底层 ww-mutex
    pub fn ww_mutex(&self) -> &WwMutex {
        &self.lock
    }

    /// 加锁，见 [`WwMutex::lock`]
    pub fn lock(&self, ctx: Option<&WwAcquireCtx<'_>>, intr: bool) -> Result<(), WwError> {
        self.lock.lock(ctx, intr)
    }

    /// 退让后的慢路径加锁，见 [`WwMutex::lock_slow`]
    pub fn lock_slow(&self, ctx: &WwAcquireCtx<'_>, intr: bool) -> Result<(), WwError> {
        self.lock.lock_slow(ctx, intr)
    }

    /// 非阻塞加锁
    pub fn trylock(&self) -> bool {
        self.lock.try_lock()
    }

    /// 解锁
    pub fn unlock(&self) {
        self.lock.unlock();
    }

    /// 是否已加锁
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// 确保至少还有 `num` 个空闲的共享槽。
    ///
    /// 需要扩容时先清理已触发的共享栅栏；扩容后仍超过上限则返回
    /// [`ResvError::NoMemory`]，已有的预留保持不变。
    pub fn reserve_shared(&self, num: usize) -> Result<(), ResvError> {
        debug_assert!(self.is_locked(), "reserve_shared without holding the lock");
        let mut f = self.fences.lock();
        if f.shared.len().checked_add(num).is_some_and(|n| n <= f.shared_max) {
            return Ok(());
        }

        f.shared.retain(|fence| !fence.is_signaled());
        let Some(needed) = f.shared.len().checked_add(num) else {
            log::debug!("resv: shared slot request {} overflows", num);
            return Err(ResvError::NoMemory);
        };
        if needed <= f.shared_max {
            return Ok(());
        }
        if needed > self.shared_limit {
            log::debug!(
                "resv: shared slots exhausted (need {}, limit {})",
                needed,
                self.shared_limit
            );
            return Err(ResvError::NoMemory);
        }

        let new_max = cmp::min(
            cmp::max(needed, cmp::max(f.shared_max * 2, SHARED_FENCE_MIN_CAPACITY)),
            self.shared_limit,
        );
        let additional = new_max - f.shared.len();
        f.shared
            .try_reserve(additional)
            .map_err(|_| ResvError::NoMemory)?;
        f.shared_max = new_max;
        Ok(())
    }

    /// 添加共享栅栏。
    ///
    /// 同一上下文的旧栅栏或已触发的栅栏被原地替换，否则占用一个预留槽。
    pub fn add_shared_fence(&self, fence: &Arc<Fence>) {
        debug_assert!(self.is_locked(), "add_shared_fence without holding the lock");
        let mut f = self.fences.lock();
        if let Some(slot) = f
            .shared
            .iter_mut()
            .find(|old| old.context() == fence.context() || old.is_signaled())
        {
            *slot = fence.clone();
            return;
        }
        if f.shared.len() >= f.shared_max {
            log::warn!("resv: shared fence added without a reserved slot");
            debug_assert!(false, "shared fence added without a reserved slot");
            f.shared_max = f.shared.len() + 1;
        }
        f.shared.push(fence.clone());
    }

    /// 设置独占栅栏，同时丢弃全部共享栅栏
    pub fn add_excl_fence(&self, fence: &Arc<Fence>) {
        debug_assert!(self.is_locked(), "add_excl_fence without holding the lock");
        let mut f = self.fences.lock();
        f.excl = Some(fence.clone());
        f.shared.clear();
    }

    /// 当前独占栅栏
    pub fn excl_fence(&self) -> Option<Arc<Fence>> {
        self.fences.lock().excl.clone()
    }

    /// 当前共享栅栏的快照
    pub fn shared_fences(&self) -> Vec<Arc<Fence>> {
        self.fences.lock().shared.clone()
    }

    /// 已占用的共享槽数
    pub fn shared_count(&self) -> usize {
        self.fences.lock().shared.len()
    }

    /// 已预留的共享槽总数
    pub fn shared_max(&self) -> usize {
        self.fences.lock().shared_max
    }

    /// 尚未占用的预留共享槽数
    pub fn shared_free(&self) -> usize {
        let f = self.fences.lock();
        f.shared_max - f.shared.len()
    }

    /// 所有栅栏（独占与共享）是否都已触发
    pub fn test_signaled(&self) -> bool {
        let f = self.fences.lock();
        f.excl.as_ref().is_none_or(|e| e.is_signaled()) && f.shared.iter().all(|s| s.is_signaled())
    }
}
