//! 缓冲对象
//!
//! 把一个预留对象挂到设备的公平队列上。对象创建时进入队尾，销毁时出队。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

use sync::{WwAcquireCtx, WwError};

use crate::{LruManager, ReservationObject};

/// 缓冲对象编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoId(pub u64);

static NEXT_BO_ID: AtomicU64 = AtomicU64::new(1);

impl BoId {
    fn allocate() -> Self {
        BoId(NEXT_BO_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 缓冲对象
#[derive(Debug)]
pub struct BufferObject {
    id: BoId,
    resv: ReservationObject,
    lru: Arc<LruManager>,
}

impl BufferObject {
    /// 创建缓冲对象并放到 `lru` 队尾
    pub fn new(lru: &Arc<LruManager>) -> Arc<Self> {
        Self::with_resv(lru, ReservationObject::new())
    }

    /// 使用给定的预留对象创建（例如限制共享槽上限）
    pub fn with_resv(lru: &Arc<LruManager>, resv: ReservationObject) -> Arc<Self> {
        let id = BoId::allocate();
        lru.add(id);
        Arc::new(BufferObject {
            id,
            resv,
            lru: lru.clone(),
        })
    }

    /// 对象编号
    pub fn id(&self) -> BoId {
        self.id
    }

    /// 预留对象
    pub fn resv(&self) -> &ReservationObject {
        &self.resv
    }

    /// 所在公平队列
    pub fn lru(&self) -> &Arc<LruManager> {
        &self.lru
    }

    /// 预留（加锁）缓冲对象。
    ///
    /// - `no_wait`：只尝试一次，被占用返回 [`WwError::Busy`]；不能与票号同时使用。
    /// - 否则按 ww-mutex 规则加锁，`ticket` 为 `None` 时是普通阻塞加锁。
    pub fn reserve(
        &self,
        intr: bool,
        no_wait: bool,
        ticket: Option<&WwAcquireCtx<'_>>,
    ) -> Result<(), WwError> {
        if no_wait {
            if ticket.is_some() {
                return Err(WwError::Busy);
            }
            return if self.resv.trylock() {
                Ok(())
            } else {
                Err(WwError::Busy)
            };
        }
        self.resv.lock(ticket, intr)
    }

    /// 退让后的慢路径预留
    pub fn reserve_slowpath(&self, intr: bool, ticket: &WwAcquireCtx<'_>) -> Result<(), WwError> {
        self.resv.lock_slow(ticket, intr)
    }

    /// 移到公平队列队尾
    pub fn move_to_lru_tail(&self) {
        self.lru.move_to_tail(self.id);
    }
}

impl Drop for BufferObject {
    fn drop(&mut self) {
        if self.resv.is_locked() {
            log::warn!("bo {:?} destroyed while reserved", self.id);
        }
        self.lru.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RESERVATION_WW_CLASS;

    #[test]
    fn test_lifecycle_on_lru() {
        let lru = Arc::new(LruManager::new());
        let a = BufferObject::new(&lru);
        let b = BufferObject::new(&lru);
        assert_eq!(lru.order(), vec![a.id(), b.id()]);
        drop(a);
        assert_eq!(lru.order(), vec![b.id()]);
    }

    #[test]
    fn test_no_wait_reserve() {
        let lru = Arc::new(LruManager::new());
        let bo = BufferObject::new(&lru);
        bo.reserve(false, true, None).unwrap();
        assert_eq!(bo.reserve(false, true, None), Err(WwError::Busy));
        let ctx = RESERVATION_WW_CLASS.begin();
        assert_eq!(bo.reserve(false, true, Some(&ctx)), Err(WwError::Busy));
        bo.resv().unlock();
    }

    #[test]
    fn test_move_to_lru_tail_while_reserved() {
        let lru = Arc::new(LruManager::new());
        let a = BufferObject::new(&lru);
        let b = BufferObject::new(&lru);
        let ctx = RESERVATION_WW_CLASS.begin();
        a.reserve(false, false, Some(&ctx)).unwrap();
        a.move_to_lru_tail();
        assert_eq!(lru.order(), vec![b.id(), a.id()]);
        assert!(a.resv().ww_mutex().is_held_by(&ctx));
        a.resv().unlock();
        assert!(!a.resv().is_locked());
    }
}
