//! Wound-wait 互斥锁
//!
//! 采用 wait-die 策略裁决带票号的争用：
//!
//! - 锁空闲：直接获取；若有更老的等待者排队，则让更老者优先。
//! - 锁被同一上下文持有：返回 [`WwError::AlreadyHeld`]。
//! - 锁被更老的上下文持有（或有更老的等待者），且本上下文已经持有其它锁：
//!   返回 [`WwError::Deadlock`]，调用者须释放全部锁后用 [`WwMutex::lock_slow`] 重试。
//! - 其余情况：登记为等待者并自旋等待。
//!
//! 只有持有其它锁的较新上下文才需要退让，因此等待图中每条边都由老指向新，
//! 不可能成环。未持有任何锁的上下文可以安全地无条件等待。

use alloc::{collections::BTreeSet, sync::Arc};
use core::{mem, sync::atomic::Ordering};

use crate::{
    SpinLock,
    ww_acquire::{CtxInner, WwAcquireCtx},
};

/// ww-mutex 加锁错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WwError {
    /// 锁已被同一上下文持有 (-EALREADY)
    AlreadyHeld,
    /// 须退让给更老的上下文 (-EDEADLK)
    Deadlock,
    /// 非阻塞加锁失败 (-EBUSY)
    Busy,
    /// 等待期间收到取消信号 (-EINTR)
    Interrupted,
}

impl WwError {
    /// 转换为错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            WwError::Busy => -16,
            WwError::Interrupted => -4,
            WwError::Deadlock => -35,
            WwError::AlreadyHeld => -114,
        }
    }
}

#[derive(Debug)]
enum Owner {
    Unlocked,
    /// 不带上下文的持有者
    Plain,
    Ctx(Arc<CtxInner>),
}

#[derive(Debug)]
struct WwState {
    owner: Owner,
    /// 正在等待的上下文票号，最小者优先
    waiters: BTreeSet<u64>,
}

enum Step {
    Acquired,
    Wait,
    Fail(WwError),
}

/// 带票号裁决的互斥锁
#[derive(Debug)]
pub struct WwMutex {
    state: SpinLock<WwState>,
}

impl Default for WwMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl WwMutex {
    /// 创建一个未加锁的 WwMutex
    pub const fn new() -> Self {
        WwMutex {
            state: SpinLock::new(WwState {
                owner: Owner::Unlocked,
                waiters: BTreeSet::new(),
            }),
        }
    }

    /// 不带上下文的非阻塞加锁
    pub fn try_lock(&self) -> bool {
        let mut st = self.state.lock();
        if matches!(st.owner, Owner::Unlocked) {
            st.owner = Owner::Plain;
            true
        } else {
            false
        }
    }

    /// 加锁。
    ///
    /// `ctx` 为 `None` 时是普通的阻塞加锁；`intr` 为 true 时等待可被取消信号打断。
    pub fn lock(&self, ctx: Option<&WwAcquireCtx<'_>>, intr: bool) -> Result<(), WwError> {
        self.lock_common(ctx, intr, false)
    }

    /// 退让后的慢路径加锁。
    ///
    /// 只会等待，不会再被要求退让。调用者应先释放同一上下文下的其它锁，
    /// 否则等待期间可能与更老的上下文互相等待。
    pub fn lock_slow(&self, ctx: &WwAcquireCtx<'_>, intr: bool) -> Result<(), WwError> {
        if ctx.acquired() != 0 {
            log::warn!(
                "ww: stamp={} enters slow path holding {} lock(s)",
                ctx.stamp(),
                ctx.acquired()
            );
        }
        self.lock_common(Some(ctx), intr, true)
    }

    fn lock_common(
        &self,
        ctx: Option<&WwAcquireCtx<'_>>,
        intr: bool,
        slow: bool,
    ) -> Result<(), WwError> {
        if let Some(ctx) = ctx {
            debug_assert!(!ctx.is_done(), "locking with a finished acquire ctx");
        }
        loop {
            match self.step(ctx, slow) {
                Step::Acquired => return Ok(()),
                Step::Fail(err) => return Err(err),
                Step::Wait => {}
            }
            if intr && crate::signal_pending() {
                if let Some(ctx) = ctx {
                    self.state.lock().waiters.remove(&ctx.stamp());
                }
                return Err(WwError::Interrupted);
            }
            crate::relax();
        }
    }

    fn step(&self, ctx: Option<&WwAcquireCtx<'_>>, slow: bool) -> Step {
        let mut guard = self.state.lock();
        let st = &mut *guard;

        let Some(ctx) = ctx else {
            if matches!(st.owner, Owner::Unlocked) {
                st.owner = Owner::Plain;
                return Step::Acquired;
            }
            return Step::Wait;
        };

        let stamp = ctx.stamp();
        let holder = match &st.owner {
            Owner::Ctx(h) if h.stamp == stamp => {
                st.waiters.remove(&stamp);
                return Step::Fail(WwError::AlreadyHeld);
            }
            Owner::Ctx(h) => Some(h.stamp),
            _ => None,
        };

        let older_waiter = st.waiters.first().is_some_and(|&w| w < stamp);
        let older_holder = holder.is_some_and(|h| h < stamp);
        if !slow && ctx.acquired() > 0 && (older_holder || older_waiter) {
            st.waiters.remove(&stamp);
            log::trace!("ww: stamp={} dies (holder={:?})", stamp, holder);
            return Step::Fail(WwError::Deadlock);
        }

        if matches!(st.owner, Owner::Unlocked) && !older_waiter {
            st.waiters.remove(&stamp);
            st.owner = Owner::Ctx(ctx.inner().clone());
            ctx.inner().acquired.fetch_add(1, Ordering::AcqRel);
            return Step::Acquired;
        }

        st.waiters.insert(stamp);
        Step::Wait
    }

    /// 解锁
    pub fn unlock(&self) {
        let mut st = self.state.lock();
        match mem::replace(&mut st.owner, Owner::Unlocked) {
            Owner::Ctx(holder) => {
                holder.acquired.fetch_sub(1, Ordering::AcqRel);
            }
            Owner::Plain => {}
            Owner::Unlocked => {
                log::error!("ww: unlock of an unlocked mutex");
                debug_assert!(false, "unlock of an unlocked ww mutex");
            }
        }
    }

    /// 是否已被持有
    pub fn is_locked(&self) -> bool {
        !matches!(self.state.lock().owner, Owner::Unlocked)
    }

    /// 持有者的票号；未加锁或不带上下文持有时返回 `None`
    pub fn owner_stamp(&self) -> Option<u64> {
        match &self.state.lock().owner {
            Owner::Ctx(h) => Some(h.stamp),
            _ => None,
        }
    }

    /// 是否被给定上下文持有
    pub fn is_held_by(&self, ctx: &WwAcquireCtx<'_>) -> bool {
        self.owner_stamp() == Some(ctx.stamp())
    }

    /// 正在等待的上下文数量
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SchedOps, WwClass, register_sched_ops};
    use std::sync::Arc as StdArc;
    use std::thread;
    use test_support::mock::sched::MOCK_SCHED_OPS;

    struct TestSched;

    impl SchedOps for TestSched {
        fn relax(&self) {
            MOCK_SCHED_OPS.relax();
        }

        fn signal_pending(&self) -> bool {
            MOCK_SCHED_OPS.signal_pending()
        }
    }

    static TEST_SCHED: TestSched = TestSched;

    fn init() {
        register_sched_ops(&TEST_SCHED);
    }

    fn wait_for_waiters(m: &WwMutex, n: usize) {
        while m.waiter_count() < n {
            thread::yield_now();
        }
    }

    static CLASS: WwClass = WwClass::new("ww_test");

    #[test]
    fn test_lock_unlock_tracks_acquired() {
        init();
        let m = WwMutex::new();
        let ctx = CLASS.begin();
        m.lock(Some(&ctx), false).unwrap();
        assert!(m.is_held_by(&ctx));
        assert_eq!(ctx.acquired(), 1);
        m.unlock();
        assert!(!m.is_locked());
        assert_eq!(ctx.acquired(), 0);
    }

    #[test]
    fn test_relock_same_ctx_is_already_held() {
        init();
        let m = WwMutex::new();
        let ctx = CLASS.begin();
        m.lock(Some(&ctx), false).unwrap();
        assert_eq!(m.lock(Some(&ctx), false), Err(WwError::AlreadyHeld));
        assert_eq!(ctx.acquired(), 1);
        m.unlock();
    }

    #[test]
    fn test_try_lock_plain() {
        let m = WwMutex::new();
        assert!(m.try_lock());
        assert!(!m.try_lock());
        assert_eq!(m.owner_stamp(), None);
        m.unlock();
        assert!(m.try_lock());
        m.unlock();
    }

    #[test]
    fn test_younger_holding_locks_dies() {
        init();
        let a = WwMutex::new();
        let b = WwMutex::new();
        let old = CLASS.begin();
        let young = CLASS.begin();
        a.lock(Some(&old), false).unwrap();
        b.lock(Some(&young), false).unwrap();
        assert_eq!(a.lock(Some(&young), false), Err(WwError::Deadlock));
        assert_eq!(a.waiter_count(), 0);
        b.unlock();
        a.unlock();
    }

    #[test]
    fn test_younger_without_locks_waits_then_acquires() {
        init();
        let m = StdArc::new(WwMutex::new());
        let old = CLASS.begin();
        m.lock(Some(&old), false).unwrap();

        let m2 = m.clone();
        let h = thread::spawn(move || {
            let young = CLASS.begin();
            m2.lock(Some(&young), false).unwrap();
            let stamp = m2.owner_stamp();
            m2.unlock();
            (stamp, young.stamp())
        });
        wait_for_waiters(&m, 1);
        m.unlock();
        let (owner, stamp) = h.join().unwrap();
        assert_eq!(owner, Some(stamp));
    }

    #[test]
    fn test_older_waits_for_younger_holder() {
        init();
        let m = StdArc::new(WwMutex::new());
        let other = WwMutex::new();
        let old = CLASS.begin();
        other.lock(Some(&old), false).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let m2 = m.clone();
        let h = thread::spawn(move || {
            let young = CLASS.begin();
            m2.lock(Some(&young), false).unwrap();
            tx.send(()).unwrap();
            thread::sleep(std::time::Duration::from_millis(20));
            m2.unlock();
        });
        rx.recv().unwrap();
        // 较老者持有其它锁也只会等待，不会被要求退让
        m.lock(Some(&old), false).unwrap();
        assert!(m.is_held_by(&old));
        m.unlock();
        other.unlock();
        h.join().unwrap();
    }

    #[test]
    fn test_lock_slow_never_dies() {
        init();
        let m = StdArc::new(WwMutex::new());
        let old = CLASS.begin();
        let young = CLASS.begin();
        m.lock(Some(&old), false).unwrap();

        let m2 = m.clone();
        let h = thread::spawn(move || {
            m2.lock_slow(&young, true).unwrap();
            m2.unlock();
            young.stamp()
        });
        wait_for_waiters(&m, 1);
        m.unlock();
        assert!(h.join().unwrap() > old.stamp());
    }

    #[test]
    fn test_interrupted_wait() {
        init();
        let m = StdArc::new(WwMutex::new());
        assert!(m.try_lock());

        let m2 = m.clone();
        let h = thread::spawn(move || {
            let ctx = CLASS.begin();
            let ret = m2.lock(Some(&ctx), true);
            MOCK_SCHED_OPS.clear_signal();
            (ret, ctx.acquired())
        });
        wait_for_waiters(&m, 1);
        MOCK_SCHED_OPS.send_signal(h.thread().id());
        let (ret, acquired) = h.join().unwrap();
        assert_eq!(ret, Err(WwError::Interrupted));
        assert_eq!(acquired, 0);
        assert_eq!(m.waiter_count(), 0);
        m.unlock();
    }

    #[test]
    fn test_errno() {
        assert_eq!(WwError::Deadlock.to_errno(), -35);
        assert_eq!(WwError::AlreadyHeld.to_errno(), -114);
    }
}
