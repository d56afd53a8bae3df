//! 释放预留：放弃或附加栅栏后提交

use crate::{Resource, Ticket, ValidateEntry};

/// 放弃一次成功的预留：每个对象移到公平队列队尾并解锁，然后结束票号。
pub fn backoff_reservation<R: Resource + ?Sized>(
    ticket: Option<&mut Ticket<'_>>,
    entries: &[ValidateEntry<R>],
) {
    if entries.is_empty() {
        return;
    }

    for entry in entries {
        entry.bo.move_to_lru_tail();
        entry.bo.unlock();
    }

    if let Some(ticket) = ticket {
        ticket.finish();
    }
}

/// 为一次提交附加完成栅栏并释放全部对象，然后结束票号。
///
/// 请求了共享槽（`num_shared > 0`）的项附加为共享栅栏，其余附加为独占栅栏。
/// 调用前所有对象都必须已由 [`reserve_buffers`](crate::reserve_buffers) 锁住。
pub fn fence_buffer_objects<R: Resource + ?Sized>(
    ticket: Option<&mut Ticket<'_>>,
    entries: &[ValidateEntry<R>],
    fence: &R::Fence,
) {
    if entries.is_empty() {
        return;
    }

    for entry in entries {
        let bo = &*entry.bo;
        bo.add_fence(fence, entry.fence_usage());
        bo.move_to_lru_tail();
        bo.unlock();
    }

    if let Some(ticket) = ticket {
        ticket.finish();
    }
}
