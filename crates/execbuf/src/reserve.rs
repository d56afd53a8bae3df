//! 按列表预留缓冲对象
//!
//! 如果某个对象被另一次校验占用，票号较大（较新）的一方释放已持有的全部锁，
//! 等待该对象空闲。这样即使多次校验以不同顺序加锁也不会死锁。

use alloc::{collections::VecDeque, vec::Vec};

use sync::{WwAcquireCtx, WwError};

use crate::{ReserveError, Resource, Ticket, ValidateEntry};

/// 预留 `entries` 中的全部对象。
///
/// - 提供 `ticket` 时按 ww-mutex 规则加锁，争用由内部退让重试吸收；
///   未提供时每个对象只尝试一次，被占用即返回 [`ReserveError::Busy`]。
/// - 对象已被同一票号持有时，若提供了 `dups`，该项从 `entries` 移到 `dups`，
///   否则返回 [`ReserveError::DuplicateEntry`]。
/// - `intr` 为 true 时等待可被取消信号打断，返回 [`ReserveError::Interrupted`]。
/// - 同一票号可以跨多次调用使用。此时若输给更老的票号，返回
///   [`ReserveError::Deadlock`]：调用者须释放之前的全部预留后重试。
///
/// 成功时每一项都已加锁并预留了所需的共享槽，之后必须调用
/// [`fence_buffer_objects`](crate::fence_buffer_objects) 或
/// [`backoff_reservation`](crate::backoff_reservation) 恰好一次。
/// 失败时本次加的锁已全部释放，票号已结束。
///
/// `entries` 中其余项的顺序保持不变。
pub fn reserve_buffers<R: Resource + ?Sized>(
    mut ticket: Option<&mut Ticket<'_>>,
    entries: &mut Vec<ValidateEntry<R>>,
    intr: bool,
    dups: Option<&mut Vec<ValidateEntry<R>>>,
) -> Result<(), ReserveError> {
    if entries.is_empty() {
        return Ok(());
    }

    let ctx = ticket.as_deref_mut().map(|t| t.begin());
    let mut dup_idx = Vec::new();
    let ret = reserve_walk(ctx, entries, intr, dups.is_some(), &mut dup_idx);

    if let Some(sink) = dups {
        dup_idx.sort_unstable();
        for (removed, idx) in dup_idx.into_iter().enumerate() {
            sink.push(entries.remove(idx - removed));
        }
    }

    if let Err(err) = ret {
        log::debug!("execbuf: reserve failed: {:?}", err);
        if let Some(ticket) = ticket {
            ticket.abort();
        }
        return Err(err);
    }
    Ok(())
}

/// 在内部工作顺序上完成加锁。`order[..pos]` 始终是当前持有的锁。
fn reserve_walk<R: Resource + ?Sized>(
    ctx: Option<&WwAcquireCtx<'_>>,
    entries: &[ValidateEntry<R>],
    intr: bool,
    collect_dups: bool,
    dup_idx: &mut Vec<usize>,
) -> Result<(), ReserveError> {
    let mut order: VecDeque<usize> = (0..entries.len()).collect();
    let mut pos = 0;

    while pos < order.len() {
        let idx = order[pos];
        let entry = &entries[idx];
        let bo = &*entry.bo;

        match bo.reserve(intr, ctx.is_none(), ctx) {
            Ok(()) => {
                if let Err(err) = reserve_shared(entry) {
                    bo.unlock();
                    backoff_reverse(entries, &order, pos);
                    return Err(err);
                }
                pos += 1;
                continue;
            }
            Err(WwError::AlreadyHeld) if collect_dups => {
                order.remove(pos);
                dup_idx.push(idx);
                continue;
            }
            Err(WwError::Deadlock) => {}
            Err(err) => {
                backoff_reverse(entries, &order, pos);
                return Err(err.into());
            }
        }

        // 输给了更老的票号：放掉全部锁，只等这一个对象，然后重新开始
        log::debug!(
            "execbuf: contention on entry {}, dropping {} reservation(s)",
            idx,
            pos
        );
        backoff_reverse(entries, &order, pos);

        let Some(ctx) = ctx else {
            return Err(ReserveError::Busy);
        };
        // 之前的调用留下的锁这里放不掉，带着它们在慢路径上等待会与更老者互等
        if ctx.acquired() != 0 {
            log::debug!(
                "execbuf: stamp={} still holds {} earlier reservation(s), backing off",
                ctx.stamp(),
                ctx.acquired()
            );
            return Err(ReserveError::Deadlock);
        }
        bo.reserve_slowpath(intr, ctx)?;
        if let Err(err) = reserve_shared(entry) {
            bo.unlock();
            return Err(err);
        }

        order.remove(pos);
        order.push_front(idx);
        pos = 1;
    }

    Ok(())
}

fn reserve_shared<R: Resource + ?Sized>(entry: &ValidateEntry<R>) -> Result<(), ReserveError> {
    if entry.num_shared == 0 {
        return Ok(());
    }
    entry.bo.reserve_shared(entry.num_shared)?;
    Ok(())
}

/// 逆序解锁 `order[..pos]`，不移动公平队列位置
fn backoff_reverse<R: Resource + ?Sized>(
    entries: &[ValidateEntry<R>],
    order: &VecDeque<usize>,
    pos: usize,
) {
    for &idx in order.range(..pos).rev() {
        entries[idx].bo.unlock();
    }
}
