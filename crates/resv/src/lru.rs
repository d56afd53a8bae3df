//! 公平队列（LRU）簿记
//!
//! 每个设备持有一个 [`LruManager`]，缓冲对象在成功预留或释放后被移到队尾，
//! 队首即最久未使用、最先被驱逐的对象。
//!
//! 队列只由自身的自旋锁保护，临界区只覆盖位置更新，不会跨越任何阻塞等待。

use alloc::{collections::BTreeMap, vec::Vec};

use hashbrown::HashMap;
use sync::SpinLock;

use crate::bo::BoId;

#[derive(Debug, Default)]
struct LruList {
    next_tick: u64,
    /// tick -> 对象，按 tick 升序即队首到队尾
    order: BTreeMap<u64, BoId>,
    /// 对象 -> 当前 tick
    pos: HashMap<BoId, u64>,
}

impl LruList {
    fn push_tail(&mut self, id: BoId) {
        if let Some(old) = self.pos.remove(&id) {
            self.order.remove(&old);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(tick, id);
        self.pos.insert(id, tick);
    }
}

/// 设备级公平队列
#[derive(Debug, Default)]
pub struct LruManager {
    list: SpinLock<LruList>,
}

impl LruManager {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 把对象加入队尾（已在队列中则等同于移到队尾）
    pub fn add(&self, id: BoId) {
        self.list.lock().push_tail(id);
    }

    /// 从队列中移除对象
    pub fn remove(&self, id: BoId) -> bool {
        let mut list = self.list.lock();
        match list.pos.remove(&id) {
            Some(tick) => {
                list.order.remove(&tick);
                true
            }
            None => false,
        }
    }

    /// 把已在队列中的对象移到队尾
    pub fn move_to_tail(&self, id: BoId) {
        let mut list = self.list.lock();
        if list.pos.contains_key(&id) {
            list.push_tail(id);
        } else {
            log::warn!("lru: bo {:?} is not on the list", id);
        }
    }

    /// 队首到队尾的快照
    pub fn order(&self) -> Vec<BoId> {
        self.list.lock().order.values().copied().collect()
    }

    /// 队列中的对象数
    pub fn len(&self) -> usize {
        self.list.lock().pos.len()
    }

    /// 队列是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
