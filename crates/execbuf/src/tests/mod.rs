// Unit tests for execbuf.
//
// A `MockResource` stands in for a buffer object: it keeps a real ww-mutex but records
// every lock/unlock/queue move in a shared journal, and caps its shared slots.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use resv::{FenceUsage, ResvError};
use sync::{WwAcquireCtx, WwClass, WwError, WwMutex};

use crate::{Resource, Ticket, ValidateEntry};


static CLASS: WwClass = WwClass::new("execbuf_test");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Lock(usize),
    Unlock(usize),
    Tail(usize),
}

#[derive(Default)]
struct Journal {
    events: Mutex<Vec<Event>>,
    queue: Mutex<Vec<usize>>,
}

impl Journal {
    fn push(&self, ev: Event) {
        self.events.lock().unwrap().push(ev);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn queue(&self) -> Vec<usize> {
        self.queue.lock().unwrap().clone()
    }
}

struct MockResource {
    id: usize,
    lock: WwMutex,
    cap: usize,
    shared_reserved: AtomicUsize,
    excl: Mutex<Option<u32>>,
    shared: Mutex<Vec<u32>>,
    journal: Arc<Journal>,
}

impl MockResource {
    fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    fn held_by(&self, ticket: &Ticket<'_>) -> bool {
        ticket.stamp().is_some() && self.lock.owner_stamp() == ticket.stamp()
    }

    fn shared_reserved(&self) -> usize {
        self.shared_reserved.load(Ordering::SeqCst)
    }

    fn excl(&self) -> Option<u32> {
        *self.excl.lock().unwrap()
    }

    fn shared(&self) -> Vec<u32> {
        self.shared.lock().unwrap().clone()
    }
}

impl Resource for MockResource {
    type Fence = u32;

    fn reserve(
        &self,
        intr: bool,
        no_wait: bool,
        ticket: Option<&WwAcquireCtx<'_>>,
    ) -> Result<(), WwError> {
        if no_wait {
            if ticket.is_some() || !self.lock.try_lock() {
                return Err(WwError::Busy);
            }
        } else {
            self.lock.lock(ticket, intr)?;
        }
        self.journal.push(Event::Lock(self.id));
        Ok(())
    }

    fn reserve_slowpath(&self, intr: bool, ticket: &WwAcquireCtx<'_>) -> Result<(), WwError> {
        self.lock.lock_slow(ticket, intr)?;
        self.journal.push(Event::Lock(self.id));
        Ok(())
    }

    fn unlock(&self) {
        self.lock.unlock();
        self.journal.push(Event::Unlock(self.id));
    }

    fn reserve_shared(&self, num: usize) -> Result<(), ResvError> {
        if self.shared_reserved() + num > self.cap {
            return Err(ResvError::NoMemory);
        }
        self.shared_reserved.fetch_add(num, Ordering::SeqCst);
        Ok(())
    }

    fn add_fence(&self, fence: &u32, usage: FenceUsage) {
        match usage {
            FenceUsage::Shared => self.shared.lock().unwrap().push(*fence),
            FenceUsage::Exclusive => *self.excl.lock().unwrap() = Some(*fence),
        }
    }

    fn move_to_lru_tail(&self) {
        let mut queue = self.journal.queue.lock().unwrap();
        queue.retain(|&id| id != self.id);
        queue.push(self.id);
        self.journal.push(Event::Tail(self.id));
    }
}

/// Creates `caps.len()` resources on one journal; resource `i` has shared capacity `caps[i]`.
fn resources(caps: &[usize]) -> (Arc<Journal>, Vec<Arc<MockResource>>) {
    let journal = Arc::new(Journal::default());
    let res = caps
        .iter()
        .enumerate()
        .map(|(id, &cap)| {
            journal.queue.lock().unwrap().push(id);
            Arc::new(MockResource {
                id,
                lock: WwMutex::new(),
                cap,
                shared_reserved: AtomicUsize::new(0),
                excl: Mutex::new(None),
                shared: Mutex::new(Vec::new()),
                journal: journal.clone(),
            })
        })
        .collect();
    (journal, res)
}

fn entry(res: &Arc<MockResource>, num_shared: usize) -> ValidateEntry<MockResource> {
    ValidateEntry::new(res.clone(), num_shared)
}

fn ids(entries: &[ValidateEntry<MockResource>]) -> Vec<usize> {
    entries.iter().map(|e| e.bo.id).collect()
}
