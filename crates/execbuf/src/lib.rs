//! 命令提交前的多对象预留
//!
//! 一次提交通常要同时访问多个缓冲对象。调用者以任意顺序给出对象列表，
//! 本 crate 负责无死锁地把它们全部锁住，必要时预留共享栅栏槽，
//! 并在工作提交后附加完成栅栏、统一释放。
//!
//! # 流程
//!
//! 1. [`reserve_buffers`]：按列表加锁。与更老的票号争用时释放已持有的全部锁，
//!    等待争用对象空闲后从该对象重新开始。
//! 2. 调用者完成校验与提交。
//! 3. [`fence_buffer_objects`]：附加栅栏、移到 LRU 队尾、解锁；
//!    或者 [`backoff_reservation`]：放弃本次提交，直接解锁。
//!
//! # 死锁避免
//!
//! 票号越小越老。持有其它锁的较新者遇到较老者必须退让，较老者只会等待。
//! 等待关系总是由老指向新，因此不存在循环等待，调用者无需约定全局加锁顺序。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod entry;
mod error;
mod release;
mod reserve;
mod ticket;

#[cfg(test)]
mod tests;

pub use entry::{Resource, ValidateEntry};
pub use error::ReserveError;
pub use release::{backoff_reservation, fence_buffer_objects};
pub use reserve::reserve_buffers;
pub use ticket::Ticket;
