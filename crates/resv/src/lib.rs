//! 共享缓冲区的预留对象
//!
//! 为多对象加锁提供被加锁的一侧：
//!
//! - [`ReservationObject`] - ww-mutex 加上完成栅栏（一个独占槽、若干共享槽）
//! - [`Fence`] - 完成标记，表示一项工作已记录
//! - [`LruManager`] - 每个设备一个的公平队列，最近使用的对象移到队尾
//! - [`BufferObject`] - 把以上三者绑定在一起的缓冲对象
//!
//! 所有预留对象共享同一个票号类别 [`RESERVATION_WW_CLASS`]。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;

mod bo;
mod error;
mod fence;
mod lru;
mod reservation;

pub use bo::{BoId, BufferObject};
pub use error::ResvError;
pub use fence::{Fence, FenceUsage, fence_context_alloc};
pub use lru::LruManager;
pub use reservation::ReservationObject;

use sync::WwClass;

/// 预留对象的全局票号类别
pub static RESERVATION_WW_CLASS: WwClass = WwClass::new("reservation_ww_class");
