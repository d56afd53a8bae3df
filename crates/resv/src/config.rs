//! 预留对象配置常量

/// 每个预留对象默认允许的共享栅栏槽上限
pub const DEFAULT_SHARED_FENCE_LIMIT: usize = 64;

/// 首次扩容时至少预留的共享槽数量
pub const SHARED_FENCE_MIN_CAPACITY: usize = 4;
