//! 预留对象错误类型

/// 预留对象错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResvError {
    /// 共享槽容量不足或分配失败 (-ENOMEM)
    NoMemory,
}

impl ResvError {
    /// 转换为错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            ResvError::NoMemory => -12,
        }
    }
}
