//! 预留错误类型
//!
//! 普通的票号争用由内部退让重试吸收，不会出现在这里。只有票号仍持有
//! 之前调用留下的锁时，争用才以 [`ReserveError::Deadlock`] 交还给调用者。

use resv::ResvError;
use sync::WwError;

/// 预留一组缓冲对象时的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveError {
    /// 等待期间被取消信号打断，调用者可重试 (-ERESTARTSYS)
    Interrupted,
    /// 共享槽预留失败 (-ENOMEM)
    NoMemory,
    /// 列表中出现重复对象但未提供重复项收集列表 (-EALREADY)
    DuplicateEntry,
    /// 不带票号时对象已被占用 (-EBUSY)
    Busy,
    /// 票号仍持有之前预留的对象，输给了更老的票号 (-EDEADLK)。
    /// 调用者须释放全部预留后用新票号重试。
    Deadlock,
}

impl ReserveError {
    /// 转换为错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            ReserveError::NoMemory => -12,
            ReserveError::Busy => -16,
            ReserveError::Deadlock => -35,
            ReserveError::DuplicateEntry => -114,
            ReserveError::Interrupted => -512,
        }
    }
}

impl From<WwError> for ReserveError {
    fn from(err: WwError) -> Self {
        match err {
            WwError::Interrupted => ReserveError::Interrupted,
            WwError::AlreadyHeld => ReserveError::DuplicateEntry,
            WwError::Busy => ReserveError::Busy,
            WwError::Deadlock => ReserveError::Deadlock,
        }
    }
}

impl From<ResvError> for ReserveError {
    fn from(err: ResvError) -> Self {
        match err {
            ResvError::NoMemory => ReserveError::NoMemory,
        }
    }
}
